pub mod aggregate;
pub mod dashboard;
pub mod filter;
pub mod inventory_view;
pub mod pivot;
pub mod sales_view;
pub mod sort;
pub mod state;

pub use dashboard::{DashboardService, SalesExportKind};
pub use filter::{BranchFilter, Channel, DateRange};
pub use inventory_view::{InventoryQuery, InventoryView};
pub use sales_view::{FetchState, SalesQuery, SalesView};
pub use sort::{SortDirection, TableSort};
