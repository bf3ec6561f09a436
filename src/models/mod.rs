pub mod branch;
pub mod de;
pub mod inventory;
pub mod sales;
pub mod view;

pub use branch::{Branch, Item, SaleDate, StockDate};
pub use inventory::InventoryRecord;
pub use sales::SaleRecord;
pub use view::{
    AggregatedRow, BranchSummaryRow, InventorySummary, PivotRow, ProductSalesRow,
    SalesByBranchRow, SalesExportRow, SalesStats, SalesTotals,
};

/// 销售与库存明细的公共视图, 供过滤与聚合使用
pub trait Record {
    fn sku(&self) -> &str;
    fn name(&self) -> &str;
    fn branch_name(&self) -> &str;
}
