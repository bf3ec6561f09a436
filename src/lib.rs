pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod remote;
pub mod service;

pub use api::{router, AppState};
pub use auth::AuthGate;
pub use config::AppConfig;
pub use error::{DashboardError, FetchError};
pub use remote::{create_client, RemoteApi, RequestCache};
pub use service::DashboardService;
