use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// 页面上展示的加载失败提示
pub const LOAD_FAILED_NOTICE: &str = "Unable to load data. Please try again.";

/// 远端报表接口错误
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid response from {url}: {message}")]
    InvalidResponse { url: String, message: String },
}

pub type FetchResult<T> = Result<T, FetchError>;

/// 导出错误
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No table to export")]
    NoTable,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 登录校验错误
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Token store error: {0}")]
    Store(#[from] std::io::Error),

    /// 令牌锁在持有期间发生 panic
    #[error("Token store unavailable")]
    Poisoned,
}

/// 服务层 / 接口层错误
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            DashboardError::Fetch(e) => {
                tracing::warn!("fetch failed: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, LOAD_FAILED_NOTICE.to_string())
            }
            DashboardError::Export(ExportError::NoTable) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "Unable to export table".to_string())
            }
            DashboardError::Export(e) => {
                tracing::error!("Failed to export table: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Unable to export table".to_string())
            }
            DashboardError::Auth(AuthError::Store(e)) => {
                tracing::error!("token store failure: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            DashboardError::Auth(AuthError::Poisoned) => {
                tracing::error!("token store lock poisoned");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            DashboardError::Auth(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            DashboardError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
        };

        let body = ErrorBody {
            success: false,
            message,
        };
        (status, Json(body)).into_response()
    }
}
