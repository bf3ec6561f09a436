pub mod handlers;

pub use handlers::*;

use crate::auth::AuthGate;
use crate::error::{AuthError, DashboardError};
use crate::service::DashboardService;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;

/// 共享状态: 看板服务 + 登录门禁
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<DashboardService>,
    pub auth: Arc<AuthGate>,
}

/// 已通过校验的会话 (令牌), 同时作为视图状态的键
#[derive(Debug, Clone)]
pub struct Session(pub String);

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// 受保护接口要求 Authorization: Bearer <token>
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, DashboardError> {
    let token = bearer_token(&req)
        .ok_or(AuthError::Unauthorized)?
        .to_string();
    state.auth.verify(&token)?;

    req.extensions_mut().insert(Session(token));
    Ok(next.run(req).await)
}

/// 构建路由
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/logout", post(handlers::logout))
        .route("/api/session", get(handlers::session))
        .route("/api/sales", get(handlers::sales_dashboard))
        .route("/api/sales/sort", post(handlers::sort_sales))
        .route("/api/sales/export", get(handlers::export_sales))
        .route("/api/inventory", get(handlers::inventory_dashboard))
        .route("/api/inventory/export", get(handlers::export_inventory))
        .route("/api/items", get(handlers::items))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/login", post(handlers::login))
        .merge(protected)
        .layer(ServiceBuilder::new())
        .with_state(state)
}
