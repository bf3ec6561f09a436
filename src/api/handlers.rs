use super::{AppState, Session};
use crate::error::DashboardError;
use crate::export::{ExportFile, ExportFormat};
use crate::models::Item;
use crate::service::filter::date_part;
use crate::service::{
    BranchFilter, Channel, InventoryQuery, InventoryView, SalesExportKind, SalesQuery, SalesView,
    SortDirection, TableSort,
};
use axum::{
    extract::{Extension, Json, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 请求体: 登录
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// 登录响应体
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
}

/// 通用响应体
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// 请求体: 点击排序列
#[derive(Debug, Deserialize)]
pub struct SortRequest {
    pub column: String,
}

/// 销售看板查询参数 (导出时额外带 kind / format)
#[derive(Debug, Default, Deserialize)]
pub struct SalesParams {
    pub datefrom: Option<String>,
    pub dateto: Option<String>,
    pub branch: Option<String>,
    pub search: Option<String>,
    pub channel: Option<String>,
    pub kind: Option<String>,
    pub format: Option<String>,
}

/// 库存看板查询参数
#[derive(Debug, Default, Deserialize)]
pub struct InventoryParams {
    pub date: Option<String>,
    pub branch: Option<String>,
    pub search: Option<String>,
    pub summary: Option<bool>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub format: Option<String>,
}

fn parse_date(raw: Option<&str>) -> Result<Option<NaiveDate>, DashboardError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => date_part(s)
            .map(Some)
            .ok_or_else(|| DashboardError::BadRequest(format!("invalid date: {}", s))),
    }
}

fn parse_format(raw: Option<&str>) -> Result<ExportFormat, DashboardError> {
    let raw = raw.unwrap_or_default();
    ExportFormat::parse(raw)
        .ok_or_else(|| DashboardError::BadRequest(format!("unknown export format: {}", raw)))
}

impl TryFrom<&SalesParams> for SalesQuery {
    type Error = DashboardError;

    fn try_from(params: &SalesParams) -> Result<Self, Self::Error> {
        let channel = params.channel.as_deref().unwrap_or_default();
        Ok(SalesQuery {
            date_from: parse_date(params.datefrom.as_deref())?,
            date_to: parse_date(params.dateto.as_deref())?,
            branch: BranchFilter::parse(params.branch.as_deref().unwrap_or_default()),
            search: params.search.clone().unwrap_or_default(),
            channel: Channel::parse(channel)
                .ok_or_else(|| DashboardError::BadRequest(format!("unknown channel: {}", channel)))?,
        })
    }
}

impl TryFrom<&InventoryParams> for InventoryQuery {
    type Error = DashboardError;

    fn try_from(params: &InventoryParams) -> Result<Self, Self::Error> {
        let direction = match params.dir.as_deref() {
            None => None,
            Some(raw) => Some(
                SortDirection::parse(raw)
                    .ok_or_else(|| DashboardError::BadRequest(format!("unknown sort direction: {}", raw)))?,
            ),
        };
        Ok(InventoryQuery {
            date: parse_date(params.date.as_deref())?,
            branch: BranchFilter::parse(params.branch.as_deref().unwrap_or_default()),
            search: params.search.clone().unwrap_or_default(),
            summary: params.summary.unwrap_or(false),
            sort: params.sort.clone().filter(|s| !s.is_empty()),
            direction,
        })
    }
}

fn attachment(file: ExportFile) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    (
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response()
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 登录, 返回访问令牌
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, DashboardError> {
    let token = state.auth.login(&req.username, &req.password)?;
    Ok(Json(LoginResponse {
        success: true,
        message: "Logged in".to_string(),
        token,
    }))
}

/// 退出登录, 清理令牌与会话状态
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<MessageResponse>, DashboardError> {
    state.auth.logout()?;
    state.dashboard.clear_session(&session.0);
    Ok(Json(MessageResponse {
        success: true,
        message: "Logged out".to_string(),
    }))
}

/// 令牌有效性检查
pub async fn session() -> Json<MessageResponse> {
    Json(MessageResponse {
        success: true,
        message: "Authenticated".to_string(),
    })
}

/// 销售看板
pub async fn sales_dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<SalesParams>,
) -> Result<Json<SalesView>, DashboardError> {
    let query = SalesQuery::try_from(&params)?;
    let view = state.dashboard.sales_view(&session.0, &query).await?;
    Ok(Json(view))
}

/// 商品销售表列头点击
pub async fn sort_sales(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<SortRequest>,
) -> Result<Json<TableSort>, DashboardError> {
    let sort = state.dashboard.click_sales_sort(&session.0, &req.column)?;
    Ok(Json(sort))
}

/// 库存看板
pub async fn inventory_dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<InventoryParams>,
) -> Result<Json<InventoryView>, DashboardError> {
    let query = InventoryQuery::try_from(&params)?;
    let view = state.dashboard.inventory_view(&session.0, &query).await?;
    Ok(Json(view))
}

/// 销售导出 (kind=table|by_branch|rows, format=xlsx|csv|tsv)
pub async fn export_sales(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<SalesParams>,
) -> Result<Response, DashboardError> {
    let query = SalesQuery::try_from(&params)?;
    let raw_kind = params.kind.as_deref().unwrap_or_default();
    let kind = SalesExportKind::parse(raw_kind)
        .ok_or_else(|| DashboardError::BadRequest(format!("unknown export kind: {}", raw_kind)))?;
    let format = parse_format(params.format.as_deref())?;

    let file = state.dashboard.export_sales(&session.0, &query, kind, format).await?;
    Ok(attachment(file))
}

/// 库存导出
pub async fn export_inventory(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Query(params): Query<InventoryParams>,
) -> Result<Response, DashboardError> {
    let query = InventoryQuery::try_from(&params)?;
    let format = parse_format(params.format.as_deref())?;

    let file = state.dashboard.export_inventory(&session.0, &query, format).await?;
    Ok(attachment(file))
}

/// 商品主数据
pub async fn items(State(state): State<AppState>) -> Result<Json<Vec<Item>>, DashboardError> {
    let items = state.dashboard.items().await?;
    Ok(Json(items.as_ref().clone()))
}
