use crate::config::DashboardConfig;
use crate::error::{DashboardError, FetchError};
use crate::export::{
    date_base_name, range_base_name, render, sales_by_branch_table, ExportFile, ExportFormat,
    TableView,
};
use crate::models::{Branch, InventoryRecord, Item, SaleDate, SaleRecord, StockDate};
use crate::remote::{self, RemoteApi};
use crate::service::aggregate::{sales_by_branch, sales_export_rows};
use crate::service::filter::{filter_by_date_range, DateRange};
use crate::service::inventory_view::{
    build_inventory_view, InventoryQuery, InventoryView, InventoryViewInput,
};
use crate::service::sales_view::{
    build_sales_view, filtered_sales, FetchState, SalesQuery, SalesView, SalesViewInput,
    DEFAULT_SALES_SORT, SALES_SORT_COLUMNS,
};
use crate::service::sort::TableSort;
use crate::service::state::{SnapshotStore, Ticket};
use chrono::{Local, NaiveDate};
use dashmap::DashMap;
use serde::Deserialize;
use std::sync::Arc;

/// 销售导出类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesExportKind {
    /// 商品销售表 (含合计行)
    #[default]
    Table,
    /// 商品 × 门店数量交叉表
    ByBranch,
    /// 逐行明细
    Rows,
}

impl SalesExportKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "table" => Some(SalesExportKind::Table),
            "by_branch" => Some(SalesExportKind::ByBranch),
            "rows" => Some(SalesExportKind::Rows),
            _ => None,
        }
    }

    fn category(self) -> &'static str {
        match self {
            SalesExportKind::Table => "Sales",
            SalesExportKind::ByBranch => "Sales_ByBranch",
            SalesExportKind::Rows => "Sales_Detail",
        }
    }
}

/// 一次销售取数的中间结果
struct SalesSnapshot {
    branches: Arc<Vec<Branch>>,
    sale_dates: Arc<Vec<SaleDate>>,
    range: Option<DateRange>,
    records: Arc<Vec<SaleRecord>>,
    fetch_state: FetchState,
}

struct InventorySnapshot {
    branches: Arc<Vec<Branch>>,
    stock_dates: Arc<Vec<StockDate>>,
    date: Option<String>,
    records: Arc<Vec<InventoryRecord>>,
    fetch_state: FetchState,
}

/// 看板服务: 取数 + 会话状态 + 视图构建 + 导出
pub struct DashboardService {
    api: RemoteApi,
    settings: DashboardConfig,
    sales_state: SnapshotStore<SaleRecord, DateRange>,
    inventory_state: SnapshotStore<InventoryRecord, String>,
    sort_state: DashMap<String, TableSort>,
}

impl DashboardService {
    pub fn new(api: RemoteApi, settings: DashboardConfig) -> Self {
        Self {
            api,
            settings,
            sales_state: SnapshotStore::new(),
            inventory_state: SnapshotStore::new(),
            sort_state: DashMap::new(),
        }
    }

    /// 销售看板
    pub async fn sales_view(&self, session: &str, query: &SalesQuery) -> Result<SalesView, DashboardError> {
        let snapshot = self.load_sales(session, query).await?;
        let sort = self.current_sort(session);

        Ok(build_sales_view(SalesViewInput {
            records: &snapshot.records,
            branches: &snapshot.branches,
            sale_dates: &snapshot.sale_dates,
            query,
            range: snapshot.range,
            sort: &sort,
            top_n: self.settings.product_top_n,
            fetch_state: snapshot.fetch_state,
        }))
    }

    /// 点击商品销售表列头
    pub fn click_sales_sort(&self, session: &str, column: &str) -> Result<TableSort, DashboardError> {
        if !SALES_SORT_COLUMNS.contains(&column) {
            return Err(DashboardError::BadRequest(format!("unknown sort column: {}", column)));
        }

        let mut sort = self
            .sort_state
            .entry(session.to_string())
            .or_insert_with(|| TableSort::new(DEFAULT_SALES_SORT));
        sort.click(column);
        Ok(sort.clone())
    }

    fn current_sort(&self, session: &str) -> TableSort {
        self.sort_state
            .get(session)
            .map(|s| s.clone())
            .unwrap_or_else(|| TableSort::new(DEFAULT_SALES_SORT))
    }

    /// 导出销售数据
    pub async fn export_sales(
        &self,
        session: &str,
        query: &SalesQuery,
        kind: SalesExportKind,
        format: ExportFormat,
    ) -> Result<ExportFile, DashboardError> {
        let (table, range) = match kind {
            SalesExportKind::Table => {
                let view = self.sales_view(session, query).await?;
                let range = view.date_from.zip(view.date_to);
                (view.to_table(), range)
            }
            SalesExportKind::ByBranch | SalesExportKind::Rows => {
                let snapshot = self.load_sales(session, query).await?;
                let date_filter = match snapshot.fetch_state {
                    FetchState::Stale => None,
                    _ => snapshot.range.as_ref(),
                };
                let sales = filtered_sales(&snapshot.records, &snapshot.branches, query, date_filter);
                let table = if kind == SalesExportKind::ByBranch {
                    let (branches, rows) = sales_by_branch(&sales);
                    sales_by_branch_table(&branches, &rows)
                } else {
                    TableView::from_rows("Sales Detail", &sales_export_rows(&sales))
                };
                (table, snapshot.range.map(|r| (r.from, r.to)))
            }
        };

        let base_name = range_base_name(
            &self.settings.export_prefix,
            kind.category(),
            range.map(|(from, _)| from),
            range.map(|(_, to)| to),
        );
        self.render_table(Some(&table), format, &base_name)
    }

    /// 库存看板
    pub async fn inventory_view(
        &self,
        session: &str,
        query: &InventoryQuery,
    ) -> Result<InventoryView, DashboardError> {
        self.inventory_view_at(session, query, Local::now().date_naive()).await
    }

    pub async fn inventory_view_at(
        &self,
        session: &str,
        query: &InventoryQuery,
        today: NaiveDate,
    ) -> Result<InventoryView, DashboardError> {
        let snapshot = self.load_inventory(session, query, today).await?;

        Ok(build_inventory_view(InventoryViewInput {
            records: &snapshot.records,
            branches: &snapshot.branches,
            stock_dates: &snapshot.stock_dates,
            query,
            date: snapshot.date,
            column_ids: self.settings.inventory_branch_ids.as_deref(),
            fetch_state: snapshot.fetch_state,
        }))
    }

    /// 导出库存透视表
    pub async fn export_inventory(
        &self,
        session: &str,
        query: &InventoryQuery,
        format: ExportFormat,
    ) -> Result<ExportFile, DashboardError> {
        let view = self.inventory_view(session, query).await?;
        let base_name = date_base_name(&self.settings.export_prefix, "Inventory", view.snapshot_date());
        self.render_table(Some(&view.to_table()), format, &base_name)
    }

    fn render_table(
        &self,
        table: Option<&TableView>,
        format: ExportFormat,
        base_name: &str,
    ) -> Result<ExportFile, DashboardError> {
        let table = TableView::ensure_renderable(table)?;
        let file = render(table, format, base_name)?;
        tracing::info!(
            "exported {} ({} rows, {} bytes)",
            file.file_name,
            table.rows.len(),
            file.bytes.len()
        );
        Ok(file)
    }

    /// 商品主数据
    pub async fn items(&self) -> Result<Arc<Vec<Item>>, DashboardError> {
        Ok(remote::get_items(&self.api).await?)
    }

    /// 退出登录时清理会话状态
    pub fn clear_session(&self, session: &str) {
        self.sales_state.clear(session);
        self.inventory_state.clear(session);
        self.sort_state.remove(session);
    }

    async fn load_sales(&self, session: &str, query: &SalesQuery) -> Result<SalesSnapshot, DashboardError> {
        let (branches, sale_dates) = futures::try_join!(
            remote::get_branches(&self.api),
            remote::get_sale_dates(&self.api)
        )?;

        // 没有销售日期之前不请求明细
        let Some(range) = query.resolve_range(&sale_dates) else {
            tracing::info!("no sale dates available, skipping sales fetch");
            return Ok(SalesSnapshot {
                branches,
                sale_dates,
                range: None,
                records: Arc::new(Vec::new()),
                fetch_state: FetchState::Fresh,
            });
        };

        let ticket = self.sales_state.begin(session, &query.fetch_key(&range));
        let from = range.from.format("%Y-%m-%d").to_string();
        let to = range.to.format("%Y-%m-%d").to_string();
        // 远端可能忽略日期参数, 提交前按区间裁剪
        let fetched = remote::get_sales(&self.api, &from, &to, &query.branch)
            .await
            .map(|rows| Arc::new(filter_by_date_range(&rows, &range)));
        // 回退时报告的是旧数据实际覆盖的区间
        let (records, fetch_state, range) = settle(&self.sales_state, session, &ticket, fetched, range);

        Ok(SalesSnapshot {
            branches,
            sale_dates,
            range: Some(range),
            records,
            fetch_state,
        })
    }

    async fn load_inventory(
        &self,
        session: &str,
        query: &InventoryQuery,
        today: NaiveDate,
    ) -> Result<InventorySnapshot, DashboardError> {
        let (branches, stock_dates) = futures::try_join!(
            remote::get_branches(&self.api),
            remote::get_stock_dates(&self.api)
        )?;

        let Some(date) = query.resolve_date(&stock_dates, today) else {
            tracing::info!("no stock dates available, skipping inventory fetch");
            return Ok(InventorySnapshot {
                branches,
                stock_dates,
                date: None,
                records: Arc::new(Vec::new()),
                fetch_state: FetchState::Fresh,
            });
        };

        let ticket = self.inventory_state.begin(session, &query.fetch_key(&date));
        let fetched = remote::get_inventory(&self.api, &date, &query.branch).await;
        let (records, fetch_state, date) = settle(&self.inventory_state, session, &ticket, fetched, date);

        Ok(InventorySnapshot {
            branches,
            stock_dates,
            date: Some(date),
            records,
            fetch_state,
        })
    }
}

/// 提交取数结果; 失败时回退到最近一次提交的数据及其取数范围
fn settle<T, M: Clone>(
    state: &SnapshotStore<T, M>,
    session: &str,
    ticket: &Ticket,
    fetched: Result<Arc<Vec<T>>, FetchError>,
    meta: M,
) -> (Arc<Vec<T>>, FetchState, M) {
    match fetched {
        Ok(records) => {
            if state.commit(ticket, records.clone(), meta.clone()) {
                (records, FetchState::Fresh, meta)
            } else {
                tracing::info!("discarding superseded response for {}", ticket.key());
                (records, FetchState::Superseded, meta)
            }
        }
        Err(e) => {
            tracing::warn!("Failed to load {}: {}", ticket.key(), e);
            match state.last_committed(session) {
                Some(previous) => {
                    tracing::info!("serving previous data for {}", previous.key);
                    (previous.records, FetchState::Stale, previous.meta)
                }
                None => (Arc::new(Vec::new()), FetchState::Failed, meta),
            }
        }
    }
}
