use crate::error::LOAD_FAILED_NOTICE;
use crate::export::{Cell, TableView};
use crate::models::{
    AggregatedRow, Branch, ProductSalesRow, SaleDate, SaleRecord, SalesStats, SalesTotals,
};
use crate::service::aggregate::{branch_chart, product_chart, product_sales_table, sales_stats};
use crate::service::filter::{
    date_part, filter_by_channel, filter_by_date_range, filter_records, BranchFilter, Channel,
    DateRange,
};
use crate::service::sort::{sort_rows, TableSort};
use chrono::NaiveDate;
use serde::Serialize;

pub const NO_SALES_MESSAGE: &str = "No sales data for the selected filters.";

/// 商品销售表默认排序列
pub const DEFAULT_SALES_SORT: &str = "total_sale";

/// 商品销售表可排序的列
pub const SALES_SORT_COLUMNS: [&str; 4] = ["sku", "name", "qty_sold", "total_sale"];

/// 销售看板的过滤条件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub branch: BranchFilter,
    pub search: String,
    pub channel: Channel,
}

impl SalesQuery {
    /// 解析日期区间: 只给一端时取单日; 两端颠倒时交换;
    /// 都没给时取最近一个有销售数据的日期。没有任何销售日期时为 None。
    pub fn resolve_range(&self, sale_dates: &[SaleDate]) -> Option<DateRange> {
        match (self.date_from, self.date_to) {
            (Some(from), Some(to)) if from <= to => Some(DateRange { from, to }),
            (Some(from), Some(to)) => Some(DateRange { from: to, to: from }),
            (Some(d), None) | (None, Some(d)) => Some(DateRange::single(d)),
            (None, None) => latest_sale_date(sale_dates).map(DateRange::single),
        }
    }

    /// 取数状态标识: 日期区间 + 门店 (搜索与渠道只在本地过滤)
    pub fn fetch_key(&self, range: &DateRange) -> String {
        format!("sales|{}|{}|{}", range.from, range.to, self.branch.key())
    }
}

/// 最近的销售日期
pub fn latest_sale_date(sale_dates: &[SaleDate]) -> Option<NaiveDate> {
    sale_dates.iter().filter_map(|d| date_part(&d.date)).max()
}

/// 明细取数结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchState {
    #[default]
    Fresh,
    /// 已被更新的过滤条件取代, 结果未写入会话状态
    Superseded,
    /// 取数失败, 展示上一次成功的数据
    Stale,
    /// 取数失败且没有可用的旧数据
    Failed,
}

impl FetchState {
    pub fn notice(self) -> Option<String> {
        match self {
            FetchState::Stale | FetchState::Failed => Some(LOAD_FAILED_NOTICE.to_string()),
            FetchState::Fresh | FetchState::Superseded => None,
        }
    }
}

/// 依次应用日期兜底、搜索/门店、渠道过滤。
/// 旧数据 (range 为 None) 不再按日期过滤。
pub fn filtered_sales(
    records: &[SaleRecord],
    branches: &[Branch],
    query: &SalesQuery,
    range: Option<&DateRange>,
) -> Vec<SaleRecord> {
    let in_range = match range {
        Some(range) => filter_by_date_range(records, range),
        None => records.to_vec(),
    };
    let matched = filter_records(&in_range, &query.search, &query.branch);
    filter_by_channel(&matched, branches, query.channel)
}

/// 销售看板视图
#[derive(Debug, Clone, Serialize)]
pub struct SalesView {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub branch: String,
    pub channel: Channel,
    pub branch_options: Vec<String>,
    pub sale_dates: Vec<String>,
    pub stats: SalesStats,
    pub branch_chart: Vec<AggregatedRow>,
    pub product_chart: Vec<AggregatedRow>,
    pub table: Vec<ProductSalesRow>,
    pub totals: SalesTotals,
    pub sort: TableSort,
    pub no_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    pub fetch_state: FetchState,
}

/// 构建视图所需的全部输入
pub struct SalesViewInput<'a> {
    pub records: &'a [SaleRecord],
    pub branches: &'a [Branch],
    pub sale_dates: &'a [SaleDate],
    pub query: &'a SalesQuery,
    pub range: Option<DateRange>,
    pub sort: &'a TableSort,
    pub top_n: usize,
    pub fetch_state: FetchState,
}

/// raw records -> 过滤 -> 聚合 -> 视图
pub fn build_sales_view(input: SalesViewInput<'_>) -> SalesView {
    let SalesViewInput {
        records,
        branches,
        sale_dates,
        query,
        range,
        sort,
        top_n,
        fetch_state,
    } = input;

    // 旧数据属于之前的过滤条件, 不按新区间裁剪
    let date_filter = match fetch_state {
        FetchState::Stale => None,
        _ => range.as_ref(),
    };
    let sales = filtered_sales(records, branches, query, date_filter);

    let (mut table, totals) = product_sales_table(&sales);
    sort_rows(&mut table, &sort.column, sort.direction);

    let no_data = sales.is_empty();
    SalesView {
        date_from: range.map(|r| r.from),
        date_to: range.map(|r| r.to),
        branch: query.branch.key(),
        channel: query.channel,
        branch_options: branches
            .iter()
            .filter(|b| b.is_sale)
            .map(|b| b.name.clone())
            .collect(),
        sale_dates: sale_dates.iter().map(|d| d.date.clone()).collect(),
        stats: sales_stats(&sales, branches, &query.branch, query.channel),
        branch_chart: branch_chart(&sales),
        product_chart: product_chart(&sales, top_n),
        table,
        totals,
        sort: sort.clone(),
        no_data,
        message: no_data.then(|| NO_SALES_MESSAGE.to_string()),
        notice: fetch_state.notice(),
        fetch_state,
    }
}

impl SalesView {
    /// 商品销售表导出; 合计行在表头之后
    pub fn to_table(&self) -> TableView {
        let headers = ["SKU", "Product Name", "Qty Sold", "Total Sale"]
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut table = TableView::new("Sales", headers);
        if self.table.is_empty() {
            return table;
        }

        table.push_row(vec![
            "Total".into(),
            Cell::Text(String::new()),
            self.totals.qty_sold.into(),
            self.totals.total_sale.into(),
        ]);
        for row in &self.table {
            table.push_row(vec![
                row.sku.as_str().into(),
                row.name.as_str().into(),
                row.qty_sold.into(),
                row.total_sale.into(),
            ]);
        }
        table
    }
}
