use crate::export::{Cell, TableView};
use crate::models::{Branch, BranchSummaryRow, InventoryRecord, InventorySummary, PivotRow, StockDate};
use crate::service::aggregate::{branch_summary, dedupe_latest_by_sku, inventory_summary};
use crate::service::filter::{date_part, filter_records, BranchFilter};
use crate::service::pivot::{column_branches, pivot_by_branch, BranchSelection};
use crate::service::sales_view::FetchState;
use crate::service::sort::{sort_rows, SortDirection, TableSort};
use chrono::NaiveDate;
use serde::Serialize;

pub const NO_INVENTORY_MESSAGE: &str = "No inventory data for the selected filters.";

/// 库存看板的过滤条件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventoryQuery {
    /// 库存快照日期; 不指定时取最接近今天的快照
    pub date: Option<NaiveDate>,
    pub branch: BranchFilter,
    pub search: String,
    pub summary: bool,
    pub sort: Option<String>,
    pub direction: Option<SortDirection>,
}

impl InventoryQuery {
    /// 选中的快照: 指定日期时按日期部分匹配, 找不到则直接使用该日期
    pub fn resolve_date(&self, stock_dates: &[StockDate], today: NaiveDate) -> Option<String> {
        match self.date {
            Some(date) => Some(
                stock_dates
                    .iter()
                    .find(|d| date_part(&d.date) == Some(date))
                    .map(|d| d.date.clone())
                    .unwrap_or_else(|| date.format("%Y-%m-%d").to_string()),
            ),
            None => closest_stock_date(stock_dates, today).map(|d| d.date.clone()),
        }
    }

    pub fn fetch_key(&self, date: &str) -> String {
        format!("inventory|{}|{}", date, self.branch.key())
    }
}

/// 最接近 today 的快照日期; 距离相同时取列表中靠前的一个
pub fn closest_stock_date(stock_dates: &[StockDate], today: NaiveDate) -> Option<&StockDate> {
    stock_dates
        .iter()
        .filter_map(|d| date_part(&d.date).map(|day| (d, (day - today).num_days().abs())))
        .min_by_key(|(_, distance)| *distance)
        .map(|(d, _)| d)
}

/// 门店过滤 -> 透视模式。门店名按忽略大小写对应到门店列表中的正式名称。
pub fn branch_selection(branch: &BranchFilter, branches: &[Branch]) -> BranchSelection {
    let canonical = |name: &String| {
        let wanted = name.to_lowercase();
        branches
            .iter()
            .find(|b| b.name.to_lowercase() == wanted)
            .map(|b| b.name.clone())
            .unwrap_or_else(|| name.clone())
    };

    match branch {
        BranchFilter::Names(names) if names.len() == 1 => BranchSelection::Single(canonical(&names[0])),
        BranchFilter::Names(names) if names.len() > 1 => {
            let mut selected: Vec<String> = Vec::with_capacity(names.len());
            for name in names.iter().map(canonical) {
                if !selected.contains(&name) {
                    selected.push(name);
                }
            }
            BranchSelection::Subset(selected)
        }
        _ => BranchSelection::All,
    }
}

/// 库存看板视图
#[derive(Debug, Clone, Serialize)]
pub struct InventoryView {
    pub date: Option<String>,
    pub stock_dates: Vec<String>,
    pub branch: String,
    pub columns: Vec<String>,
    pub rows: Vec<PivotRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<TableSort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<InventorySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_summary: Option<Vec<BranchSummaryRow>>,
    pub no_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
    pub fetch_state: FetchState,
    #[serde(skip)]
    selection: BranchSelection,
}

pub struct InventoryViewInput<'a> {
    pub records: &'a [InventoryRecord],
    pub branches: &'a [Branch],
    pub stock_dates: &'a [StockDate],
    pub query: &'a InventoryQuery,
    pub date: Option<String>,
    /// 透视表列的门店 id; None 为全部门店
    pub column_ids: Option<&'a [i64]>,
    pub fetch_state: FetchState,
}

pub fn build_inventory_view(input: InventoryViewInput<'_>) -> InventoryView {
    let InventoryViewInput {
        records,
        branches,
        stock_dates,
        query,
        date,
        column_ids,
        fetch_state,
    } = input;

    let selection = branch_selection(&query.branch, branches);
    // 全部门店时不按门店过滤, 合计需要统计所有门店的库存行;
    // 选了门店时远端可能忽略过滤参数, 这里再按门店裁剪一次
    let branch_filter = match selection {
        BranchSelection::All => BranchFilter::All,
        BranchSelection::Single(_) | BranchSelection::Subset(_) => query.branch.clone(),
    };
    let inventory = filter_records(records, &query.search, &branch_filter);
    let deduped = dedupe_latest_by_sku(&inventory);

    let column_set = column_branches(branches, column_ids);
    // 多门店: 列为配置列集合与选中门店的交集
    let pivot_columns: Vec<Branch> = match &selection {
        BranchSelection::Subset(_) => column_set
            .iter()
            .filter(|b| query.branch.matches(&b.name))
            .cloned()
            .collect(),
        _ => column_set.clone(),
    };
    let mut rows = pivot_by_branch(&inventory, &pivot_columns, &deduped, &selection);

    let sort = query.sort.as_ref().map(|column| TableSort {
        column: column.clone(),
        direction: query.direction.unwrap_or_default(),
    });
    if let Some(sort) = &sort {
        sort_rows(&mut rows, &sort.column, sort.direction);
    }

    let columns = match &selection {
        BranchSelection::All | BranchSelection::Subset(_) => {
            pivot_columns.iter().map(|b| b.name.clone()).collect()
        }
        BranchSelection::Single(name) => vec![name.clone()],
    };

    let no_data = rows.is_empty();
    InventoryView {
        date,
        stock_dates: stock_dates.iter().map(|d| d.date.clone()).collect(),
        branch: query.branch.key(),
        columns,
        rows,
        sort,
        summary: query.summary.then(|| inventory_summary(&inventory)),
        branch_summary: query
            .summary
            .then(|| branch_summary(&inventory, &column_set)),
        no_data,
        message: no_data.then(|| NO_INVENTORY_MESSAGE.to_string()),
        notice: fetch_state.notice(),
        fetch_state,
        selection,
    }
}

impl InventoryView {
    /// 全部/多门店: SKU, Product Name, 各门店..., Total;
    /// 单门店: SKU, Product Name, Brand, 门店
    pub fn to_table(&self) -> TableView {
        let mut headers = vec!["SKU".to_string(), "Product Name".to_string()];
        match &self.selection {
            BranchSelection::All | BranchSelection::Subset(_) => {
                headers.extend(self.columns.iter().cloned());
                headers.push("Total".to_string());
            }
            BranchSelection::Single(name) => {
                headers.push("Brand".to_string());
                headers.push(name.clone());
            }
        }

        let mut table = TableView::new("Inventory", headers);
        for row in &self.rows {
            let mut cells: Vec<Cell> = vec![row.sku.as_str().into(), row.name.as_str().into()];
            match &self.selection {
                BranchSelection::All | BranchSelection::Subset(_) => {
                    cells.extend(
                        self.columns
                            .iter()
                            .map(|b| Cell::Number(row.per_branch_qty.get(b).copied().unwrap_or(0.0))),
                    );
                    cells.push(row.total.into());
                }
                BranchSelection::Single(_) => {
                    cells.push(row.brand.as_str().into());
                    cells.push(row.total.into());
                }
            }
            table.push_row(cells);
        }
        table
    }

    /// 快照日期 (文件名用)
    pub fn snapshot_date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(date_part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inv(sku: &str, branch: &str, qty: f64) -> InventoryRecord {
        InventoryRecord {
            branch_name: branch.to_string(),
            item_sku: sku.to_string(),
            item_name: format!("Item {sku}"),
            item_brand: "Herb".to_string(),
            qty,
            last_updated: "2024-03-01 08:00:00".to_string(),
        }
    }

    fn stock(raw: &[&str]) -> Vec<StockDate> {
        raw.iter()
            .enumerate()
            .map(|(i, d)| StockDate {
                id: i as i64,
                date: d.to_string(),
            })
            .collect()
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn view(records: &[InventoryRecord], branches: &[Branch], query: &InventoryQuery) -> InventoryView {
        build_inventory_view(InventoryViewInput {
            records,
            branches,
            stock_dates: &[],
            query,
            date: Some("2024-03-01 00:00:00".to_string()),
            column_ids: None,
            fetch_state: FetchState::Fresh,
        })
    }

    #[test]
    fn closest_snapshot_to_today() {
        let dates = stock(&["2024-03-01 00:00:00", "2024-03-08 00:00:00", "2024-03-20"]);
        assert_eq!(closest_stock_date(&dates, day(6)).unwrap().id, 1);
        assert_eq!(closest_stock_date(&dates, day(30)).unwrap().id, 2);
        // 距离相同取靠前的
        assert_eq!(closest_stock_date(&dates, day(14)).unwrap().id, 1);
        assert!(closest_stock_date(&[], day(1)).is_none());
    }

    #[test]
    fn explicit_date_maps_to_snapshot_string() {
        let dates = stock(&["2024-03-01 00:00:00"]);
        let query = InventoryQuery {
            date: Some(day(1)),
            ..Default::default()
        };
        assert_eq!(
            query.resolve_date(&dates, day(9)).as_deref(),
            Some("2024-03-01 00:00:00")
        );

        let query = InventoryQuery {
            date: Some(day(2)),
            ..Default::default()
        };
        assert_eq!(query.resolve_date(&dates, day(9)).as_deref(), Some("2024-03-02"));
    }

    #[test]
    fn all_branches_pivot_scenario() {
        let branches = vec![Branch::new(1, "A", false), Branch::new(2, "B", true)];
        let records = vec![inv("X", "A", 5.0), inv("X", "B", 0.0)];
        let query = InventoryQuery {
            summary: true,
            ..Default::default()
        };
        let view = view(&records, &branches, &query);

        assert_eq!(view.columns, vec!["A", "B"]);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].per_branch_qty["A"], 5.0);
        assert_eq!(view.rows[0].per_branch_qty["B"], 0.0);
        assert_eq!(view.rows[0].total, 5.0);
        assert_eq!(view.summary.as_ref().unwrap().distinct_skus, 1);
        assert_eq!(view.branch_summary.as_ref().unwrap().len(), 2);

        let table = view.to_table();
        assert_eq!(table.headers, vec!["SKU", "Product Name", "A", "B", "Total"]);
        assert_eq!(table.rows[0][4], Cell::Number(5.0));
        assert_eq!(view.snapshot_date(), Some(day(1)));
    }

    #[test]
    fn single_branch_resolves_canonical_name() {
        let branches = vec![Branch::new(1, "Siam", false), Branch::new(2, "Lazada", true)];
        let records = vec![inv("X", "Siam", 4.0), inv("X", "Lazada", 9.0), inv("Y", "Lazada", 1.0)];
        let query = InventoryQuery {
            branch: BranchFilter::parse("siam"),
            ..Default::default()
        };
        let view = view(&records, &branches, &query);

        assert_eq!(view.columns, vec!["Siam"]);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].total, 4.0);
        assert!(view.summary.is_none());

        let table = view.to_table();
        assert_eq!(table.headers, vec!["SKU", "Product Name", "Brand", "Siam"]);
        assert_eq!(table.rows[0][2], Cell::Text("Herb".into()));
    }

    #[test]
    fn several_branches_keep_only_selected_columns_and_rows() {
        let branches = vec![
            Branch::new(1, "A", false),
            Branch::new(2, "B", false),
            Branch::new(3, "C", true),
        ];
        // 远端未按门店过滤, 返回了 C 的库存
        let records = vec![inv("X", "A", 5.0), inv("X", "B", 3.0), inv("Z", "C", 8.0)];
        let query = InventoryQuery {
            branch: BranchFilter::parse("a,B"),
            ..Default::default()
        };
        let view = view(&records, &branches, &query);

        assert_eq!(view.columns, vec!["A", "B"]);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].sku, "X");
        assert_eq!(view.rows[0].total, 8.0);
        assert!(view.rows.iter().all(|r| r.sku != "Z"));

        let table = view.to_table();
        assert_eq!(table.headers, vec!["SKU", "Product Name", "A", "B", "Total"]);
        assert_eq!(table.rows[0][4], Cell::Number(8.0));

        // 配置的列集合之外的门店不单独成列
        let ids = [1_i64, 3];
        let limited = build_inventory_view(InventoryViewInput {
            records: &records,
            branches: &branches,
            stock_dates: &[],
            query: &query,
            date: None,
            column_ids: Some(&ids),
            fetch_state: FetchState::Fresh,
        });
        assert_eq!(limited.columns, vec!["A"]);
        assert_eq!(limited.rows[0].total, 8.0);
    }

    #[test]
    fn search_sort_and_empty_state() {
        let branches = vec![Branch::new(1, "A", false)];
        let records = vec![inv("X", "A", 5.0), inv("Y", "A", 7.0)];
        let query = InventoryQuery {
            sort: Some("total".to_string()),
            ..Default::default()
        };
        let sorted = view(&records, &branches, &query);
        assert_eq!(sorted.rows[0].sku, "Y");

        let query = InventoryQuery {
            search: "zzz".to_string(),
            ..Default::default()
        };
        let empty = view(&records, &branches, &query);
        assert!(empty.no_data);
        assert_eq!(empty.message.as_deref(), Some(NO_INVENTORY_MESSAGE));
    }

    #[test]
    fn configured_columns_limit_pivot() {
        let branches = vec![Branch::new(1, "A", false), Branch::new(9, "Warehouse", false)];
        let records = vec![inv("X", "A", 5.0), inv("X", "Warehouse", 20.0)];
        let query = InventoryQuery::default();
        let ids = [1_i64];
        let view = build_inventory_view(InventoryViewInput {
            records: &records,
            branches: &branches,
            stock_dates: &[],
            query: &query,
            date: None,
            column_ids: Some(&ids),
            fetch_state: FetchState::Fresh,
        });
        assert_eq!(view.columns, vec!["A"]);
        assert_eq!(view.rows[0].total, 25.0);
    }
}
