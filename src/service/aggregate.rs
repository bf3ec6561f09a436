use crate::models::{
    AggregatedRow, Branch, BranchSummaryRow, InventoryRecord, InventorySummary, ProductSalesRow,
    Record, SaleRecord, SalesByBranchRow, SalesExportRow, SalesStats, SalesTotals,
};
use crate::service::filter::{online_lookup, BranchFilter, Channel};
use indexmap::{IndexMap, IndexSet};
use std::cmp::Ordering;
use std::hash::Hash;

/// 商品图表默认取前 10
pub const DEFAULT_PRODUCT_TOP_N: usize = 10;

/// 按 SKU 去重, 后出现的行覆盖先出现的行, 位置保持首次出现处
pub fn dedupe_latest_by_sku<R: Record>(records: &[R]) -> Vec<&R> {
    let mut latest: IndexMap<&str, &R> = IndexMap::with_capacity(records.len());
    for record in records {
        latest.insert(record.sku(), record);
    }
    latest.into_values().collect()
}

/// 按键分组求和, 保持键的首次出现顺序。
/// key_fn 返回 None 的行不参与任何分组。
pub fn aggregate_by_key<'a, R, K, FK, FV>(
    records: &'a [R],
    key_fn: FK,
    value_fn: FV,
) -> IndexMap<K, f64>
where
    K: Hash + Eq,
    FK: Fn(&'a R) -> Option<K>,
    FV: Fn(&'a R) -> f64,
{
    let mut groups: IndexMap<K, f64> = IndexMap::new();
    for record in records {
        let Some(key) = key_fn(record) else {
            continue;
        };
        *groups.entry(key).or_insert(0.0) += value_fn(record);
    }
    groups
}

/// 降序排名并截断; 值恰为 0 的分组先被剔除。
/// 排序稳定, 同值按首次出现顺序。n 为 None 时不截断。
pub fn top_n<I>(groups: I, n: Option<usize>) -> Vec<AggregatedRow>
where
    I: IntoIterator<Item = (String, f64)>,
{
    let mut rows: Vec<AggregatedRow> = groups
        .into_iter()
        .filter(|(_, value)| *value != 0.0)
        .map(|(name, value)| AggregatedRow { name, value })
        .collect();

    rows.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    if let Some(n) = n {
        rows.truncate(n);
    }
    rows
}

/// 线上 / 门店拆分结果
#[derive(Debug)]
pub struct Partition<'a, R> {
    pub online: Vec<&'a R>,
    pub offline: Vec<&'a R>,
}

impl<R> Partition<'_, R> {
    pub fn online_sum(&self, value: impl Fn(&R) -> f64) -> f64 {
        self.online.iter().map(|r| value(r)).sum()
    }

    pub fn offline_sum(&self, value: impl Fn(&R) -> f64) -> f64 {
        self.offline.iter().map(|r| value(r)).sum()
    }
}

/// 按门店的 isOnline 拆分; 门店不在参考列表中的行两边都不计入
pub fn partition_online_offline<'a, R: Record>(
    records: &'a [R],
    branches: &[Branch],
) -> Partition<'a, R> {
    let online_by_name = online_lookup(branches);
    let mut partition = Partition {
        online: Vec::new(),
        offline: Vec::new(),
    };

    for record in records {
        match online_by_name.get(record.branch_name()) {
            Some(true) => partition.online.push(record),
            Some(false) => partition.offline.push(record),
            None => {}
        }
    }
    partition
}

/// 门店销售额图表: 按门店汇总 net_sales, 降序, 不截断
pub fn branch_chart(sales: &[SaleRecord]) -> Vec<AggregatedRow> {
    let by_branch = aggregate_by_key(sales, |s| Some(s.branch_name.clone()), |s| s.net_sales);
    top_n(by_branch, None)
}

/// 商品销量图表: 按 SKU 汇总数量, 以商品名展示。
/// 区间内净销售额恰为 0 的商品不参与排名。
pub fn product_chart(sales: &[SaleRecord], n: usize) -> Vec<AggregatedRow> {
    let net_by_sku = aggregate_by_key(sales, |s| Some(s.item_sku.as_str()), |s| s.net_sales);
    let names = first_names(sales);

    let qty_by_sku = aggregate_by_key(
        sales,
        |s| {
            let sku = s.item_sku.as_str();
            (net_by_sku.get(sku).copied() != Some(0.0)).then_some(sku)
        },
        |s| s.qty,
    );

    let labelled = qty_by_sku.into_iter().map(|(sku, qty)| {
        let name = names.get(sku).copied().unwrap_or(sku);
        (name.to_string(), qty)
    });
    top_n(labelled, Some(n))
}

/// 每个 SKU 首次出现时的商品名
fn first_names<R: Record>(records: &[R]) -> IndexMap<&str, &str> {
    let mut names: IndexMap<&str, &str> = IndexMap::new();
    for r in records {
        names.entry(r.sku()).or_insert(r.name());
    }
    names
}

/// 商品销售表及合计行
pub fn product_sales_table(sales: &[SaleRecord]) -> (Vec<ProductSalesRow>, SalesTotals) {
    let mut rows: IndexMap<&str, ProductSalesRow> = IndexMap::new();
    let mut totals = SalesTotals::default();

    for s in sales {
        let row = rows.entry(s.item_sku.as_str()).or_insert_with(|| ProductSalesRow {
            sku: s.item_sku.clone(),
            name: s.item_name.clone(),
            qty_sold: 0.0,
            total_sale: 0.0,
        });
        row.qty_sold += s.qty;
        row.total_sale += s.net_sales;

        totals.qty_sold += s.qty;
        totals.total_sale += s.net_sales;
    }

    (rows.into_values().collect(), totals)
}

/// 销售统计卡片。
/// 门店选择为全部时展示线上/门店拆分 (按渠道隐藏另一侧), 选择具体门店时只展示合计。
pub fn sales_stats(
    sales: &[SaleRecord],
    branches: &[Branch],
    branch: &BranchFilter,
    channel: Channel,
) -> SalesStats {
    let total: f64 = sales.iter().map(|s| s.net_sales).sum();
    if !branch.is_all() {
        return SalesStats {
            total,
            in_store: None,
            online: None,
        };
    }

    let partition = partition_online_offline(sales, branches);
    SalesStats {
        total,
        in_store: (channel != Channel::Online).then(|| partition.offline_sum(|s| s.net_sales)),
        online: (channel != Channel::Offline).then(|| partition.online_sum(|s| s.net_sales)),
    }
}

/// 商品 × 门店数量交叉表; 门店列按名称排序, 商品按首次出现顺序
pub fn sales_by_branch(sales: &[SaleRecord]) -> (Vec<String>, Vec<SalesByBranchRow>) {
    let branch_set: IndexSet<&str> = sales.iter().map(|s| s.branch_name.as_str()).collect();
    let mut branch_names: Vec<String> = branch_set.into_iter().map(str::to_string).collect();
    branch_names.sort();

    let qty_by_cell = aggregate_by_key(
        sales,
        |s| Some((s.item_sku.as_str(), s.branch_name.as_str())),
        |s| s.qty,
    );
    let qty_by_sku = aggregate_by_key(sales, |s| Some(s.item_sku.as_str()), |s| s.qty);

    let rows = first_names(sales)
        .into_iter()
        .map(|(sku, name)| {
            let per_branch_qty = branch_names
                .iter()
                .map(|b| {
                    let qty = qty_by_cell.get(&(sku, b.as_str())).copied().unwrap_or(0.0);
                    (b.clone(), qty)
                })
                .collect();

            SalesByBranchRow {
                sku: sku.to_string(),
                name: name.to_string(),
                per_branch_qty,
                total_qty: qty_by_sku.get(sku).copied().unwrap_or(0.0),
            }
        })
        .collect();

    (branch_names, rows)
}

/// 逐行导出 {SKU, Product Name, Branch, Qty, Value}
pub fn sales_export_rows(sales: &[SaleRecord]) -> Vec<SalesExportRow> {
    sales
        .iter()
        .map(|s| SalesExportRow {
            sku: s.item_sku.clone(),
            product_name: s.item_name.clone(),
            branch: s.branch_name.clone(),
            qty: s.qty,
            value: s.net_sales,
        })
        .collect()
}

/// 库存概要
pub fn inventory_summary(inventory: &[InventoryRecord]) -> InventorySummary {
    let skus: IndexSet<&str> = inventory.iter().map(|r| r.item_sku.as_str()).collect();
    InventorySummary {
        distinct_skus: skus.len(),
        total_qty: inventory.iter().map(|r| r.qty).sum(),
    }
}

/// 每个门店列的库存数量合计 (无库存的门店为 0)
pub fn branch_summary(inventory: &[InventoryRecord], branches: &[Branch]) -> Vec<BranchSummaryRow> {
    let by_branch = aggregate_by_key(inventory, |r| Some(r.branch_name.as_str()), |r| r.qty);
    branches
        .iter()
        .map(|b| BranchSummaryRow {
            branch: b.name.clone(),
            total_qty: by_branch.get(b.name.as_str()).copied().unwrap_or(0.0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sale(branch: &str, sku: &str, name: &str, qty: f64, net: f64) -> SaleRecord {
        SaleRecord {
            id: None,
            branch_name: branch.to_string(),
            item_sku: sku.to_string(),
            item_name: name.to_string(),
            qty,
            net_sales: net,
            sale_date: "2024-03-01".to_string(),
        }
    }

    fn scenario() -> (Vec<Branch>, Vec<SaleRecord>) {
        let branches = vec![Branch::new(1, "A", false), Branch::new(2, "B", true)];
        let sales = vec![
            sale("A", "X", "Curcuma", 2.0, 100.0),
            sale("B", "X", "Curcuma", 3.0, 150.0),
        ];
        (branches, sales)
    }

    #[test]
    fn scenario_branch_totals_and_partition() {
        let (branches, sales) = scenario();

        let by_branch = aggregate_by_key(&sales, |s| Some(s.branch_name.clone()), |s| s.net_sales);
        assert_eq!(by_branch.len(), 2);
        assert_eq!(by_branch["A"], 100.0);
        assert_eq!(by_branch["B"], 150.0);

        let partition = partition_online_offline(&sales, &branches);
        let offline = partition.offline_sum(|s| s.net_sales);
        let online = partition.online_sum(|s| s.net_sales);
        assert_eq!(offline, 100.0);
        assert_eq!(online, 150.0);
        assert_eq!(offline + online, 250.0);
    }

    #[test]
    fn aggregation_conserves_total() {
        let sales = vec![
            sale("A", "X", "x", 1.0, 10.5),
            sale("B", "Y", "y", 2.0, 20.25),
            sale("A", "Y", "y", 3.0, -5.0),
            sale("C", "Z", "z", 0.0, 0.0),
        ];
        let groups = aggregate_by_key(&sales, |s| Some(s.item_sku.clone()), |s| s.net_sales);
        let grouped: f64 = groups.values().sum();
        let direct: f64 = sales.iter().map(|s| s.net_sales).sum();
        assert!((grouped - direct).abs() < 1e-9);
        // 零值分组保留 (由 top_n 剔除), 无记录的键不会出现
        assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["X", "Y", "Z"]);
    }

    #[test]
    fn aggregation_is_order_independent() {
        let mut sales = vec![
            sale("A", "X", "x", 1.0, 10.0),
            sale("B", "Y", "y", 2.0, 20.0),
            sale("A", "X", "x", 3.0, 30.0),
        ];
        let forward = aggregate_by_key(&sales, |s| Some(s.item_sku.clone()), |s| s.qty);
        sales.reverse();
        let backward = aggregate_by_key(&sales, |s| Some(s.item_sku.clone()), |s| s.qty);
        assert_eq!(forward["X"], backward["X"]);
        assert_eq!(forward["Y"], backward["Y"]);
    }

    #[test]
    fn declined_keys_are_omitted() {
        let sales = vec![sale("A", "X", "x", 1.0, 10.0), sale("B", "Y", "y", 2.0, 20.0)];
        let groups = aggregate_by_key(
            &sales,
            |s| (s.branch_name == "A").then(|| s.branch_name.clone()),
            |s| s.qty,
        );
        assert_eq!(groups.len(), 1);
        assert!(!groups.contains_key("B"));
    }

    #[test]
    fn top_n_drops_zero_sorts_and_truncates() {
        let groups = vec![
            ("a".to_string(), 5.0),
            ("zero".to_string(), 0.0),
            ("b".to_string(), 9.0),
            ("c".to_string(), 5.0),
            ("d".to_string(), -1.0),
        ];
        let top = top_n(groups.clone(), Some(3));
        let names: Vec<&str> = top.iter().map(|r| r.name.as_str()).collect();
        // 同值 a/c 保持首次出现顺序
        assert_eq!(names, vec!["b", "a", "c"]);

        let all = top_n(groups, None);
        assert_eq!(all.len(), 4);
        assert!(all.iter().all(|r| r.value != 0.0));
        assert!(all.windows(2).all(|w| w[0].value >= w[1].value));
    }

    #[test]
    fn product_chart_excludes_zero_net_sales() {
        let sales = vec![
            sale("A", "X", "Curcuma", 4.0, 100.0),
            sale("A", "R", "Returned", 2.0, 50.0),
            sale("B", "R", "Returned", 1.0, -50.0),
            sale("B", "Y", "Ginger", 6.0, 80.0),
        ];
        let chart = product_chart(&sales, DEFAULT_PRODUCT_TOP_N);
        let names: Vec<&str> = chart.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Ginger", "Curcuma"]);
    }

    #[test]
    fn product_chart_limits_to_n() {
        let sales: Vec<SaleRecord> = (0..15)
            .map(|i| sale("A", &format!("S{i}"), &format!("P{i}"), (i + 1) as f64, 10.0))
            .collect();
        let chart = product_chart(&sales, DEFAULT_PRODUCT_TOP_N);
        assert_eq!(chart.len(), 10);
        assert_eq!(chart[0].name, "P14");
    }

    #[test]
    fn branch_chart_is_sorted_and_unlimited() {
        let sales: Vec<SaleRecord> = (0..12)
            .map(|i| sale(&format!("B{i}"), "X", "x", 1.0, (i * 10) as f64))
            .collect();
        let chart = branch_chart(&sales);
        // B0 的销售额为 0, 被剔除
        assert_eq!(chart.len(), 11);
        assert_eq!(chart[0].name, "B11");
    }

    #[test]
    fn product_table_and_totals() {
        let sales = vec![
            sale("A", "X", "Curcuma", 2.0, 100.0),
            sale("B", "X", "Curcuma (online)", 3.0, 150.0),
            sale("B", "Y", "Ginger", 1.0, 40.0),
        ];
        let (rows, totals) = product_sales_table(&sales);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Curcuma");
        assert_eq!(rows[0].qty_sold, 5.0);
        assert_eq!(rows[0].total_sale, 250.0);
        assert_eq!(totals.qty_sold, 6.0);
        assert_eq!(totals.total_sale, 290.0);
    }

    #[test]
    fn stats_breakdown_depends_on_selection() {
        let (branches, mut sales) = scenario();
        sales.push(sale("Ghost", "X", "Curcuma", 1.0, 30.0));

        let stats = sales_stats(&sales, &branches, &BranchFilter::All, Channel::All);
        assert_eq!(stats.total, 280.0);
        assert_eq!(stats.in_store, Some(100.0));
        assert_eq!(stats.online, Some(150.0));

        let stats = sales_stats(&sales, &branches, &BranchFilter::All, Channel::Online);
        assert_eq!(stats.in_store, None);
        assert_eq!(stats.online, Some(150.0));

        let stats = sales_stats(&sales, &branches, &BranchFilter::parse("A"), Channel::All);
        assert_eq!(stats.in_store, None);
        assert_eq!(stats.online, None);
    }

    #[test]
    fn partition_excludes_unknown_branches() {
        let (branches, mut sales) = scenario();
        sales.push(sale("Unknown", "X", "Curcuma", 1.0, 1.0));
        let partition = partition_online_offline(&sales, &branches);
        assert_eq!(partition.online.len() + partition.offline.len(), 2);
        assert!(partition.online.len() + partition.offline.len() <= sales.len());
    }

    #[test]
    fn dedupe_keeps_last_row_at_first_position() {
        let inventory = vec![
            InventoryRecord {
                branch_name: "A".into(),
                item_sku: "X".into(),
                item_name: "Old name".into(),
                item_brand: "Brand".into(),
                qty: 1.0,
                last_updated: String::new(),
            },
            InventoryRecord {
                branch_name: "A".into(),
                item_sku: "Y".into(),
                item_name: "Ginger".into(),
                item_brand: "Brand".into(),
                qty: 2.0,
                last_updated: String::new(),
            },
            InventoryRecord {
                branch_name: "B".into(),
                item_sku: "X".into(),
                item_name: "New name".into(),
                item_brand: "Brand".into(),
                qty: 3.0,
                last_updated: String::new(),
            },
        ];
        let deduped = dedupe_latest_by_sku(&inventory);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].item_sku, "X");
        assert_eq!(deduped[0].item_name, "New name");
        assert_eq!(deduped[1].item_sku, "Y");

        let summary = inventory_summary(&inventory);
        assert_eq!(summary.distinct_skus, 2);
        assert_eq!(summary.total_qty, 6.0);

        let branches = vec![Branch::new(1, "A", false), Branch::new(2, "C", false)];
        let rows = branch_summary(&inventory, &branches);
        assert_eq!(rows[0].total_qty, 3.0);
        assert_eq!(rows[1].total_qty, 0.0);
    }

    #[test]
    fn cross_tab_by_branch() {
        let sales = vec![
            sale("Siam", "X", "Curcuma", 2.0, 100.0),
            sale("Central", "X", "Curcuma", 1.0, 50.0),
            sale("Siam", "X", "Curcuma", 4.0, 200.0),
            sale("Siam", "Y", "Ginger", 5.0, 60.0),
        ];
        let (branches, rows) = sales_by_branch(&sales);
        assert_eq!(branches, vec!["Central".to_string(), "Siam".to_string()]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].per_branch_qty["Siam"], 6.0);
        assert_eq!(rows[0].per_branch_qty["Central"], 1.0);
        assert_eq!(rows[0].total_qty, 7.0);
        assert_eq!(rows[1].per_branch_qty["Central"], 0.0);

        let export = sales_export_rows(&sales);
        assert_eq!(export.len(), 4);
        assert_eq!(export[3].value, 60.0);
    }
}
