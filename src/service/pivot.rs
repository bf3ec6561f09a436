use crate::models::{Branch, InventoryRecord, PivotRow};
use crate::service::aggregate::aggregate_by_key;
use indexmap::IndexMap;
use rayon::prelude::*;
use std::collections::HashMap;

/// 库存视图的门店选择
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchSelection {
    /// 全部门店: 每个门店一列, 合计为该 SKU 在所有库存行上的数量和
    All,
    /// 单个门店: 只有该门店一列, 合计即该门店数量
    Single(String),
    /// 多个门店: 每个选中门店一列, 合计为选中门店的库存行之和
    Subset(Vec<String>),
}

/// 透视库存: 每个去重后的 SKU 一行。
///
/// 单元格取第一条匹配 (sku, 门店) 的库存数量, 缺失为 0。
/// 全部/多门店模式下 Total 统计传入的该 SKU 全部库存行, 不受列集合限制;
/// 单门店模式下 Total 等于该门店的数量。
pub fn pivot_by_branch(
    inventory: &[InventoryRecord],
    branches: &[Branch],
    deduped: &[&InventoryRecord],
    selection: &BranchSelection,
) -> Vec<PivotRow> {
    let mut cell_qty: HashMap<(&str, &str), f64> = HashMap::with_capacity(inventory.len());
    for r in inventory {
        cell_qty
            .entry((r.item_sku.as_str(), r.branch_name.as_str()))
            .or_insert(r.qty);
    }
    let lookup = |sku: &str, branch: &str| cell_qty.get(&(sku, branch)).copied().unwrap_or(0.0);

    match selection {
        BranchSelection::All | BranchSelection::Subset(_) => {
            let sku_totals = aggregate_by_key(inventory, |r| Some(r.item_sku.as_str()), |r| r.qty);
            deduped
                .par_iter()
                .map(|item| {
                    let per_branch_qty: IndexMap<String, f64> = branches
                        .iter()
                        .map(|b| (b.name.clone(), lookup(&item.item_sku, &b.name)))
                        .collect();
                    PivotRow {
                        sku: item.item_sku.clone(),
                        name: item.item_name.clone(),
                        brand: item.item_brand.clone(),
                        per_branch_qty,
                        total: sku_totals.get(item.item_sku.as_str()).copied().unwrap_or(0.0),
                    }
                })
                .collect()
        }
        BranchSelection::Single(branch) => deduped
            .par_iter()
            .map(|item| {
                let qty = lookup(&item.item_sku, branch);
                let mut per_branch_qty = IndexMap::with_capacity(1);
                per_branch_qty.insert(branch.clone(), qty);
                PivotRow {
                    sku: item.item_sku.clone(),
                    name: item.item_name.clone(),
                    brand: item.item_brand.clone(),
                    per_branch_qty,
                    total: qty,
                }
            })
            .collect(),
    }
}

/// 透视表列使用的门店集合; 未配置 id 时使用全部门店
pub fn column_branches(branches: &[Branch], allowed_ids: Option<&[i64]>) -> Vec<Branch> {
    match allowed_ids {
        Some(ids) => branches.iter().filter(|b| ids.contains(&b.id)).cloned().collect(),
        None => branches.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::aggregate::dedupe_latest_by_sku;

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

    #[test]
    fn all_branches_scenario() {
        let inventory = vec![inv("X", "A", 5.0), inv("X", "B", 0.0)];
        let branches = vec![Branch::new(1, "A", false), Branch::new(2, "B", true)];
        let deduped = dedupe_latest_by_sku(&inventory);

        let rows = pivot_by_branch(&inventory, &branches, &deduped, &BranchSelection::All);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sku, "X");
        assert_eq!(rows[0].per_branch_qty["A"], 5.0);
        assert_eq!(rows[0].per_branch_qty["B"], 0.0);
        assert_eq!(rows[0].total, 5.0);
    }

    #[test]
    fn total_spans_branches_outside_the_column_set() {
        let inventory = vec![
            inv("X", "A", 5.0),
            inv("X", "Warehouse", 20.0),
            inv("Y", "A", 1.0),
        ];
        let branches = vec![Branch::new(1, "A", false)];
        let deduped = dedupe_latest_by_sku(&inventory);

        let rows = pivot_by_branch(&inventory, &branches, &deduped, &BranchSelection::All);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].per_branch_qty.len(), 1);
        assert_eq!(rows[0].per_branch_qty["A"], 5.0);
        assert_eq!(rows[0].total, 25.0);
        assert_eq!(rows[1].total, 1.0);
    }

    #[test]
    fn single_branch_total_is_that_branch_qty() {
        let inventory = vec![inv("X", "A", 5.0), inv("X", "B", 7.0), inv("Y", "B", 2.0)];
        let branches = vec![Branch::new(1, "A", false), Branch::new(2, "B", true)];
        let deduped = dedupe_latest_by_sku(&inventory);

        let selection = BranchSelection::Single("A".to_string());
        let rows = pivot_by_branch(&inventory, &branches, &deduped, &selection);
        assert_eq!(rows[0].per_branch_qty["A"], 5.0);
        assert_eq!(rows[0].total, 5.0);
        // Y 在 A 没有库存行, 默认 0
        assert_eq!(rows[1].per_branch_qty["A"], 0.0);
        assert_eq!(rows[1].total, 0.0);
    }

    #[test]
    fn subset_columns_follow_given_branches() {
        let inventory = vec![inv("X", "A", 5.0), inv("X", "B", 3.0)];
        let columns = vec![Branch::new(1, "A", false), Branch::new(2, "B", true)];
        let deduped = dedupe_latest_by_sku(&inventory);

        let selection = BranchSelection::Subset(vec!["A".to_string(), "B".to_string()]);
        let rows = pivot_by_branch(&inventory, &columns, &deduped, &selection);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].per_branch_qty.keys().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(rows[0].total, 8.0);
    }

    #[test]
    fn first_matching_cell_wins() {
        let inventory = vec![inv("X", "A", 5.0), inv("X", "A", 9.0)];
        let branches = vec![Branch::new(1, "A", false)];
        let deduped = dedupe_latest_by_sku(&inventory);
        let rows = pivot_by_branch(&inventory, &branches, &deduped, &BranchSelection::All);
        assert_eq!(rows[0].per_branch_qty["A"], 5.0);
        assert_eq!(rows[0].total, 14.0);
    }

    #[test]
    fn configured_column_ids() {
        let branches = vec![
            Branch::new(1, "A", false),
            Branch::new(11, "Closed", false),
            Branch::new(36, "Lazada", true),
        ];
        let cols = column_branches(&branches, Some(&[1, 36]));
        let names: Vec<&str> = cols.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["A", "Lazada"]);
        assert_eq!(column_branches(&branches, None).len(), 3);
    }
}
