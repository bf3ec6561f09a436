use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 图表序列项 (按门店或按商品)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRow {
    pub name: String,
    pub value: f64,
}

/// 库存透视行: 一个 SKU, 每个门店一列, 外加合计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotRow {
    pub sku: String,
    pub name: String,
    pub brand: String,
    pub per_branch_qty: IndexMap<String, f64>,
    pub total: f64,
}

/// 商品销售表行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSalesRow {
    pub sku: String,
    pub name: String,
    pub qty_sold: f64,
    pub total_sale: f64,
}

/// 商品销售表合计行
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesTotals {
    pub qty_sold: f64,
    pub total_sale: f64,
}

/// 销售统计卡片; 选择具体门店时只展示 total
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesStats {
    pub total: f64,
    pub in_store: Option<f64>,
    pub online: Option<f64>,
}

/// 按门店交叉表行 (商品 × 门店数量)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesByBranchRow {
    pub sku: String,
    pub name: String,
    pub per_branch_qty: IndexMap<String, f64>,
    pub total_qty: f64,
}

/// 明细导出行 {SKU, Product Name, Branch, Qty, Value}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesExportRow {
    #[serde(rename = "SKU")]
    pub sku: String,
    #[serde(rename = "Product Name")]
    pub product_name: String,
    #[serde(rename = "Branch")]
    pub branch: String,
    #[serde(rename = "Qty")]
    pub qty: f64,
    #[serde(rename = "Value")]
    pub value: f64,
}

/// 库存概要: SKU 去重数与总数量
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventorySummary {
    pub distinct_skus: usize,
    pub total_qty: f64,
}

/// 门店库存汇总行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchSummaryRow {
    pub branch: String,
    pub total_qty: f64,
}
