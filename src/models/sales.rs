use super::de::{finite_number, text};
use super::Record;
use serde::{Deserialize, Serialize};

/// 销售明细 (sales 接口)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(deserialize_with = "text")]
    pub branch_name: String,
    #[serde(deserialize_with = "text")]
    pub item_sku: String,
    #[serde(default, deserialize_with = "text")]
    pub item_name: String,
    #[serde(deserialize_with = "finite_number")]
    pub qty: f64,
    #[serde(deserialize_with = "finite_number")]
    pub net_sales: f64,
    #[serde(default, deserialize_with = "text")]
    pub sale_date: String,
}

impl Record for SaleRecord {
    fn sku(&self) -> &str {
        &self.item_sku
    }

    fn name(&self) -> &str {
        &self.item_name
    }

    fn branch_name(&self) -> &str {
        &self.branch_name
    }
}
