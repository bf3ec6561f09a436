use super::de::{finite_number, text};
use super::Record;
use serde::{Deserialize, Serialize};

/// 库存快照行 (inventory 接口), 每个 (门店, SKU) 一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryRecord {
    #[serde(deserialize_with = "text")]
    pub branch_name: String,
    #[serde(deserialize_with = "text")]
    pub item_sku: String,
    #[serde(default, deserialize_with = "text")]
    pub item_name: String,
    #[serde(default, deserialize_with = "text")]
    pub item_brand: String,
    #[serde(deserialize_with = "finite_number")]
    pub qty: f64,
    #[serde(default, deserialize_with = "text")]
    pub last_updated: String,
}

impl Record for InventoryRecord {
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
