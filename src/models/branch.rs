use super::de::{flag, text};
use serde::{Deserialize, Serialize};

/// 门店 / 线上渠道 (branches 接口)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub id: i64,
    #[serde(deserialize_with = "text")]
    pub name: String,
    #[serde(rename = "isOnline", default, deserialize_with = "flag")]
    pub is_online: bool, // 线上渠道 (用于线上/门店拆分)
    #[serde(rename = "isSale", default, deserialize_with = "flag")]
    pub is_sale: bool, // 出现在销售看板的门店选择器
    #[serde(rename = "isVend", default, deserialize_with = "flag")]
    pub is_vend: bool,
}

impl Branch {
    pub fn new(id: i64, name: impl Into<String>, is_online: bool) -> Self {
        Self {
            id,
            name: name.into(),
            is_online,
            is_sale: true,
            is_vend: false,
        }
    }
}

/// 库存快照日期 (stock_dates 接口), date 可能带时间部分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockDate {
    #[serde(default)]
    pub id: i64,
    #[serde(deserialize_with = "text")]
    pub date: String,
}

/// 销售数据日期 (sale_dates 接口)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleDate {
    #[serde(deserialize_with = "text")]
    pub date: String,
}

/// 商品主数据 (items 接口)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    #[serde(deserialize_with = "text")]
    pub sku: String,
    #[serde(default, deserialize_with = "text")]
    pub name: String,
}
