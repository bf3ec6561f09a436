use crate::models::{PivotRow, ProductSalesRow};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// 表格排序状态 {column, direction}。
/// 点击当前列翻转方向; 点击其他列切换到该列并强制降序。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSort {
    pub column: String,
    pub direction: SortDirection,
}

impl TableSort {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }

    pub fn click(&mut self, column: &str) {
        if self.column == column {
            self.direction = self.direction.toggled();
        } else {
            self.column = column.to_string();
            self.direction = SortDirection::Desc;
        }
    }
}

/// 单元格排序键
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortKey<'a> {
    Text(&'a str),
    Number(f64),
}

/// 可按列名排序的表格行
pub trait SortableRow {
    fn sort_key(&self, column: &str) -> Option<SortKey<'_>>;
}

/// 字符串忽略大小写, 数值按大小; 数值排在文本之前, 缺失列视为相等
pub fn compare_keys(a: Option<SortKey<'_>>, b: Option<SortKey<'_>>) -> Ordering {
    match (a, b) {
        (Some(SortKey::Text(a)), Some(SortKey::Text(b))) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Some(SortKey::Number(a)), Some(SortKey::Number(b))) => {
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(SortKey::Number(_)), Some(SortKey::Text(_))) => Ordering::Less,
        (Some(SortKey::Text(_)), Some(SortKey::Number(_))) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// 稳定排序, 相等行保持原有顺序
pub fn sort_rows<R: SortableRow>(rows: &mut [R], column: &str, direction: SortDirection) {
    rows.sort_by(|a, b| {
        let ord = compare_keys(a.sort_key(column), b.sort_key(column));
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

impl SortableRow for ProductSalesRow {
    fn sort_key(&self, column: &str) -> Option<SortKey<'_>> {
        match column {
            "sku" => Some(SortKey::Text(&self.sku)),
            "name" => Some(SortKey::Text(&self.name)),
            "qty_sold" => Some(SortKey::Number(self.qty_sold)),
            "total_sale" => Some(SortKey::Number(self.total_sale)),
            _ => None,
        }
    }
}

impl SortableRow for PivotRow {
    fn sort_key(&self, column: &str) -> Option<SortKey<'_>> {
        match column {
            "sku" => Some(SortKey::Text(&self.sku)),
            "name" => Some(SortKey::Text(&self.name)),
            "brand" => Some(SortKey::Text(&self.brand)),
            "total" => Some(SortKey::Number(self.total)),
            branch => self.per_branch_qty.get(branch).map(|q| SortKey::Number(*q)),
        }
    }
}
