//! 表格导出: xlsx 工作簿, CSV 文件, 剪贴板制表符文本
//!
//! 导出端只消费 [`TableView`], 不关心表格来自哪个视图。

pub mod clipboard;
pub mod xlsx;

pub use clipboard::{to_clipboard_text, to_csv};
pub use xlsx::write_workbook;

use crate::error::ExportError;
use crate::models::{SalesByBranchRow, SalesExportRow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 单元格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// 渲染后的表格: 表头 + 数据行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableView {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl TableView {
    pub fn new(title: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            title: title.into(),
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 由可导出行构造表格
    pub fn from_rows<T: Exportable>(title: impl Into<String>, rows: &[T]) -> Self {
        let mut table = Self::new(title, T::headers().into_iter().map(str::to_string).collect());
        table.rows = rows.iter().map(T::to_row).collect();
        table
    }

    /// 没有可导出内容时报错
    pub fn ensure_renderable(table: Option<&TableView>) -> Result<&TableView, ExportError> {
        match table {
            Some(t) if !t.headers.is_empty() && !t.is_empty() => Ok(t),
            _ => Err(ExportError::NoTable),
        }
    }
}

/// 可导出为表格行的类型
pub trait Exportable {
    fn headers() -> Vec<&'static str>;

    fn to_row(&self) -> Vec<Cell>;
}

impl Exportable for SalesExportRow {
    fn headers() -> Vec<&'static str> {
        vec!["SKU", "Product Name", "Branch", "Qty", "Value"]
    }

    fn to_row(&self) -> Vec<Cell> {
        vec![
            self.sku.as_str().into(),
            self.product_name.as_str().into(),
            self.branch.as_str().into(),
            self.qty.into(),
            self.value.into(),
        ]
    }
}

/// 按门店交叉表 -> 表格 (门店列为 "<门店> Qty")
pub fn sales_by_branch_table(branches: &[String], rows: &[SalesByBranchRow]) -> TableView {
    let mut headers = vec!["SKU".to_string(), "Product Name".to_string()];
    headers.extend(branches.iter().map(|b| format!("{} Qty", b)));
    headers.push("Total Qty".to_string());

    let mut table = TableView::new("Sales By Branch", headers);
    for row in rows {
        let mut cells: Vec<Cell> = vec![row.sku.as_str().into(), row.name.as_str().into()];
        cells.extend(
            branches
                .iter()
                .map(|b| Cell::Number(row.per_branch_qty.get(b).copied().unwrap_or(0.0))),
        );
        cells.push(row.total_qty.into());
        table.push_row(cells);
    }
    table
}

/// 支持的导出格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
    Tsv,
}

impl ExportFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "xlsx" | "excel" => Some(ExportFormat::Xlsx),
            "csv" => Some(ExportFormat::Csv),
            "tsv" | "clipboard" => Some(ExportFormat::Tsv),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "txt",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Tsv => "text/plain; charset=utf-8",
        }
    }
}

/// 导出产物
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// 按格式渲染表格
pub fn render(table: &TableView, format: ExportFormat, base_name: &str) -> Result<ExportFile, ExportError> {
    let bytes = match format {
        ExportFormat::Xlsx => write_workbook(table)?,
        ExportFormat::Csv => to_csv(table)?,
        ExportFormat::Tsv => to_clipboard_text(table)?.into_bytes(),
    };

    Ok(ExportFile {
        file_name: format!("{}.{}", base_name, format.extension()),
        content_type: format.content_type(),
        bytes,
    })
}

fn date_or_all(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "all".to_string())
}

/// <前缀>_<类别>_<起>_to_<止>, 缺失端写 all
pub fn range_base_name(
    prefix: &str,
    category: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> String {
    format!("{}_{}_{}_to_{}", prefix, category, date_or_all(from), date_or_all(to))
}

/// <前缀>_<类别>_<日期>
pub fn date_base_name(prefix: &str, category: &str, date: Option<NaiveDate>) -> String {
    format!("{}_{}_{}", prefix, category, date_or_all(date))
}
