use super::TableView;
use crate::error::ExportError;
use csv::{QuoteStyle, Terminator, WriterBuilder};

/// 剪贴板文本: 表头行 + 数据行, 制表符分隔, 行间换行
pub fn to_clipboard_text(table: &TableView) -> Result<String, ExportError> {
    let bytes = write_delimited(table, b'\t', QuoteStyle::Necessary)?;
    let mut text = String::from_utf8_lossy(&bytes).into_owned();
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// CSV 文件, 带 UTF-8 BOM 以便 Excel 正确识别非 ASCII 字符
pub fn to_csv(table: &TableView) -> Result<Vec<u8>, ExportError> {
    let mut bytes = "\u{FEFF}".as_bytes().to_vec();
    bytes.extend(write_delimited(table, b',', QuoteStyle::Necessary)?);
    Ok(bytes)
}

fn write_delimited(table: &TableView, delimiter: u8, quote: QuoteStyle) -> Result<Vec<u8>, ExportError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .quote_style(quote)
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|c| c.to_string()))?;
    }

    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}
