//! 接口边界的宽松反序列化
//!
//! 远端接口的数值字段可能以数字或数字字符串返回, 标志位以 0/1 返回。
//! 无法解析或非有限的数值直接拒绝整行, 不让 NaN 进入聚合。

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawText {
    Text(String),
    Integer(i64),
    Number(f64),
}

/// 有限数值 (数字或数字字符串)
pub fn finite_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match RawNumber::deserialize(deserializer)? {
        RawNumber::Number(n) => n,
        RawNumber::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("invalid number: {:?}", s)))?,
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(de::Error::custom("non-finite number"))
    }
}

/// 0/1、布尔或字符串形式的标志位, 缺失或 null 视为 false
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawFlag>::deserialize(deserializer)? {
        None => false,
        Some(RawFlag::Bool(b)) => b,
        Some(RawFlag::Number(n)) => n != 0.0,
        Some(RawFlag::Text(s)) => {
            let s = s.trim();
            s == "1" || s.eq_ignore_ascii_case("true")
        }
    })
}

/// 文本字段, SKU 偶尔以数字返回; null 视为空串
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawText>::deserialize(deserializer)? {
        None => String::new(),
        Some(RawText::Text(s)) => s,
        Some(RawText::Integer(i)) => i.to_string(),
        Some(RawText::Number(n)) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "finite_number")]
        qty: f64,
        #[serde(default, deserialize_with = "flag")]
        online: bool,
        #[serde(default, deserialize_with = "text")]
        sku: String,
    }

    #[test]
    fn accepts_numbers_and_numeric_strings() {
        let p: Sample = serde_json::from_str(r#"{"qty": 3, "online": 1, "sku": 1001}"#).unwrap();
        assert_eq!(p.qty, 3.0);
        assert!(p.online);
        assert_eq!(p.sku, "1001");

        let p: Sample = serde_json::from_str(r#"{"qty": " 2.5 ", "online": "0"}"#).unwrap();
        assert_eq!(p.qty, 2.5);
        assert!(!p.online);
        assert_eq!(p.sku, "");
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert!(serde_json::from_str::<Sample>(r#"{"qty": "abc"}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"qty": "NaN"}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"qty": null}"#).is_err());
    }
}
