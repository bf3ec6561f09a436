use crate::models::{Branch, Record, SaleRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 门店过滤: "all" 哨兵, 单个门店名, 或逗号分隔的多个门店名
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BranchFilter {
    #[default]
    All,
    Names(Vec<String>),
}

impl BranchFilter {
    pub const ALL: &'static str = "all";

    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case(Self::ALL) {
            return BranchFilter::All;
        }

        let names: Vec<String> = raw
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if names.is_empty() {
            BranchFilter::All
        } else {
            BranchFilter::Names(names)
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, BranchFilter::All)
    }

    /// 门店名比较忽略大小写 (远端接口同样不区分大小写)
    pub fn matches(&self, branch_name: &str) -> bool {
        match self {
            BranchFilter::All => true,
            BranchFilter::Names(names) => {
                let branch = branch_name.trim().to_lowercase();
                names.iter().any(|n| n.to_lowercase() == branch)
            }
        }
    }

    /// 发往远端的 branch 参数; "all" 时不发送
    pub fn query_value(&self) -> Option<String> {
        match self {
            BranchFilter::All => None,
            BranchFilter::Names(names) => Some(names.join(",").to_lowercase()),
        }
    }

    /// 请求标识 / 展示用
    pub fn key(&self) -> String {
        match self {
            BranchFilter::All => Self::ALL.to_string(),
            BranchFilter::Names(names) => names.join(","),
        }
    }
}

/// 线上 / 门店渠道过滤
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    All,
    Online,
    Offline,
}

impl Channel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Some(Channel::All),
            "online" => Some(Channel::Online),
            "offline" => Some(Channel::Offline),
            _ => None,
        }
    }
}

/// 闭区间日期范围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn single(date: NaiveDate) -> Self {
        Self { from: date, to: date }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// 取 "YYYY-MM-DD[ HH:MM:SS]" / "YYYY-MM-DDTHH:MM:SS" 的日期部分
pub fn date_part(raw: &str) -> Option<NaiveDate> {
    let head = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// 按搜索词 (SKU / 名称, 忽略大小写的子串匹配) 与门店过滤, 保持原有顺序
pub fn filter_records<R>(records: &[R], search_term: &str, branch: &BranchFilter) -> Vec<R>
where
    R: Record + Clone,
{
    let needle = search_term.to_lowercase();

    records
        .iter()
        .filter(|r| matches_search(*r, &needle) && branch.matches(r.branch_name()))
        .cloned()
        .collect()
}

fn matches_search<R: Record>(record: &R, needle: &str) -> bool {
    needle.is_empty()
        || record.sku().to_lowercase().contains(needle)
        || record.name().to_lowercase().contains(needle)
}

/// 远端忽略日期参数时的兜底过滤; 日期无法解析的行保留
pub fn filter_by_date_range(records: &[SaleRecord], range: &DateRange) -> Vec<SaleRecord> {
    records
        .iter()
        .filter(|r| date_part(&r.sale_date).map_or(true, |d| range.contains(d)))
        .cloned()
        .collect()
}

/// 按渠道过滤; 门店不在参考列表中的行在 online/offline 下都被排除
pub fn filter_by_channel<R>(records: &[R], branches: &[Branch], channel: Channel) -> Vec<R>
where
    R: Record + Clone,
{
    let wanted = match channel {
        Channel::All => return records.to_vec(),
        Channel::Online => true,
        Channel::Offline => false,
    };

    let online_by_name = online_lookup(branches);
    records
        .iter()
        .filter(|r| online_by_name.get(r.branch_name()) == Some(&wanted))
        .cloned()
        .collect()
}

/// 门店名 -> isOnline, 同名取第一条
pub(crate) fn online_lookup(branches: &[Branch]) -> HashMap<&str, bool> {
    let mut lookup = HashMap::with_capacity(branches.len());
    for b in branches {
        lookup.entry(b.name.as_str()).or_insert(b.is_online);
    }
    lookup
}
