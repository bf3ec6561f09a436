use crate::error::{FetchError, FetchResult};
use crate::models::{Branch, InventoryRecord, Item, SaleDate, SaleRecord, StockDate};
use crate::remote::cache::{CachePolicy, Lookup};
use crate::remote::RequestCache;
use crate::service::filter::BranchFilter;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// 远端接口统一包装 { data: [...] }
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Vec<Value>,
}

/// 远端报表接口访问上下文 (客户端 + 基础地址 + 注入的请求缓存)
#[derive(Clone)]
pub struct RemoteApi {
    client: Client,
    base_url: String,
    cache: Arc<RequestCache>,
    reference: CachePolicy,
    records: CachePolicy,
}

impl RemoteApi {
    pub fn new(client: Client, base_url: &str, cache: Arc<RequestCache>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache,
            reference: CachePolicy::reference(None),
            records: CachePolicy::records(None),
        }
    }

    /// 参考数据 (门店/日期/商品) 与明细数据的缓存时长, None 为不过期
    pub fn with_ttl(mut self, reference_ttl: Option<Duration>, records_ttl: Option<Duration>) -> Self {
        self.reference = CachePolicy::reference(reference_ttl);
        self.records = CachePolicy::records(records_ttl);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET 集合接口, 带缓存。
    ///
    /// 远端失败且有过期但保留的缓存 (参考数据) 时返回旧值。
    async fn fetch_collection<T>(
        &self,
        path: &str,
        params: &[(&str, String)],
        policy: CachePolicy,
    ) -> FetchResult<Arc<Vec<T>>>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let key = request_key(path, params);
        let expired = match self.cache.lookup::<Vec<T>>(&key) {
            Lookup::Fresh(hit) => {
                tracing::debug!("cache hit: {}", key);
                return Ok(hit);
            }
            Lookup::Expired(previous) => Some(previous),
            Lookup::Miss => None,
        };

        match self.request_collection::<T>(path, params, &key).await {
            Ok(rows) => {
                let rows = Arc::new(rows);
                self.cache.insert(key, rows.clone(), policy);
                Ok(rows)
            }
            Err(e) => match expired {
                Some(previous) => {
                    tracing::warn!("Failed to refresh {}, serving expired copy: {}", key, e);
                    Ok(previous)
                }
                None => Err(e),
            },
        }
    }

    /// 发起请求并逐行校验; 校验失败的行记录日志后丢弃
    async fn request_collection<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        key: &str,
    ) -> FetchResult<Vec<T>> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self.client.get(&url).query(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let envelope: Envelope =
            serde_json::from_str(&body).map_err(|e| FetchError::InvalidResponse {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let total = envelope.data.len();
        let mut rows = Vec::with_capacity(total);
        for (idx, raw) in envelope.data.into_iter().enumerate() {
            match serde_json::from_value::<T>(raw) {
                Ok(row) => rows.push(row),
                Err(e) => tracing::warn!("{}: skipping row {}: {}", path, idx, e),
            }
        }
        if rows.len() < total {
            tracing::warn!("{}: rejected {} of {} rows", path, total - rows.len(), total);
        }
        tracing::info!("fetched {} rows from {}", rows.len(), key);
        Ok(rows)
    }
}

/// 请求标识: 接口路径 + 参数, 同时用作缓存键
pub fn request_key(path: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    format!("{}?{}", path, query.join("&"))
}

fn branch_param(params: &mut Vec<(&'static str, String)>, branch: &BranchFilter) {
    if let Some(value) = branch.query_value() {
        params.push(("branch", value));
    }
}

/// 查询门店列表
pub async fn get_branches(api: &RemoteApi) -> FetchResult<Arc<Vec<Branch>>> {
    api.fetch_collection("branches", &[], api.reference).await
}

/// 查询库存快照日期
pub async fn get_stock_dates(api: &RemoteApi) -> FetchResult<Arc<Vec<StockDate>>> {
    api.fetch_collection("stock_dates", &[], api.reference).await
}

/// 查询某日库存 (branch 为 all 时不带门店参数)
pub async fn get_inventory(
    api: &RemoteApi,
    date: &str,
    branch: &BranchFilter,
) -> FetchResult<Arc<Vec<InventoryRecord>>> {
    let mut params = Vec::with_capacity(2);
    if !date.is_empty() {
        params.push(("date", date.to_string()));
    }
    branch_param(&mut params, branch);
    api.fetch_collection("inventory", &params, api.records).await
}

/// 查询有销售数据的日期
pub async fn get_sale_dates(api: &RemoteApi) -> FetchResult<Arc<Vec<SaleDate>>> {
    api.fetch_collection("sale_dates", &[], api.reference).await
}

/// 查询日期区间内的销售明细
pub async fn get_sales(
    api: &RemoteApi,
    date_from: &str,
    date_to: &str,
    branch: &BranchFilter,
) -> FetchResult<Arc<Vec<SaleRecord>>> {
    let mut params = vec![
        ("datefrom", date_from.to_string()),
        ("dateto", date_to.to_string()),
    ];
    branch_param(&mut params, branch);
    api.fetch_collection("sales", &params, api.records).await
}

/// 查询商品主数据
pub async fn get_items(api: &RemoteApi) -> FetchResult<Arc<Vec<Item>>> {
    api.fetch_collection("items", &[], api.reference).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_key_includes_params_in_order() {
        assert_eq!(request_key("branches", &[]), "branches");
        let params = vec![
            ("datefrom", "2024-03-01".to_string()),
            ("dateto", "2024-03-02".to_string()),
            ("branch", "siam".to_string()),
        ];
        assert_eq!(
            request_key("sales", &params),
            "sales?datefrom=2024-03-01&dateto=2024-03-02&branch=siam"
        );
    }

    #[test]
    fn branch_param_is_lowercased_and_omitted_for_all() {
        let mut params = Vec::new();
        branch_param(&mut params, &BranchFilter::All);
        assert!(params.is_empty());
        branch_param(&mut params, &BranchFilter::parse("Siam Paragon"));
        assert_eq!(params, vec![("branch", "siam paragon".to_string())]);
    }
}
