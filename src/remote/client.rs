use crate::config::BackendConfig;
use crate::error::FetchResult;
use reqwest::Client;
use std::time::Duration;

/// 创建远端接口 HTTP 客户端
pub fn create_client(config: &BackendConfig) -> FetchResult<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}
