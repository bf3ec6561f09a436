use serde::{Deserialize, Serialize};
use std::fmt;

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub auth: AuthConfig,
    pub dashboard: DashboardConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 远端报表接口
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

/// 共享口令登录
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    /// 令牌文件; 不配置时令牌只保存在内存中
    pub token_file: Option<String>,
}

// 启动日志会打印整个配置, 口令不能出现在日志里
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"***")
            .field("token_file", &self.token_file)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// 导出文件名前缀
    pub export_prefix: String,
    pub product_top_n: usize,
    /// 库存透视表展示的门店 id; 不配置时展示全部门店
    pub inventory_branch_ids: Option<Vec<i64>>,
}

/// 请求缓存时长 (秒), 不配置为永不过期
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub reference_ttl_secs: Option<u64>,
    pub records_ttl_secs: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            backend: BackendConfig {
                base_url: "http://127.0.0.1:5052".to_string(),
                timeout_secs: 30,
            },
            auth: AuthConfig {
                username: "admin".to_string(),
                password: "password".to_string(),
                token_file: Some(".dashboard_token".to_string()),
            },
            dashboard: DashboardConfig {
                export_prefix: "DragCura".to_string(),
                product_top_n: 10,
                inventory_branch_ids: None,
            },
            cache: CacheConfig {
                reference_ttl_secs: None,
                records_ttl_secs: Some(300),
            },
        }
    }
}

impl AppConfig {
    /// 默认值 < dashboard.toml (可选) < DASHBOARD__SECTION__KEY 环境变量
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("dashboard").required(false))
            .add_source(config::Environment::with_prefix("DASHBOARD").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 从配置文件与环境变量加载配置, 失败时回退到默认配置
    pub fn from_env() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }
}
