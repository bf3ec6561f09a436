use crate::config::AuthConfig;
use crate::error::AuthError;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// 令牌存储 (浏览器 localStorage 的对应物)
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, AuthError>;
    fn save(&self, token: &str) -> Result<(), AuthError>;
    fn clear(&self) -> Result<(), AuthError>;
}

/// 文件令牌存储, 重启后仍保持登录
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, AuthError> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => {
                let token = s.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, token: &str) -> Result<(), AuthError> {
        std::fs::write(&self.path, token)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// 内存令牌存储
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, AuthError> {
        let slot = self.token.lock().map_err(|_| AuthError::Poisoned)?;
        Ok(slot.clone())
    }

    fn save(&self, token: &str) -> Result<(), AuthError> {
        let mut slot = self.token.lock().map_err(|_| AuthError::Poisoned)?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        let mut slot = self.token.lock().map_err(|_| AuthError::Poisoned)?;
        *slot = None;
        Ok(())
    }
}

/// 共享口令登录门禁。
/// 只是能力门槛, 不是安全边界: 登录成功后签发不透明令牌并持久化。
pub struct AuthGate {
    username: String,
    password: String,
    store: Arc<dyn TokenStore>,
}

impl AuthGate {
    pub fn new(username: &str, password: &str, store: Arc<dyn TokenStore>) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            store,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        let store: Arc<dyn TokenStore> = match &config.token_file {
            Some(path) => Arc::new(FileTokenStore::new(path)),
            None => Arc::new(MemoryTokenStore::default()),
        };
        Self::new(&config.username, &config.password, store)
    }

    /// 校验口令, 成功后签发并保存新令牌
    pub fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        if username != self.username || password != self.password {
            tracing::warn!("login rejected for user {}", username);
            return Err(AuthError::InvalidCredentials);
        }

        let token = Uuid::new_v4().to_string();
        self.store.save(&token)?;
        tracing::info!("user {} logged in", username);
        Ok(token)
    }

    /// 令牌与已保存的令牌一致时通过
    pub fn verify(&self, token: &str) -> Result<(), AuthError> {
        match self.store.load()? {
            Some(stored) if !token.is_empty() && stored == token => Ok(()),
            _ => Err(AuthError::Unauthorized),
        }
    }

    /// 启动时检查是否已有保存的令牌
    pub fn is_authenticated(&self) -> Result<bool, AuthError> {
        Ok(self.store.load()?.is_some())
    }

    pub fn logout(&self) -> Result<(), AuthError> {
        self.store.clear()
    }
}
