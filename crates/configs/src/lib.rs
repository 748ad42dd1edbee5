use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/api";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub live_map: LiveMapConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_store_file")]
    pub store_file: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir(), store_file: default_store_file() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiveMapConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for LiveMapConfig {
    fn default() -> Self {
        Self { poll_interval_secs: default_poll_interval() }
    }
}

fn default_connect_timeout() -> u64 { 5 }
fn default_request_timeout() -> u64 { 30 }
fn default_data_dir() -> PathBuf { PathBuf::from(".imove-admin") }
fn default_store_file() -> String { "session.json".to_string() }
fn default_poll_interval() -> u64 { 10 }

pub fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_default() -> Result<AppConfig> {
    load_from_file(&config_path())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to defaults when
    /// the file does not exist, then apply env overrides and validate.
    pub fn load_and_validate(path: Option<&str>) -> Result<Self> {
        dotenvy::dotenv().ok();
        let path = path.map(str::to_string).unwrap_or_else(config_path);
        let mut cfg = match std::fs::metadata(&path) {
            Ok(_) => load_from_file(&path).map_err(|e| anyhow!("{path}: {e}"))?,
            Err(_) => AppConfig::default(),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.api.normalize_from_env();
        self.api.validate()?;
        self.session.validate()?;
        self.live_map.validate()?;
        Ok(())
    }

    pub fn session_file(&self) -> PathBuf {
        self.session.data_dir.join(&self.session.store_file)
    }
}

impl ApiConfig {
    pub fn normalize_from_env(&mut self) {
        // env wins only when the file left the URL unset
        if self.base_url.trim().is_empty() {
            self.base_url = std::env::var("IMOVE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        }
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
    }

    pub fn validate(&self) -> Result<()> {
        let lower = self.base_url.to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("api.base_url must start with http:// or https:// (got {:?})", self.base_url));
        }
        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(anyhow!("api timeouts must be positive seconds"));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SessionConfig {
    fn validate(&self) -> Result<()> {
        if self.store_file.trim().is_empty() {
            return Err(anyhow!("session.store_file must not be empty"));
        }
        Ok(())
    }
}

impl LiveMapConfig {
    fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            return Err(anyhow!("live_map.poll_interval_secs must be >= 1"));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
