use crate::ClientError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_URL: &str = "https://api.civo.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_URL: &str = "DISKIMG_URL";
pub const ENV_API_KEY: &str = "DISKIMG_API_KEY";
pub const ENV_REGION: &str = "DISKIMG_REGION";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    DEFAULT_URL.to_owned()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

impl ClientConfig {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_owned(),
            api_key: None,
            region: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_owned());
        self
    }

    #[must_use]
    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_owned());
        self
    }

    /// Load config from `~/.config/diskimg/config.json`.
    pub fn load_default() -> Result<Self, ClientError> {
        let path = default_config_path()?;
        Self::load(&path)
    }

    pub fn load(path: &Path) -> Result<Self, ClientError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)
            .map_err(|e| ClientError::Config(format!("invalid config {}: {e}", path.display())))?;
        config.url = config.url.trim_end_matches('/').to_owned();
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ClientError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(ClientError::Encode)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Override fields from `DISKIMG_URL`, `DISKIMG_API_KEY` and `DISKIMG_REGION`.
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    fn apply_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let set = |name: &str| lookup(name).filter(|v| !v.is_empty());
        if let Some(url) = set(ENV_URL) {
            self.url = url.trim_end_matches('/').to_owned();
        }
        if let Some(key) = set(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(region) = set(ENV_REGION) {
            self.region = Some(region);
        }
        self
    }
}

pub fn default_config_path() -> Result<PathBuf, ClientError> {
    let home = std::env::var("HOME").map_err(|_| ClientError::Config("HOME not set".to_owned()))?;
    Ok(PathBuf::from(home).join(".config/diskimg/config.json"))
}
