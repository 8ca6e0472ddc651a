use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const API_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AlphaVantageConfig {
    #[serde(default = "AlphaVantageConfig::default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
}

impl AlphaVantageConfig {
    fn default_base_url() -> String {
        "https://www.alphavantage.co".to_string()
    }

    /// The configured key, or the one from the environment when it is empty.
    pub fn resolved_api_key(&self) -> Option<String> {
        if !self.api_key.trim().is_empty() {
            return Some(self.api_key.trim().to_string());
        }
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl Default for AlphaVantageConfig {
    fn default() -> Self {
        AlphaVantageConfig {
            base_url: Self::default_base_url(),
            api_key: String::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub alphavantage: AlphaVantageConfig,
}

/// Quote lifetimes. Crypto moves faster than the rest.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub price_ttl_secs: u64,
    pub crypto_ttl_secs: u64,
    pub fx_ttl_secs: u64,
    /// Keep quotes on disk between runs.
    pub persist: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            price_ttl_secs: 300,
            crypto_ttl_secs: 60,
            fx_ttl_secs: 3600,
            persist: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    /// Per external call.
    pub timeout_secs: u64,
    pub max_concurrent: usize,
    pub retries: usize,
    pub retry_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            timeout_secs: 10,
            max_concurrent: 4,
            retries: 1,
            retry_delay_ms: 250,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default = "AppConfig::default_owner")]
    pub owner: String,
    pub currency: String,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    fn default_owner() -> String {
        "local".to_string()
    }

    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "networth", "networth")
            .context("Could not determine project directories")
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config.currency = crate::core::currency::normalize_currency_code(&config.currency)
            .with_context(|| format!("Invalid currency in {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
