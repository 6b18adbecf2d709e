use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub swaps: SwapsConfig,
    #[serde(default)]
    pub stats: StatsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    Gateway,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub kind: StoreKind,
    /// JSON array of swap documents, used by the memory store.
    #[serde(default)]
    pub data_file: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SwapsConfig {
    /// Assets tracked in the stats endpoint. Also rejected by the `token` list filter.
    #[serde(default)]
    pub assets: Vec<String>,
    #[serde(default)]
    pub exclude_assets: Vec<String>,
    #[serde(default)]
    pub chains: Vec<String>,
    #[serde(default = "default_chain")]
    pub default_chain: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatsConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_timeout_secs() -> u64 { 10 }
fn default_chain() -> String { "SOLANA".to_string() }
fn default_cache_ttl_secs() -> u64 { 60 }

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl Default for SwapsConfig {
    fn default() -> Self {
        Self {
            assets: Vec::new(),
            exclude_assets: Vec::new(),
            chains: Vec::new(),
            default_chain: default_chain(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        config.swaps.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.swaps.chains.is_empty() {
            return Err(ConfigError::Invalid("swaps.chains must not be empty".into()));
        }
        if self.swaps.default_chain.is_empty() {
            return Err(ConfigError::Invalid("swaps.default_chain must not be empty".into()));
        }
        match self.store.kind {
            StoreKind::Memory if self.store.data_file.is_none() => {
                Err(ConfigError::Invalid("store.data_file is required for the memory store".into()))
            }
            StoreKind::Gateway if self.store.url.is_none() => {
                Err(ConfigError::Invalid("store.url is required for the gateway store".into()))
            }
            _ => Ok(()),
        }
    }
}

impl SwapsConfig {
    /// Deployment overrides: `ASSETS`, `EXCLUDE_ASSETS` and `CHAINS`, comma separated.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("ASSETS") {
            self.assets = split_list(&v);
        }
        if let Some(v) = var("EXCLUDE_ASSETS") {
            self.exclude_assets = split_list(&v);
        }
        if let Some(v) = var("CHAINS") {
            self.chains = split_list(&v);
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
