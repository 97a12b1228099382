use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use scrape::{ClientSettings, ScrapePolicy, SourceKind, DEFAULT_SOURCE_ORDER};
use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: u32 = 2;
pub const CONFIG_ENV: &str = "VIDEOSHELF_CONFIG";

const DEFAULT_MEDIA_ROOT: &str = "/volume1/Video_Server/static/artists";
const DEFAULT_PORT: u16 = 1699;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub source: SourceKind,
    pub enabled: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::JavDb,
            enabled: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub accept_language: String,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub source_delay_ms: u64,
    pub batch_delay_ms: u64,
    pub sources: Vec<SourceConfig>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        let policy = ScrapePolicy::default();
        Self {
            timeout_secs: client.timeout.as_secs(),
            user_agent: client.user_agent,
            accept_language: client.accept_language,
            max_retries: policy.max_retries,
            retry_delay_ms: policy.retry_delay.as_millis() as u64,
            source_delay_ms: policy.source_delay.as_millis() as u64,
            batch_delay_ms: policy.batch_delay.as_millis() as u64,
            sources: Vec::new(),
        }
    }
}

impl ScrapeConfig {
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
            accept_language: self.accept_language.clone(),
        }
    }

    pub fn policy(&self) -> ScrapePolicy {
        ScrapePolicy {
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            source_delay: Duration::from_millis(self.source_delay_ms),
            batch_delay: Duration::from_millis(self.batch_delay_ms),
        }
    }

    /// Enabled sources in configured order; the built-in order when none
    /// are configured. Blocked sources are dropped later by the registry.
    pub fn source_order(&self) -> Vec<SourceKind> {
        if self.sources.is_empty() {
            return DEFAULT_SOURCE_ORDER.to_vec();
        }
        self.sources
            .iter()
            .filter(|source| source.enabled)
            .map(|source| source.source)
            .collect()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub version: u32,
    pub media_root: String,
    pub port: u16,
    pub catalog_file_name: String,
    pub scrape: ScrapeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            media_root: DEFAULT_MEDIA_ROOT.to_string(),
            port: DEFAULT_PORT,
            catalog_file_name: library::DEFAULT_CATALOG_FILE.to_string(),
            scrape: ScrapeConfig::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {}", err),
            ConfigError::Yaml(err) => write!(f, "yaml error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

pub fn config_path_from_env() -> PathBuf {
    match env::var(CONFIG_ENV) {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => default_config_path(),
    }
}

fn default_config_path() -> PathBuf {
    match env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join("config.yaml"))
            .unwrap_or_else(|| PathBuf::from("config.yaml")),
        Err(_) => PathBuf::from("config.yaml"),
    }
}

/// Loads the config, filling blank or zero values with defaults. A missing
/// file is created with defaults; the flag reports whether that happened.
pub fn load_or_create_config(path: &Path) -> Result<(ServerConfig, bool), ConfigError> {
    if path.exists() {
        let contents = fs::read_to_string(path)?;
        let mut config: ServerConfig = serde_yaml::from_str(&contents)?;
        normalize_config(&mut config);
        return Ok((config, false));
    }

    let config = ServerConfig::default();
    save_config(path, &config)?;
    Ok((config, true))
}

fn normalize_config(config: &mut ServerConfig) {
    let defaults = ScrapeConfig::default();
    if config.version < CONFIG_VERSION {
        config.version = CONFIG_VERSION;
    }
    if config.media_root.trim().is_empty() {
        config.media_root = DEFAULT_MEDIA_ROOT.to_string();
    }
    if config.port == 0 {
        config.port = DEFAULT_PORT;
    }
    if config.catalog_file_name.trim().is_empty() {
        config.catalog_file_name = library::DEFAULT_CATALOG_FILE.to_string();
    }
    let scrape = &mut config.scrape;
    if scrape.timeout_secs == 0 {
        scrape.timeout_secs = DEFAULT_TIMEOUT_SECS;
    }
    if scrape.max_retries == 0 {
        scrape.max_retries = DEFAULT_MAX_RETRIES;
    }
    if scrape.user_agent.trim().is_empty() {
        scrape.user_agent = defaults.user_agent;
    }
    if scrape.accept_language.trim().is_empty() {
        scrape.accept_language = defaults.accept_language;
    }
}

pub fn save_config(path: &Path, config: &ServerConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    fs::write(path, contents)?;
    Ok(())
}

pub fn resolve_path(config_path: &Path, value: &str) -> PathBuf {
    let raw = PathBuf::from(value.trim());
    if raw.is_absolute() {
        return raw;
    }
    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    base.join(raw)
}
