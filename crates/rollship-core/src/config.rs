use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::client::http::Credentials;
use crate::destination::IngestionDestination;
use crate::retry::BackoffPolicy;

pub const ENV_INGEST_URL: &str = "ROLLSHIP_INGEST_CLUSTER_URL";
pub const ENV_ACCESS_TOKEN: &str = "ROLLSHIP_ACCESS_TOKEN";
pub const ENV_DATABASE: &str = "ROLLSHIP_DATABASE";
pub const ENV_TABLE: &str = "ROLLSHIP_TABLE";

/// Authentication section. Token acquisition is external; only the result is configured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Bearer token for the ingestion endpoint (env fallback: `ROLLSHIP_ACCESS_TOKEN`).
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Configuration loaded from `~/.config/rollship/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipConfig {
    /// Ingestion endpoint URL (env fallback: `ROLLSHIP_INGEST_CLUSTER_URL`).
    #[serde(default)]
    pub ingest_url: String,
    #[serde(default)]
    pub auth: AuthConfig,
    /// Target database (env fallback: `ROLLSHIP_DATABASE`).
    #[serde(default)]
    pub database: String,
    /// Target table (env fallback: `ROLLSHIP_TABLE`).
    #[serde(default)]
    pub table: String,
    /// Optional pre-created ingestion mapping on the table.
    #[serde(default)]
    pub mapping: Option<String>,
    /// "csv" or "json", case-insensitive; anything else is CSV.
    #[serde(default)]
    pub mapping_kind: Option<String>,
    #[serde(default)]
    pub flush_immediately: bool,
    /// HTTP proxy, "host:port" or "http://host:port".
    #[serde(default)]
    pub proxy_url: Option<String>,
    /// First retry delay in seconds.
    #[serde(default = "default_backoff_min_secs")]
    pub backoff_min_secs: u64,
    /// Upper bound for retry delays in seconds.
    #[serde(default = "default_backoff_max_secs")]
    pub backoff_max_secs: u64,
}

fn default_backoff_min_secs() -> u64 {
    1
}

fn default_backoff_max_secs() -> u64 {
    60
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            ingest_url: String::new(),
            auth: AuthConfig::default(),
            database: String::new(),
            table: String::new(),
            mapping: None,
            mapping_kind: None,
            flush_immediately: false,
            proxy_url: None,
            backoff_min_secs: default_backoff_min_secs(),
            backoff_max_secs: default_backoff_max_secs(),
        }
    }
}

fn is_blank(s: Option<&str>) -> bool {
    s.map(|s| s.trim().is_empty()).unwrap_or(true)
}

impl ShipConfig {
    /// Fill blank fields from the process environment.
    pub fn resolve_env(self) -> Self {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Fill blank fields using `lookup` (an environment stand-in).
    pub fn resolve_with<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.ingest_url.trim().is_empty() {
            if let Some(v) = lookup(ENV_INGEST_URL) {
                self.ingest_url = v;
            }
        }
        if self.database.trim().is_empty() {
            if let Some(v) = lookup(ENV_DATABASE) {
                self.database = v;
            }
        }
        if self.table.trim().is_empty() {
            if let Some(v) = lookup(ENV_TABLE) {
                self.table = v;
            }
        }
        if is_blank(self.auth.access_token.as_deref()) {
            self.auth.access_token = lookup(ENV_ACCESS_TOKEN).filter(|t| !t.trim().is_empty());
        }
        self
    }

    /// Check required fields and backoff bounds.
    pub fn validate(&self) -> Result<()> {
        if self.ingest_url.trim().is_empty() {
            bail!("ingest_url is not set (config file or {})", ENV_INGEST_URL);
        }
        if self.database.trim().is_empty() || self.table.trim().is_empty() {
            bail!("database and table must both be set");
        }
        if self.backoff_min_secs == 0 {
            bail!("backoff_min_secs must be at least 1");
        }
        if self.backoff_min_secs > self.backoff_max_secs {
            bail!(
                "backoff_min_secs ({}) exceeds backoff_max_secs ({})",
                self.backoff_min_secs,
                self.backoff_max_secs
            );
        }
        Ok(())
    }

    /// The immutable delivery target described by this config.
    pub fn destination(&self) -> Result<IngestionDestination> {
        self.validate()?;
        let dest = IngestionDestination::new(&self.ingest_url, &self.database, &self.table)?
            .with_mapping(self.mapping.as_deref(), self.mapping_kind.as_deref())
            .with_flush_immediately(self.flush_immediately)
            .with_proxy(self.proxy_url.as_deref())?;
        Ok(dest)
    }

    /// Retry delays in seconds; the attempt ceiling is fixed.
    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::from_secs(self.backoff_min_secs, self.backoff_max_secs)
    }

    pub fn credentials(&self) -> Credentials {
        match self.auth.access_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Credentials::AccessToken(token.to_string()),
            _ => Credentials::Anonymous,
        }
    }

    /// Copy with secrets replaced, for display.
    pub fn redacted(&self) -> Self {
        let mut cfg = self.clone();
        if cfg.auth.access_token.is_some() {
            cfg.auth.access_token = Some("<redacted>".to_string());
        }
        cfg
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rollship")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ShipConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ShipConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

/// Load configuration from an explicit path.
pub fn load_from(path: &Path) -> Result<ShipConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: ShipConfig =
        toml::from_str(&data).with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(cfg)
}
