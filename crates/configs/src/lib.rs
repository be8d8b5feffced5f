use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Echo backend error text in 500 bodies.
    #[serde(default = "default_expose_error_details")]
    pub expose_error_details: bool,
    /// Tokio worker threads; `None` lets tokio pick one per core.
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            expose_error_details: default_expose_error_details(),
            worker_threads: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    DynamoDb,
    Memory,
    File,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dynamodb" => Ok(Self::DynamoDb),
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File),
            other => Err(anyhow!("unknown store backend `{other}` (expected dynamodb, memory or file)")),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default = "default_table_name")]
    pub table_name: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Endpoint override, e.g. `http://localhost:8000` for DynamoDB Local.
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default = "default_file_path")]
    pub file_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            table_name: default_table_name(),
            region: default_region(),
            endpoint_url: None,
            file_path: default_file_path(),
        }
    }
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 3000 }
fn default_expose_error_details() -> bool { true }
fn default_table_name() -> String { "ItemsTable".into() }
fn default_region() -> String { "us-east-1".into() }
fn default_file_path() -> String { "data/items.json".into() }

/// Load `CONFIG_PATH` (default `config.toml`) if present, overlay the process
/// environment and validate.
pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_from(&path, |key| std::env::var(key).ok())
}

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Same as [`load_default`] with an explicit file and variable lookup.
/// A missing file means built-in defaults.
pub fn load_from<F>(path: &str, lookup: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = if std::path::Path::new(path).exists() {
        load_from_file(path)?
    } else {
        AppConfig::default()
    };
    cfg.apply_env(lookup)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    let cfg: AppConfig = toml::from_str(&content).with_context(|| format!("parsing {path}"))?;
    Ok(cfg)
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| anyhow!("{key}={raw:?} is invalid: {e}"))
}

impl AppConfig {
    /// Overlay environment variables on top of file/default values.
    ///
    /// `lookup` is `std::env::var` in production; tests pass a map.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("PORT") {
            self.server.port = parse_var("PORT", &v)?;
        }
        if let Some(v) = lookup("EXPOSE_ERROR_DETAILS") {
            self.server.expose_error_details = parse_var("EXPOSE_ERROR_DETAILS", &v)?;
        }
        if let Some(v) = lookup("WORKER_THREADS") {
            self.server.worker_threads = Some(parse_var("WORKER_THREADS", &v)?);
        }
        if let Some(v) = lookup("STORE_BACKEND") {
            self.store.backend = v.parse()?;
        }
        if let Some(v) = lookup("TABLE_NAME") {
            self.store.table_name = v;
        }
        if let Some(v) = lookup("AWS_REGION") {
            self.store.region = v;
        }
        if let Some(v) = lookup("DYNAMODB_ENDPOINT") {
            self.store.endpoint_url = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Some(v) = lookup("STORE_FILE") {
            self.store.file_path = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(anyhow!("server.host must not be empty"));
        }
        if self.server.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if self.server.worker_threads == Some(0) {
            return Err(anyhow!("server.worker_threads must be >= 1"));
        }
        if self.store.table_name.trim().is_empty() {
            return Err(anyhow!("store.table_name (TABLE_NAME) must not be empty"));
        }
        if self.store.region.trim().is_empty() {
            return Err(anyhow!("store.region (AWS_REGION) must not be empty"));
        }
        if self.store.backend == BackendKind::File && self.store.file_path.trim().is_empty() {
            return Err(anyhow!("store.file_path (STORE_FILE) is required for the file backend"));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
