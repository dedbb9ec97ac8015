//! TOML configuration file schema and parsing.
//!
//! Example config file:
//!
//! ```toml
//! [server]
//! listen = "0.0.0.0:8080"
//! log_format = "json"
//!
//! [page]
//! host_url = "https://show.example.com"
//! meta_title = "Remotion Showcase Upload"
//! copy_reset_ms = 2000
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use share_core::config::DEFAULT_META_TITLE;
use share_core::PageConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub page: PageSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            log_format: default_log_format(),
        }
    }
}

pub fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_log_format() -> String {
    "pretty".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageSettings {
    #[serde(default = "default_host_url")]
    pub host_url: String,

    #[serde(default = "default_meta_title")]
    pub meta_title: String,

    #[serde(default = "default_copy_reset_ms")]
    pub copy_reset_ms: u64,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            host_url: default_host_url(),
            meta_title: default_meta_title(),
            copy_reset_ms: default_copy_reset_ms(),
        }
    }
}

fn default_host_url() -> String {
    "http://localhost:8080".into()
}

fn default_meta_title() -> String {
    DEFAULT_META_TITLE.into()
}

fn default_copy_reset_ms() -> u64 {
    2000
}

impl PageSettings {
    pub fn to_page_config(&self) -> PageConfig {
        PageConfig::default()
            .with_host_url(&self.host_url)
            .with_meta_title(&self.meta_title)
            .with_copy_reset(self.copy_reset_ms)
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: AppConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_host_url(&self.page.host_url)?;

        if self.page.meta_title.trim().is_empty() {
            return Err(ConfigError::Invalid("meta_title must not be empty".into()));
        }

        match self.server.log_format.as_str() {
            "pretty" | "json" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "Invalid log_format '{}': must be 'pretty' or 'json'",
                    other
                )));
            }
        }

        Ok(())
    }
}

/// Share links are only useful if they point at an http(s) origin.
pub fn validate_host_url(raw: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| ConfigError::Invalid(format!("Invalid host_url: {} ({})", raw, e)))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::Invalid(format!(
            "host_url must use http or https: {}",
            raw
        )));
    }
    Ok(())
}
