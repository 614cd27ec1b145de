//! Server configuration.
//!
//! Loaded once at startup from a YAML document (plain JSON works too) and
//! shared read-only by every connection afterwards.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::error::StatusError;

pub const DEFAULT_CONFIG_PATH: &str = "server-config.yaml";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_WELCOME_FILE: &str = "index.html";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Informational only; unknown hosts are never mapped onto it.
    #[serde(default)]
    pub default_host: Option<String>,
    #[serde(default)]
    pub hosts: Vec<HostConfig>,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub error_pages: ErrorPages,
    #[serde(default, alias = "handlers")]
    pub servlets: Vec<HandlerConfig>,
    /// Number of connections served concurrently.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfig {
    pub name: String,
    pub http_root: PathBuf,
    #[serde(default = "default_welcome_file")]
    pub welcome_file: String,
    #[serde(default)]
    pub error_pages: Option<ErrorPages>,
}

/// Error page locations, relative to a host's document root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ErrorPages {
    pub not_found: String,
    pub forbidden: String,
    pub internal_error: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityConfig {
    pub forbidden_patterns: Vec<String>,
    pub forbidden_extensions: Vec<String>,
    pub forbidden_paths: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerConfig {
    pub name: String,
    pub class_name: String,
    #[serde(default)]
    pub url_patterns: Vec<String>,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_welcome_file() -> String {
    DEFAULT_WELCOME_FILE.to_string()
}

impl Default for ErrorPages {
    fn default() -> Self {
        Self {
            not_found: "error/404.html".to_string(),
            forbidden: "error/403.html".to_string(),
            internal_error: "error/500.html".to_string(),
        }
    }
}

impl ErrorPages {
    pub fn for_status(&self, status: StatusError) -> Option<&str> {
        match status {
            StatusError::NotFound => Some(&self.not_found),
            StatusError::Forbidden => Some(&self.forbidden),
            StatusError::InternalServerError => Some(&self.internal_error),
            StatusError::BadRequest => None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            default_host: None,
            hosts: Vec::new(),
            security: SecurityConfig::default(),
            error_pages: ErrorPages::default(),
            servlets: Vec::new(),
            workers: DEFAULT_WORKERS,
        }
    }
}

impl Config {
    /// Loads the file named by `VESTA_CONFIG`, or `server-config.yaml`.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("VESTA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::from_file(path)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration {}", path.display()))?;
        Self::from_yaml_str(&raw)
            .with_context(|| format!("Failed to load configuration {}", path.display()))
    }

    pub fn from_yaml_str(raw: &str) -> anyhow::Result<Self> {
        let config: Config = serde_yaml::from_str(raw)?;
        Ok(config)
    }

    /// Address to bind. The `LISTEN` environment variable takes precedence.
    pub fn listen_addr(&self) -> String {
        std::env::var("LISTEN").unwrap_or_else(|_| format!("0.0.0.0:{}", self.port))
    }

    /// Exact, case-sensitive host lookup.
    pub fn host(&self, name: &str) -> Option<&HostConfig> {
        self.hosts.iter().find(|h| h.name == name)
    }

    pub fn is_host_configured(&self, name: &str) -> bool {
        self.host(name).is_some()
    }

    /// Custom error page for `status` on `host`, resolved under its document root.
    ///
    /// Hosts without their own `errorPages` use the top-level ones.
    pub fn error_page(&self, host: &HostConfig, status: StatusError) -> Option<PathBuf> {
        let pages = host.error_pages.as_ref().unwrap_or(&self.error_pages);
        pages
            .for_status(status)
            .map(|relative| host.http_root.join(relative))
    }
}

impl HostConfig {
    pub fn welcome_path(&self) -> PathBuf {
        self.http_root.join(&self.welcome_file)
    }
}
