//! Connection acceptance and the state shared by every connection.

pub mod listener;

use tokio::sync::Semaphore;
use tracing::info;

use crate::config::Config;
use crate::handler::{HandlerFactories, HandlerRegistry};
use crate::security::SecurityRules;

pub use listener::{Server, ShutdownHandle};

/// Everything a connection needs besides its socket.
///
/// Built and validated before the first connection is accepted, then only
/// ever read.
pub struct ServerContext {
    pub config: Config,
    pub security: SecurityRules,
    pub handlers: HandlerRegistry,
}

impl ServerContext {
    /// Validates `config` against the built-in handlers.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        Self::with_factories(config, &HandlerFactories::builtin())
    }

    pub fn with_factories(config: Config, factories: &HandlerFactories) -> anyhow::Result<Self> {
        anyhow::ensure!(config.workers >= 1, "workers must be at least 1");
        anyhow::ensure!(
            config.workers <= Semaphore::MAX_PERMITS,
            "workers must be at most {}",
            Semaphore::MAX_PERMITS
        );

        let security = SecurityRules::from_config(&config.security)?;
        let handlers = HandlerRegistry::from_config(&config.servlets, factories)?;

        for host in &config.hosts {
            info!(host = %host.name, root = %host.http_root.display(), "Host configured");
        }
        info!(
            hosts = config.hosts.len(),
            handlers = handlers.len(),
            default_host = config.default_host.as_deref().unwrap_or("-"),
            "Configuration loaded"
        );

        Ok(Self {
            config,
            security,
            handlers,
        })
    }
}
