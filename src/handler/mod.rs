//! Pluggable request handlers.
//!
//! Handlers are bound to exact, normalized paths when the server starts and
//! the resulting [`HandlerRegistry`] is read-only afterwards. A matched
//! handler is trusted: the static security rules are not evaluated for it.

pub mod hello;
pub mod time;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::HandlerConfig;
use crate::http::request::Request;
use crate::http::response::Response;

pub use hello::HelloHandler;
pub use time::TimeHandler;

/// A request processing unit bound to one or more paths.
///
/// Implementations write straight into the live response. Returning an error
/// (or panicking) turns into a 500 for the client.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, request: &Request, response: &mut Response) -> anyhow::Result<()>;
}

/// Builds a handler instance.
pub type HandlerFactory = fn() -> Arc<dyn Handler>;

/// Maps the `className` identifiers used in configuration to factories.
#[derive(Clone, Default)]
pub struct HandlerFactories {
    factories: HashMap<String, HandlerFactory>,
}

impl HandlerFactories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factories for the handlers shipped with the server.
    pub fn builtin() -> Self {
        let mut factories = Self::new();
        for id in ["time", "TimeServlet", "com.example.servlet.TimeServlet"] {
            factories.register(id, time_handler);
        }
        for id in ["hello", "HelloServlet", "com.example.servlet.HelloServlet"] {
            factories.register(id, hello_handler);
        }
        factories
    }

    pub fn register(&mut self, id: impl Into<String>, factory: HandlerFactory) {
        self.factories.insert(id.into(), factory);
    }

    pub fn get(&self, id: &str) -> Option<HandlerFactory> {
        self.factories.get(id).copied()
    }
}

fn time_handler() -> Arc<dyn Handler> {
    Arc::new(TimeHandler)
}

fn hello_handler() -> Arc<dyn Handler> {
    Arc::new(HelloHandler)
}

/// Exact-path handler lookup.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    routes: HashMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiates every configured handler.
    ///
    /// An identifier with no factory is a configuration error.
    pub fn from_config(configs: &[HandlerConfig], factories: &HandlerFactories) -> anyhow::Result<Self> {
        let mut registry = Self::new();

        for config in configs {
            let factory = factories.get(&config.class_name).ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown handler {:?} for {}",
                    config.class_name,
                    config.name
                )
            })?;

            let handler = factory();
            for pattern in &config.url_patterns {
                info!(
                    handler = %config.name,
                    pattern = normalize_pattern(pattern),
                    "Adding handler mapping"
                );
                registry.register(pattern, Arc::clone(&handler));
            }
        }

        Ok(registry)
    }

    pub fn register(&mut self, pattern: &str, handler: Arc<dyn Handler>) {
        self.routes.insert(normalize_pattern(pattern).to_string(), handler);
    }

    /// Finds the handler bound to a request path, if any.
    pub fn lookup(&self, path: &str) -> Option<&Arc<dyn Handler>> {
        self.routes.get(route_key(path))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}

/// Registration key: one leading slash and one trailing slash removed.
///
/// ```
/// # use vesta::handler::normalize_pattern;
/// assert_eq!(normalize_pattern("/time"), "time");
/// assert_eq!(normalize_pattern("/time/"), "time");
/// assert_eq!(normalize_pattern("time"), "time");
/// ```
pub fn normalize_pattern(pattern: &str) -> &str {
    let pattern = pattern.strip_prefix('/').unwrap_or(pattern);
    pattern.strip_suffix('/').unwrap_or(pattern)
}

/// Lookup key for a request path: one leading slash and any query removed.
///
/// A trailing slash is kept, so `/time/` does not reach a handler bound to
/// `time`.
pub fn route_key(path: &str) -> &str {
    let path = path.strip_prefix('/').unwrap_or(path);
    path.split('?').next().unwrap_or(path)
}
