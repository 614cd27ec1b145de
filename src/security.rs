//! Path security for static routes.
//!
//! Requests that reach the static file resolver go through two gates: the
//! configured forbidden rules, then containment of the resolved path inside
//! the host's document root. Handler routes never pass through here.

use std::io;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use regex::Regex;
use tracing::warn;

use crate::config::{HostConfig, SecurityConfig};
use crate::error::ServerError;

/// Used when the configuration lists no patterns at all.
pub const DEFAULT_FORBIDDEN_PATTERNS: &[&str] = &[r".*\.exe$", r".*\.sh$", r".*\.bat$", r".*\.cmd$"];

/// Compiled forbidden-path rules.
#[derive(Debug, Clone)]
pub struct SecurityRules {
    patterns: Vec<Regex>,
    extensions: Vec<String>,
    paths: Vec<String>,
}

impl SecurityRules {
    /// Compiles the configured rules. Patterns must match the whole path.
    pub fn from_config(config: &SecurityConfig) -> anyhow::Result<Self> {
        let sources: Vec<&str> = if config.forbidden_patterns.is_empty() {
            DEFAULT_FORBIDDEN_PATTERNS.to_vec()
        } else {
            config.forbidden_patterns.iter().map(String::as_str).collect()
        };

        let patterns = sources
            .into_iter()
            .map(|p| {
                Regex::new(&format!("^(?:{})$", p))
                    .with_context(|| format!("Invalid forbidden pattern {:?}", p))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            patterns,
            extensions: config.forbidden_extensions.clone(),
            paths: config.forbidden_paths.clone(),
        })
    }

    pub fn is_forbidden(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(path))
            || self.extensions.iter().any(|ext| path.ends_with(ext.as_str()))
            || self.paths.iter().any(|p| p == path)
    }

    /// Applies every static-route check and returns the file system target.
    ///
    /// A target that does not exist is not an error here; the static file
    /// resolver turns it into a 404.
    pub async fn resolve_target(&self, host: &HostConfig, path: &str) -> Result<PathBuf, ServerError> {
        if self.is_forbidden(path) {
            return Err(ServerError::Forbidden(path.to_string()));
        }

        let root = normalize(&host.http_root);
        let relative = path.strip_prefix('/').unwrap_or(path);
        let target = normalize(&root.join(relative));

        if !target.starts_with(&root) {
            warn!(host = %host.name, path, "Directory traversal attempt detected");
            return Err(ServerError::Forbidden(path.to_string()));
        }

        if !symlink_contained(&root, &target).await {
            warn!(host = %host.name, path, "Symbolic link escapes document root");
            return Err(ServerError::Forbidden(path.to_string()));
        }

        let lexical = target.to_string_lossy();
        if lexical.contains("..") || lexical.contains('~') {
            return Err(ServerError::Forbidden(path.to_string()));
        }

        if !readable_or_missing(&target).await {
            return Err(ServerError::Forbidden(path.to_string()));
        }

        Ok(target)
    }
}

/// Lexically resolves `.` and `..` without touching the file system.
///
/// Leading `..` components of a relative path are kept.
///
/// ```
/// # use std::path::{Path, PathBuf};
/// # use vesta::security::normalize;
/// assert_eq!(normalize(Path::new("www/a/./b/../c")), PathBuf::from("www/a/c"));
/// assert_eq!(normalize(Path::new("www/../../etc")), PathBuf::from("../etc"));
/// ```
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    out.iter().collect()
}

async fn symlink_contained(root: &Path, target: &Path) -> bool {
    let is_link = match tokio::fs::symlink_metadata(target).await {
        Ok(meta) => meta.file_type().is_symlink(),
        Err(_) => return true,
    };
    if !is_link {
        return true;
    }

    let real_root = match tokio::fs::canonicalize(root).await {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "Failed to resolve document root");
            return false;
        }
    };

    match tokio::fs::canonicalize(target).await {
        Ok(real) => real.starts_with(&real_root),
        Err(e) => {
            warn!(error = %e, "Failed to resolve symbolic link");
            false
        }
    }
}

/// False only when the target exists but cannot be read.
async fn readable_or_missing(target: &Path) -> bool {
    let meta = match tokio::fs::metadata(target).await {
        Ok(meta) => meta,
        Err(e) => return e.kind() != io::ErrorKind::PermissionDenied,
    };

    let probe = if meta.is_dir() {
        tokio::fs::read_dir(target).await.map(|_| ())
    } else {
        tokio::fs::File::open(target).await.map(|_| ())
    };

    match probe {
        Ok(()) => true,
        Err(e) => e.kind() != io::ErrorKind::PermissionDenied,
    }
}
