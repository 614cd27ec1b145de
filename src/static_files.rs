//! Static file serving from a host's document root.

use std::io;
use std::path::Path;

use tokio::fs::File;
use tokio::io::AsyncWrite;
use tracing::{debug, info};

use crate::config::HostConfig;
use crate::error::ServerError;
use crate::http::mime::{HTML_UTF8, content_type_for};
use crate::http::response::Response;
use crate::pages;

/// Serves `target`, which the security gate has already vetted.
///
/// Directories get the host's welcome file, generated on first use; regular
/// files are streamed verbatim; anything else is a 404.
pub async fn serve<W>(host: &HostConfig, path: &str, target: &Path, response: &mut Response<W>) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    let meta = match tokio::fs::metadata(target).await {
        Ok(meta) => meta,
        Err(e) if is_missing(&e) => return Err(ServerError::NotFound(path.to_string())),
        Err(e) => return Err(e.into()),
    };

    if meta.is_dir() {
        return serve_welcome_file(host, response).await;
    }

    if !meta.is_file() {
        return Err(ServerError::NotFound(path.to_string()));
    }

    let mut file = File::open(target).await?;
    response.set_content_type(content_type_for(target));
    let sent = response.copy_from(&mut file).await?;
    debug!(path, bytes = sent, "Static file sent");
    Ok(())
}

async fn serve_welcome_file<W>(host: &HostConfig, response: &mut Response<W>) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    let welcome = host.welcome_path();
    ensure_default_resource(&welcome, || pages::welcome_page(&host.name)).await?;

    // Checked before the head goes out; a directory opens fine but fails mid-copy
    if !tokio::fs::metadata(&welcome).await?.is_file() {
        return Err(ServerError::NotFound(welcome.display().to_string()));
    }

    let mut file = File::open(&welcome).await?;
    response.set_content_type(HTML_UTF8);
    response.copy_from(&mut file).await?;
    Ok(())
}

/// True for lookups that fail because the path does not exist, including
/// paths that run through a regular file.
pub(crate) fn is_missing(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory)
}

/// Writes `contents()` to `path` unless the file already exists.
///
/// There is no locking: two requests missing the file at the same time may
/// both write it, and the last write wins. Callers must only use generators
/// whose output is stable so that either write is fine.
pub async fn ensure_default_resource<F>(path: &Path, contents: F) -> io::Result<bool>
where
    F: FnOnce() -> String,
{
    if tokio::fs::try_exists(path).await? {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents()).await?;
    info!(path = %path.display(), "Generated default resource");
    Ok(true)
}
