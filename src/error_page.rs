//! Turns pipeline failures into error responses.
//!
//! Nothing in here propagates: whatever goes wrong while reporting an error
//! is logged and downgraded to the built-in 500 page.

use std::io;
use std::path::Path;

use tokio::fs::File;
use tokio::io::AsyncWrite;
use tracing::{error, info, warn};

use crate::config::{Config, HostConfig};
use crate::error::{ServerError, StatusError};
use crate::http::response::Response;
use crate::pages;
use crate::static_files;

const ERROR_CONTENT_TYPE: &str = "text/html";

/// Reports `err` on `response`.
///
/// `host` is the configured host of the request, when it got that far; only
/// then can a custom error page be used.
pub async fn translate<W>(err: &ServerError, host: Option<&HostConfig>, config: &Config, response: &mut Response<W>)
where
    W: AsyncWrite + Unpin,
{
    let status = err.status();

    if status == StatusError::InternalServerError {
        error!(status = status.code(), error = %err, "Request failed");
    } else {
        info!(status = status.code(), error = %err, "Request rejected");
    }

    if response.is_committed() {
        warn!(error = %err, "Response already committed, error page suppressed");
        return;
    }

    let custom = host.and_then(|h| config.error_page(h, status));

    let sent = match custom {
        Some(page) => send_custom_page(status, &page, response).await,
        None => Ok(false),
    };

    match sent {
        Ok(true) => {}
        Ok(false) => send_default_page(status, &err.public_detail(), response).await,
        Err(e) => {
            warn!(error = %e, "Failed to send custom error page");
            let fallback = StatusError::InternalServerError;
            send_default_page(fallback, fallback.message(), response).await;
        }
    }
}

/// `Ok(false)` when the page does not exist.
async fn send_custom_page<W>(status: StatusError, page: &Path, response: &mut Response<W>) -> io::Result<bool>
where
    W: AsyncWrite + Unpin,
{
    let mut file = match File::open(page).await {
        Ok(file) => file,
        Err(e) if static_files::is_missing(&e) => return Ok(false),
        Err(e) => return Err(e),
    };

    if !file.metadata().await?.is_file() {
        return Ok(false);
    }

    info!(page = %page.display(), "Sending custom error page");
    response.set_status(status.code(), status.message());
    response.set_content_type(ERROR_CONTENT_TYPE);
    response.copy_from(&mut file).await?;
    Ok(true)
}

async fn send_default_page<W>(status: StatusError, detail: &str, response: &mut Response<W>)
where
    W: AsyncWrite + Unpin,
{
    if response.is_committed() {
        return;
    }

    response.set_status(status.code(), status.message());
    response.set_content_type(ERROR_CONTENT_TYPE);
    if let Err(e) = response.write_str(&pages::error_page(status, detail)).await {
        warn!(error = %e, "Failed to send error page");
    }
}
