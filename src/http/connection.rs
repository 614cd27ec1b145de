use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, BufReader};
use tracing::{debug, info};

use crate::error::ServerError;
use crate::error_page;
use crate::handler::Handler;
use crate::http::parser::{ParseError, parse_http_request};
use crate::http::request::Request;
use crate::http::response::{Response, Sink};
use crate::server::ServerContext;
use crate::static_files;

/// Upper bound for the request line plus headers.
pub const MAX_HEAD_SIZE: usize = 64 * 1024;

/// One client connection: exactly one request, one response, then close.
pub struct Connection<S> {
    stream: S,
    ctx: Arc<ServerContext>,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    pub fn new(stream: S, ctx: Arc<ServerContext>) -> Self {
        Self { stream, ctx }
    }

    /// Runs the pipeline to completion. Failures never escape: they are
    /// reported to the client, and the connection is closed either way.
    pub async fn run(self) {
        let ctx = &*self.ctx;
        let (read_half, write_half) = tokio::io::split(self.stream);
        let mut reader = BufReader::new(read_half);
        let mut response = Response::new(Box::new(write_half) as Sink);

        let mut host = None;
        let result = match read_request(&mut reader).await {
            Ok(request) => {
                info!(
                    method = %request.method,
                    path = %request.path,
                    host = %request.host,
                    "Request received"
                );
                host = ctx.config.host(&request.host);
                process(&request, &mut response, ctx).await
            }
            Err(e) => Err(e),
        };

        if let Err(err) = result {
            error_page::translate(&err, host, &ctx.config, &mut response).await;
        }

        if let Err(e) = response.close().await {
            debug!(error = %e, "Failed to close connection");
        }
    }
}

/// Reads and parses one request head.
pub async fn read_request<R>(reader: &mut R) -> Result<Request, ServerError>
where
    R: AsyncBufRead + Unpin,
{
    let head = read_head(reader).await?;
    Ok(parse_http_request(&head)?)
}

async fn read_head<R>(reader: &mut R) -> Result<Vec<u8>, ServerError>
where
    R: AsyncBufRead + Unpin,
{
    let mut head = Vec::with_capacity(1024);

    loop {
        let start = head.len();
        let budget = (MAX_HEAD_SIZE + 1 - start) as u64;
        let n = (&mut *reader).take(budget).read_until(b'\n', &mut head).await?;

        if head.len() > MAX_HEAD_SIZE {
            return Err(ParseError::TooLarge(MAX_HEAD_SIZE).into());
        }

        // Client closed before the blank line
        if n == 0 {
            break;
        }

        let line = &head[start..];
        if line == b"\r\n" || line == b"\n" {
            break;
        }
    }

    Ok(head)
}

/// Resolves the host and routes the request to a handler or the file system.
///
/// A handler match wins over everything else, including the forbidden rules.
pub async fn process(request: &Request, response: &mut Response, ctx: &ServerContext) -> Result<(), ServerError> {
    let host = ctx
        .config
        .host(&request.host)
        .ok_or_else(|| ServerError::UnconfiguredHost(request.host.clone()))?;

    if let Some(handler) = ctx.handlers.lookup(&request.path) {
        debug!(path = %request.path, "Dispatching to handler");
        return invoke(handler.as_ref(), request, response).await;
    }

    let target = ctx.security.resolve_target(host, &request.path).await?;
    static_files::serve(host, &request.path, &target, response).await
}

async fn invoke(handler: &dyn Handler, request: &Request, response: &mut Response) -> Result<(), ServerError> {
    match AssertUnwindSafe(handler.handle(request, response))
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ServerError::HandlerFailure(format!("{:#}", e))),
        Err(_) => Err(ServerError::HandlerFailure("handler panicked".to_string())),
    }
}
