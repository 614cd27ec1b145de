//! The live response of a single connection.
//!
//! A [`Response`] wraps the connection's output sink and moves through three
//! states:
//!
//! ```text
//!   Open ──first body access──▶ Committed ──close──▶ Closed
//!     └──────────────close (flushes default head)──────▲
//! ```
//!
//! While `Open`, status, content type and headers can be changed freely.
//! The first write to the body serializes the head exactly once; after that
//! those setters no longer reach the wire.

use std::io;
use std::time::SystemTime;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use crate::http::writer::serialize_head;

/// Type-erased output sink used by the server.
pub type Sink = Box<dyn AsyncWrite + Send + Unpin>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseState {
    Open,
    Committed,
    Closed,
}

/// Ordered header list. Setting an existing name replaces the value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a header. Names compare case-insensitively.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn as_slice(&self) -> &[(String, String)] {
        &self.entries
    }
}

/// A one-shot HTTP response over an output sink.
pub struct Response<W = Sink> {
    sink: W,
    status: u16,
    reason: String,
    content_type: Option<String>,
    headers: Headers,
    state: ResponseState,
}

impl<W: AsyncWrite + Unpin> Response<W> {
    /// Creates an open response defaulting to `200 OK`.
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            status: 200,
            reason: "OK".to_string(),
            content_type: None,
            headers: Headers::new(),
            state: ResponseState::Open,
        }
    }

    pub fn set_status(&mut self, status: u16, reason: impl Into<String>) {
        if self.state != ResponseState::Open {
            tracing::trace!(status, "status change after commit ignored");
            return;
        }
        self.status = status;
        self.reason = reason.into();
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        if self.state != ResponseState::Open {
            tracing::trace!("content type change after commit ignored");
            return;
        }
        self.content_type = Some(content_type.into());
    }

    /// Adds or replaces a custom header.
    ///
    /// `Content-Type` is routed to [`set_content_type`](Self::set_content_type)
    /// so it is emitted exactly once, ahead of `Date`.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if name.eq_ignore_ascii_case("content-type") {
            self.set_content_type(value);
            return;
        }
        if self.state != ResponseState::Open {
            tracing::trace!(header = %name, "header change after commit ignored");
            return;
        }
        self.headers.set(name, value);
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn state(&self) -> ResponseState {
        self.state
    }

    /// Whether the head has already gone out on the wire.
    pub fn is_committed(&self) -> bool {
        self.state != ResponseState::Open
    }

    /// Writes body bytes, committing the head first if needed.
    pub async fn write(&mut self, body: &[u8]) -> io::Result<()> {
        self.commit().await?;
        self.sink.write_all(body).await
    }

    pub async fn write_str(&mut self, body: &str) -> io::Result<()> {
        self.write(body.as_bytes()).await
    }

    /// Raw access to the body stream, committing the head first if needed.
    pub async fn body(&mut self) -> io::Result<&mut W> {
        self.commit().await?;
        Ok(&mut self.sink)
    }

    /// Streams everything from `reader` into the body.
    pub async fn copy_from<R>(&mut self, reader: &mut R) -> io::Result<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let sink = self.body().await?;
        tokio::io::copy(reader, sink).await
    }

    /// Flushes the head if nothing was written yet, then closes the sink.
    ///
    /// Closing twice is a no-op.
    pub async fn close(&mut self) -> io::Result<()> {
        if self.state == ResponseState::Closed {
            return Ok(());
        }
        self.commit().await?;
        self.state = ResponseState::Closed;
        self.sink.flush().await?;
        self.sink.shutdown().await
    }

    /// Gives back the sink, whatever state the response is in.
    pub fn into_inner(self) -> W {
        self.sink
    }

    async fn commit(&mut self) -> io::Result<()> {
        match self.state {
            ResponseState::Open => {
                let head = serialize_head(
                    self.status,
                    &self.reason,
                    self.content_type.as_deref(),
                    SystemTime::now(),
                    self.headers.as_slice(),
                );
                // Committed before the write: a failed head write must not be retried
                self.state = ResponseState::Committed;
                self.sink.write_all(&head).await
            }
            ResponseState::Committed => Ok(()),
            ResponseState::Closed => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "response already closed",
            )),
        }
    }
}
