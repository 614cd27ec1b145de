//! HTTP protocol implementation.
//!
//! One request and one response per connection; there is no keep-alive.
//!
//! # Architecture
//!
//! - **`connection`**: runs the per-connection pipeline and translates failures
//! - **`parser`**: parses the request head into a [`Request`](request::Request)
//! - **`request`**: HTTP request representation and parsing utilities
//! - **`response`**: the live response and its header-commit state machine
//! - **`writer`**: serializes the response head
//! - **`mime`**: content type detection based on file suffixes
//!
//! # Connection pipeline
//!
//! ```text
//!   read head ──▶ parse ──▶ resolve host ──▶ handler? ──yes──▶ Handler
//!                                              │
//!                                              no
//!                                              ▼
//!                                        security gate ──▶ static files
//!
//!   any failure ──▶ error page ──▶ close
//! ```

pub mod connection;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
