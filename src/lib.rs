//! Vesta - Multi-host HTTP server
//!
//! Core library for request parsing, virtual host resolution, handler
//! dispatch and static file serving.

pub mod config;
pub mod error;
pub mod error_page;
pub mod handler;
pub mod http;
pub mod pages;
pub mod security;
pub mod server;
pub mod static_files;
