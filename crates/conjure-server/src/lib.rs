//! Hyper/tokio transport binding for conjure.
//!
//! This crate turns the pure routing and dispatch layers into a running
//! HTTP server: it owns the listener and connection tasks, assembles one
//! [`conjure_core::Context`] per request from the raw transport data, runs
//! the matched middleware chain and handler, and writes the context's
//! response back to the wire. It also provides the static file handlers
//! that back directory mounts and single-file routes, plus graceful
//! shutdown with connection draining.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assemble;
mod config;
mod server;
mod shutdown;
mod static_files;

pub use config::{
    ServerConfig, ServerConfigBuilder, DEFAULT_HTTP_ADDR, DEFAULT_MAX_UPLOAD_BYTES,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SHUTDOWN_TIMEOUT_SECS,
};
pub use server::{HttpResponse, ResponseBody, Server, ServerError};
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownReceiver, ShutdownSignal};
pub use static_files::{DirFiles, FileRoute};
