//! Core types for the Conjure HTTP router.
//!
//! This crate holds everything the routing and dispatch layers share:
//!
//! - [`Context`] — the per-request bag of parsed inputs and the response
//!   under construction;
//! - [`Values`], [`ValuesList`], [`FileMap`] — typed accessors over the raw
//!   string maps a request carries;
//! - [`Handler`] / [`Middleware`] — the traits the trie stores behind
//!   `Arc<dyn …>`;
//! - [`Outcome`] — the tagged continue/halt result the dispatch pipeline
//!   threads through the chain.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod context;
mod handler;
mod values;

pub use context::{mime_for_path, Context, ResponseParts, CLAIMS_KEY};
pub use handler::{handler_fn, middleware_fn, BoxFuture, Handler, Middleware, Outcome};
pub use values::{FileMap, UploadedFile, ValueError, Values, ValuesList};
