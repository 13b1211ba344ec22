//! Middleware dispatch and builtin middleware for conjure.
//!
//! A middleware chain runs strictly in order against a single mutable
//! [`conjure_core::Context`]; the first halt stops everything after it,
//! including the handler. [`dispatch`] is the one loop that enforces this,
//! shared by the server and by tests that drive routes directly.
//!
//! The only builtin is [`BearerAuth`], which verifies HS256 bearer tokens
//! and deposits their claims in context storage.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bearer;
mod pipeline;

pub use bearer::{issue_token, AuthError, BearerAuth};
pub use pipeline::dispatch;
