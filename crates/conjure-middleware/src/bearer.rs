//! Builtin bearer-token authentication.
//!
//! [`BearerAuth`] guards a route subtree with HMAC-SHA256 signed tokens. A
//! request passes when its auth header holds exactly `Bearer <token>`, the
//! token's signature verifies against the configured secret, and its `exp`
//! claim has not elapsed. Decoded claims are stored in context storage under
//! [`CLAIMS_KEY`] so downstream middleware and handlers can read them through
//! [`Context::claims`]. Every rejection looks the same to the client; the
//! specific reason is only logged.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use conjure_core::{BoxFuture, Context, Middleware, Outcome, CLAIMS_KEY};
use http::StatusCode;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};
use thiserror::Error;

/// The client-facing text for every authentication failure.
const REJECTION: &str = "missing or invalid bearer token";

/// Errors from token issuance.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The system clock reads before the unix epoch.
    #[error("system clock is before the unix epoch: {0}")]
    Clock(#[from] std::time::SystemTimeError),

    /// Signing the claims failed.
    #[error("token encoding failed: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

/// Middleware that rejects requests without a valid HS256 bearer token.
///
/// # Example
///
/// ```rust
/// use conjure_middleware::BearerAuth;
///
/// let auth = BearerAuth::new("secret");
/// let api_auth = BearerAuth::with_header("secret", "X-Api-Token");
/// ```
pub struct BearerAuth {
    decoding_key: DecodingKey,
    validation: Validation,
    header_name: String,
}

impl BearerAuth {
    /// Guards with `secret`, reading the standard `Authorization` header.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self::with_header(secret, "Authorization")
    }

    /// Guards with `secret`, reading tokens from a custom header.
    #[must_use]
    pub fn with_header(secret: &str, header_name: impl Into<String>) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            header_name: header_name.into(),
        }
    }

    fn verify(&self, ctx: &Context) -> Result<Map<String, Value>, &'static str> {
        let raw = ctx
            .header(&self.header_name)
            .ok_or("auth header missing")?;

        let mut parts = raw.split_whitespace();
        let scheme = parts.next().ok_or("auth header empty")?;
        let token = parts.next().ok_or("auth header has no token")?;
        if parts.next().is_some() {
            return Err("auth header has trailing tokens");
        }
        if scheme != "Bearer" {
            return Err("auth scheme is not Bearer");
        }

        let data = jsonwebtoken::decode::<Map<String, Value>>(
            token,
            &self.decoding_key,
            &self.validation,
        )
        .map_err(|_| "token failed verification")?;
        Ok(data.claims)
    }
}

impl Middleware for BearerAuth {
    fn name(&self) -> &'static str {
        "bearer-auth"
    }

    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, Outcome> {
        let outcome = match self.verify(ctx) {
            Ok(claims) => {
                ctx.set_storage(CLAIMS_KEY, Value::Object(claims));
                Outcome::Continue
            }
            Err(reason) => {
                tracing::debug!(reason, "bearer auth rejected request");
                ctx.set_status(StatusCode::UNAUTHORIZED);
                ctx.send_error_message(REJECTION)
            }
        };
        Box::pin(async move { outcome })
    }
}

/// Signs `claims` with `secret`, stamping an `exp` claim `ttl` from now.
///
/// Any `exp` already present in `claims` is overwritten.
pub fn issue_token(
    mut claims: Map<String, Value>,
    secret: &str,
    ttl: Duration,
) -> Result<String, AuthError> {
    let expires_at = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() + ttl.as_secs();
    claims.insert("exp".to_string(), Value::from(expires_at));

    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}
