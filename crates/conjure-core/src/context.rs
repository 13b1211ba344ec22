//! The per-request [`Context`].
//!
//! One `Context` is assembled per inbound request, owned exclusively by the
//! task dispatching that request, and discarded after the handler returns.
//! It carries every parsed view of the transport data (path parameters,
//! query/form/multipart fields, uploaded files, headers, raw body) plus a
//! free-form storage map that middleware use to pass derived data forward,
//! and the response under construction.
//!
//! # Example
//!
//! ```rust
//! use conjure_core::Context;
//! use http::Method;
//!
//! let mut ctx = Context::new(Method::GET, "/users/42");
//! ctx.send_string("hello");
//! let response = ctx.into_response();
//! assert_eq!(response.status(), http::StatusCode::OK);
//! ```

use crate::handler::Outcome;
use crate::values::{FileMap, Values, ValuesList};
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Method, Response, StatusCode};
use http_body_util::Full;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Storage key under which the bearer middleware deposits decoded claims.
pub const CLAIMS_KEY: &str = "claims";

/// The response a handler builds up while processing a request.
#[derive(Debug)]
pub struct ResponseParts {
    /// Response status, `200 OK` unless a step overrides it.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl Default for ResponseParts {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

/// The per-request bag of parsed inputs and response-writing helpers.
pub struct Context {
    method: Method,
    path: String,
    params: Values,
    query: ValuesList,
    form: ValuesList,
    multipart: ValuesList,
    files: FileMap,
    headers: ValuesList,
    body: String,
    storage: HashMap<String, serde_json::Value>,
    response: ResponseParts,
}

impl Context {
    /// Creates an empty context for `method` and `path`.
    ///
    /// The transport views (query, form, headers, body) are populated by the
    /// server during request assembly; tests construct contexts directly and
    /// fill in only what they need.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Values::new(),
            query: ValuesList::new(),
            form: ValuesList::new(),
            multipart: ValuesList::new(),
            files: FileMap::new(),
            headers: ValuesList::new(),
            body: String::new(),
            storage: HashMap::new(),
            response: ResponseParts::default(),
        }
    }

    /// The request method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The request path, as received.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Extracted path parameters.
    #[must_use]
    pub fn params(&self) -> &Values {
        &self.params
    }

    /// Parsed query string parameters.
    #[must_use]
    pub fn query(&self) -> &ValuesList {
        &self.query
    }

    /// Parsed `application/x-www-form-urlencoded` body fields.
    #[must_use]
    pub fn form(&self) -> &ValuesList {
        &self.form
    }

    /// Parsed non-file multipart fields.
    #[must_use]
    pub fn multipart(&self) -> &ValuesList {
        &self.multipart
    }

    /// Files uploaded through a multipart form.
    #[must_use]
    pub fn files(&self) -> &FileMap {
        &self.files
    }

    /// Request headers, multi-valued.
    ///
    /// Header names are normalized to lowercase; use [`Context::header`] for
    /// a case-insensitive lookup.
    #[must_use]
    pub fn headers(&self) -> &ValuesList {
        &self.headers
    }

    /// Returns the first value of the named header, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.first())
            .map(String::as_str)
    }

    /// The raw request body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Deserializes the raw body as JSON into a caller type.
    pub fn parse_json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }

    /// Stores a value in the cross-middleware storage map.
    pub fn set_storage(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.storage.insert(key.into(), value);
    }

    /// Reads a value from the cross-middleware storage map.
    #[must_use]
    pub fn storage(&self, key: &str) -> Option<&serde_json::Value> {
        self.storage.get(key)
    }

    /// Claims decoded by the bearer middleware, when present.
    ///
    /// Typed edge over the untyped storage map; `None` until an auth
    /// middleware has run and stored a claim object under [`CLAIMS_KEY`].
    #[must_use]
    pub fn claims(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.storage.get(CLAIMS_KEY).and_then(|v| v.as_object())
    }

    // Assembly setters, called once by the server before dispatch.

    /// Sets the extracted path parameters.
    pub fn set_params(&mut self, params: Values) {
        self.params = params;
    }

    /// Sets the parsed query parameters.
    pub fn set_query(&mut self, query: ValuesList) {
        self.query = query;
    }

    /// Sets the parsed form fields.
    pub fn set_form(&mut self, form: ValuesList) {
        self.form = form;
    }

    /// Sets the parsed multipart fields.
    pub fn set_multipart(&mut self, multipart: ValuesList) {
        self.multipart = multipart;
    }

    /// Sets the uploaded files.
    pub fn set_files(&mut self, files: FileMap) {
        self.files = files;
    }

    /// Sets the request headers.
    pub fn set_headers(&mut self, headers: ValuesList) {
        self.headers = headers;
    }

    /// Sets the raw request body.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    // Response side.

    /// The response under construction.
    #[must_use]
    pub fn response(&self) -> &ResponseParts {
        &self.response
    }

    /// Overrides the response status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.response.status = status;
    }

    /// Sets a response header, replacing any previous value.
    pub fn set_response_header(&mut self, name: header::HeaderName, value: HeaderValue) {
        self.response.headers.insert(name, value);
    }

    /// Writes a raw string body.
    pub fn send_string(&mut self, body: impl Into<String>) {
        self.response.body = Bytes::from(body.into());
    }

    /// Writes a raw byte body.
    pub fn send_bytes(&mut self, body: impl Into<Bytes>) {
        self.response.body = body.into();
    }

    /// Writes `value` as pretty-printed JSON with a JSON content type.
    pub fn send_json<T: Serialize>(&mut self, value: &T) -> serde_json::Result<()> {
        let body = serde_json::to_string_pretty(value)?;
        self.response.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.response.body = Bytes::from(body);
        Ok(())
    }

    /// Writes the error envelope `{"message": "<text>"}` and halts.
    ///
    /// Every structured error sent to clients uses this exact shape; there is
    /// no machine-readable code field.
    pub fn send_error_message(&mut self, message: &str) -> Outcome {
        let envelope = serde_json::json!({ "message": message });
        // The envelope is a flat string map; serialization cannot fail.
        let body = serde_json::to_string_pretty(&envelope).unwrap_or_default();
        self.response.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.response.body = Bytes::from(body);
        Outcome::halt_written()
    }

    /// Serves the file at `path`, inferring the content type from its
    /// extension (`text/plain` when it has none).
    ///
    /// A missing or unreadable file becomes a `404` with the not-found
    /// envelope; the error is returned so callers can log it.
    pub fn send_file(&mut self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let path = path.as_ref();
        match std::fs::read(path) {
            Ok(content) => {
                if let Ok(value) = HeaderValue::from_str(mime_for_path(path)) {
                    self.response.headers.insert(header::CONTENT_TYPE, value);
                }
                self.response.body = Bytes::from(content);
                Ok(())
            }
            Err(e) => {
                self.set_status(StatusCode::NOT_FOUND);
                self.send_error_message("page not found");
                Err(e)
            }
        }
    }

    /// Consumes the context, producing the HTTP response.
    #[must_use]
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let mut builder = Response::builder().status(self.response.status);
        if let Some(headers) = builder.headers_mut() {
            *headers = self.response.headers;
        }
        builder
            .body(Full::new(self.response.body))
            .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("storage_keys", &self.storage.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Maps a file extension to a content type, falling back to `text/plain`.
#[must_use]
pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();

    match extension.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "text/javascript; charset=utf-8",
        "json" | "map" => "application/json",
        "xml" => "application/xml",
        "csv" => "text/csv; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "pdf" => "application/pdf",
        "wasm" => "application/wasm",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        _ => "text/plain; charset=utf-8",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn send_string_sets_body() {
        let mut ctx = Context::new(Method::GET, "/");
        ctx.send_string("hello");
        assert_eq!(&ctx.response().body[..], b"hello");
    }

    #[test]
    fn send_json_is_pretty_with_content_type() {
        let mut ctx = Context::new(Method::GET, "/");
        ctx.send_json(&serde_json::json!({ "ok": true })).unwrap();

        let body = std::str::from_utf8(&ctx.response().body).unwrap();
        assert!(body.contains("\n"), "expected pretty-printed JSON");
        assert!(body.contains("\"ok\": true"));
        assert_eq!(
            ctx.response().headers.get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[test]
    fn send_error_message_writes_envelope_and_halts() {
        let mut ctx = Context::new(Method::GET, "/");
        let outcome = ctx.send_error_message("page not found");

        assert_eq!(outcome, Outcome::halt_written());
        let body: serde_json::Value = serde_json::from_slice(&ctx.response().body).unwrap();
        assert_eq!(body, serde_json::json!({ "message": "page not found" }));
    }

    #[test]
    fn parse_json_round_trip() {
        #[derive(serde::Deserialize)]
        struct Payload {
            name: String,
            count: u32,
        }

        let mut ctx = Context::new(Method::POST, "/");
        ctx.set_body(r#"{"name":"alice","count":3}"#);

        let payload: Payload = ctx.parse_json().unwrap();
        assert_eq!(payload.name, "alice");
        assert_eq!(payload.count, 3);
    }

    #[test]
    fn parse_json_invalid_body() {
        let mut ctx = Context::new(Method::POST, "/");
        ctx.set_body("not json");
        assert!(ctx.parse_json::<serde_json::Value>().is_err());
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let mut headers = ValuesList::new();
        headers.append("authorization", "Bearer abc");

        let mut ctx = Context::new(Method::GET, "/");
        ctx.set_headers(headers);

        assert_eq!(ctx.header("Authorization"), Some("Bearer abc"));
        assert_eq!(ctx.header("AUTHORIZATION"), Some("Bearer abc"));
        assert_eq!(ctx.header("x-missing"), None);
    }

    #[test]
    fn storage_and_claims_accessor() {
        let mut ctx = Context::new(Method::GET, "/");
        assert!(ctx.claims().is_none());

        ctx.set_storage(CLAIMS_KEY, serde_json::json!({ "sub": "u1" }));
        let claims = ctx.claims().unwrap();
        assert_eq!(claims.get("sub").unwrap(), "u1");
    }

    #[test]
    fn send_file_infers_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"<html></html>").unwrap();

        let mut ctx = Context::new(Method::GET, "/page.html");
        ctx.send_file(&path).unwrap();

        assert_eq!(&ctx.response().body[..], b"<html></html>");
        assert_eq!(
            ctx.response().headers.get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
    }

    #[test]
    fn send_file_missing_becomes_not_found_envelope() {
        let mut ctx = Context::new(Method::GET, "/nope");
        assert!(ctx.send_file("/definitely/not/here").is_err());

        assert_eq!(ctx.response().status, StatusCode::NOT_FOUND);
        let body: serde_json::Value = serde_json::from_slice(&ctx.response().body).unwrap();
        assert_eq!(body["message"], "page not found");
    }

    #[test]
    fn mime_fallback_without_extension() {
        assert_eq!(
            mime_for_path(Path::new("README")),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn into_response_carries_status_and_body() {
        let mut ctx = Context::new(Method::GET, "/");
        ctx.set_status(StatusCode::CREATED);
        ctx.send_string("done");

        let response = ctx.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
