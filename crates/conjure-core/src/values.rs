//! Typed accessors over the raw string maps a request carries.
//!
//! Path parameters arrive as a single-valued map ([`Values`]); query
//! parameters, form fields, multipart fields, and headers are multi-valued
//! ([`ValuesList`]); uploaded files live in a [`FileMap`]. All three expose
//! typed parse helpers so handlers do not have to repeat `str::parse`
//! plumbing at every call site.
//!
//! # Example
//!
//! ```rust
//! use conjure_core::Values;
//!
//! let mut params = Values::new();
//! params.insert("id", "42");
//!
//! assert_eq!(params.parse_int("id").unwrap(), 42);
//! assert!(params.parse_int("missing").is_err());
//! ```

use bytes::Bytes;
use std::collections::HashMap;
use thiserror::Error;

/// Errors produced by the typed value accessors.
#[derive(Debug, Error)]
pub enum ValueError {
    /// The key has no value in the map.
    #[error("no value for key `{0}`")]
    Missing(String),

    /// The value could not be parsed as an integer.
    #[error("invalid integer: {0}")]
    Int(#[from] std::num::ParseIntError),

    /// The value could not be parsed as a float.
    #[error("invalid float: {0}")]
    Float(#[from] std::num::ParseFloatError),

    /// The value could not be parsed as a boolean.
    #[error("invalid boolean: {0}")]
    Bool(#[from] std::str::ParseBoolError),
}

/// A single-valued string map, used for extracted path parameters.
///
/// An absent key parses as the empty string, so the numeric helpers fail
/// with a parse error while [`Values::parse_str`] yields `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Values(HashMap<String, String>);

impl Values {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key/value pair, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Returns the raw value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns true if the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn raw(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    /// Parses the value for `key` as a signed integer.
    pub fn parse_int(&self, key: &str) -> Result<i64, ValueError> {
        Ok(self.raw(key).parse()?)
    }

    /// Parses the value for `key` as an unsigned integer.
    pub fn parse_uint(&self, key: &str) -> Result<u64, ValueError> {
        Ok(self.raw(key).parse()?)
    }

    /// Parses the value for `key` as a float.
    pub fn parse_float(&self, key: &str) -> Result<f64, ValueError> {
        Ok(self.raw(key).parse()?)
    }

    /// Parses the value for `key` as a boolean (`"true"` / `"false"`).
    pub fn parse_bool(&self, key: &str) -> Result<bool, ValueError> {
        Ok(self.raw(key).parse()?)
    }

    /// Returns the value for `key`, or the empty string when absent.
    #[must_use]
    pub fn parse_str(&self, key: &str) -> String {
        self.raw(key).to_string()
    }
}

impl FromIterator<(String, String)> for Values {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A multi-valued string map, used for query parameters, form fields,
/// multipart fields, and headers.
///
/// The singular parse helpers operate on the first value for a key and fail
/// with [`ValueError::Missing`] when the key is absent or empty, never
/// returning a silent zero value. The plural helpers parse every value and
/// fail on the first bad element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValuesList(HashMap<String, Vec<String>>);

impl ValuesList {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` to the list for `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// Returns every value recorded for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// Returns the first value recorded for `key`.
    #[must_use]
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// Returns true if the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    fn first_or_err(&self, key: &str) -> Result<&str, ValueError> {
        self.first(key)
            .ok_or_else(|| ValueError::Missing(key.to_string()))
    }

    /// Parses the first value for `key` as a signed integer.
    pub fn parse_int(&self, key: &str) -> Result<i64, ValueError> {
        Ok(self.first_or_err(key)?.parse()?)
    }

    /// Parses the first value for `key` as an unsigned integer.
    pub fn parse_uint(&self, key: &str) -> Result<u64, ValueError> {
        Ok(self.first_or_err(key)?.parse()?)
    }

    /// Parses the first value for `key` as a float.
    pub fn parse_float(&self, key: &str) -> Result<f64, ValueError> {
        Ok(self.first_or_err(key)?.parse()?)
    }

    /// Parses the first value for `key` as a boolean.
    pub fn parse_bool(&self, key: &str) -> Result<bool, ValueError> {
        Ok(self.first_or_err(key)?.parse()?)
    }

    /// Returns the first value for `key` as an owned string.
    pub fn parse_str(&self, key: &str) -> Result<String, ValueError> {
        Ok(self.first_or_err(key)?.to_string())
    }

    /// Parses every value for `key` as signed integers.
    pub fn parse_ints(&self, key: &str) -> Result<Vec<i64>, ValueError> {
        self.all_parsed(key)
    }

    /// Parses every value for `key` as unsigned integers.
    pub fn parse_uints(&self, key: &str) -> Result<Vec<u64>, ValueError> {
        self.all_parsed(key)
    }

    /// Parses every value for `key` as floats.
    pub fn parse_floats(&self, key: &str) -> Result<Vec<f64>, ValueError> {
        self.all_parsed(key)
    }

    /// Parses every value for `key` as booleans.
    pub fn parse_bools(&self, key: &str) -> Result<Vec<bool>, ValueError> {
        self.all_parsed(key)
    }

    /// Returns every value for `key` as owned strings (empty when absent).
    #[must_use]
    pub fn parse_strs(&self, key: &str) -> Vec<String> {
        self.0.get(key).cloned().unwrap_or_default()
    }

    fn all_parsed<T>(&self, key: &str) -> Result<Vec<T>, ValueError>
    where
        T: std::str::FromStr,
        ValueError: From<T::Err>,
    {
        self.0
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|s| s.parse().map_err(ValueError::from))
            .collect()
    }
}

impl FromIterator<(String, String)> for ValuesList {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut list = Self::new();
        for (k, v) in iter {
            list.append(k, v);
        }
        list
    }
}

impl FromIterator<(String, Vec<String>)> for ValuesList {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A file uploaded through a multipart form.
///
/// The content is already bounded by the configured maximum upload size at
/// parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// The file name supplied by the client.
    pub file_name: String,
    /// The file content.
    pub content: Bytes,
}

impl UploadedFile {
    /// Creates a new uploaded file descriptor.
    #[must_use]
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
        }
    }
}

/// Uploaded files keyed by multipart field name.
#[derive(Debug, Clone, Default)]
pub struct FileMap(HashMap<String, Vec<UploadedFile>>);

impl FileMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an uploaded file under `field`.
    pub fn append(&mut self, field: impl Into<String>, file: UploadedFile) {
        self.0.entry(field.into()).or_default().push(file);
    }

    /// Returns every file uploaded under `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[UploadedFile]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Returns the first file uploaded under `field`.
    pub fn first(&self, field: &str) -> Result<&UploadedFile, ValueError> {
        self.0
            .get(field)
            .and_then(|v| v.first())
            .ok_or_else(|| ValueError::Missing(field.to_string()))
    }

    /// Returns true if no files were uploaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of fields carrying files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}
