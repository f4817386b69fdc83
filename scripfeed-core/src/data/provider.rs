//! Page provider trait and structured fetch errors.
//!
//! The PageProvider trait abstracts over the remote listing endpoint so the
//! fetch loop can run against the HTTP implementation or a scripted one in
//! tests.

use crate::domain::{DateChunk, SecurityId};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Page numbers start at 1.
pub const FIRST_PAGE: u32 = 1;

/// Errors raised while fetching or persisting announcements.
///
/// None of these are retried; the fetch loop records them against the
/// security being processed and moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("remote request failed for scrip {scrip_code}: {reason}")]
    RemoteRequest { scrip_code: String, reason: String },

    #[error("undecodable page {page} for scrip {scrip_code}: {reason}")]
    PageDecode {
        scrip_code: String,
        page: u32,
        reason: String,
    },

    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    pub fn is_remote(&self) -> bool {
        matches!(self, FetchError::RemoteRequest { .. })
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, FetchError::PageDecode { .. })
    }
}

/// One request for one page of one chunk.
#[derive(Debug, Clone, Copy)]
pub struct PageQuery<'a> {
    pub security: &'a SecurityId,
    pub chunk: DateChunk,
    pub page: u32,
    pub page_size: usize,
}

/// One decoded response: the records in the order the endpoint sent them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub records: Vec<Value>,
}

impl Page {
    pub fn new(records: Vec<Value>) -> Self {
        Self { records }
    }

    /// Decode a response body.
    ///
    /// With `records_field` set the body must be an object whose field is an
    /// array; a bare top-level array is accepted either way.
    pub fn from_value(body: Value, records_field: Option<&str>) -> Result<Self, String> {
        match (body, records_field) {
            (Value::Array(records), _) => Ok(Self::new(records)),
            (Value::Object(mut map), Some(field)) => match map.remove(field) {
                Some(Value::Array(records)) => Ok(Self::new(records)),
                Some(Value::Null) | None => Err(format!("missing '{field}' array")),
                Some(other) => Err(format!("'{field}' is {}, not an array", kind(&other))),
            },
            (other, _) => Err(format!("expected a record list, got {}", kind(&other))),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// A page shorter than the full page size is the last one for its chunk.
    pub fn is_last(&self, page_size: usize) -> bool {
        self.records.len() < page_size
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Source of announcement pages.
pub trait PageProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Records in a full page.
    fn page_size(&self) -> usize;

    /// Fetch a single page. Blocks until the endpoint answers.
    fn fetch_page(&self, query: &PageQuery<'_>) -> Result<Page, FetchError>;

    /// The request `fetch_page` would issue, for dry runs and logs.
    fn describe(&self, query: &PageQuery<'_>) -> String;
}
