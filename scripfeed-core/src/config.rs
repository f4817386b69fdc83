//! Fetch configuration: TOML file layout, endpoint settings, and the small
//! string parsers shared with the CLI.
//!
//! Example:
//!
//! ```toml
//! securities = "INE002A01018=500325,INE009A01021=500209"
//! start = "2024-01-01"
//! end = "2024-03-31"
//! max_span_days = 30
//! output_dir = "announcements"
//!
//! [endpoint]
//! page_size = 50
//!
//! [endpoint.headers]
//! Referer = "https://www.bseindia.com/"
//! ```

use crate::domain::{parse_securities, SecurityId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_MAX_SPAN_DAYS: u32 = 30;
pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid security mapping '{0}' (expected ISIN=scripCode)")]
    InvalidSecurity(String),

    #[error("ISIN '{0}' is listed more than once")]
    DuplicateIsin(String),

    #[error("no securities configured")]
    NoSecurities,

    #[error("invalid date '{value}' (expected YYYY-MM-DD): {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("invalid header '{0}' (expected KEY=VALUE)")]
    InvalidHeader(String),

    #[error("a start date is required")]
    MissingStart,

    #[error("page size must be at least 1")]
    InvalidPageSize,

    #[error("invalid endpoint URL {0}")]
    InvalidUrl(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Top-level run configuration, as read from TOML and overridden by flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// `ISIN=scripCode` pairs, comma-separated.
    pub securities: Option<String>,
    pub start: Option<NaiveDate>,
    /// Defaults to today when absent.
    pub end: Option<NaiveDate>,
    pub max_span_days: u32,
    pub output_dir: PathBuf,
    pub endpoint: EndpointConfig,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            securities: None,
            start: None,
            end: None,
            max_span_days: DEFAULT_MAX_SPAN_DAYS,
            output_dir: PathBuf::from("announcements"),
            endpoint: EndpointConfig::default(),
        }
    }
}

impl FetchConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn parsed_securities(&self) -> Result<Vec<SecurityId>, ConfigError> {
        parse_securities(self.securities.as_deref().unwrap_or_default())
    }

    pub fn require_start(&self) -> Result<NaiveDate, ConfigError> {
        self.start.ok_or(ConfigError::MissingStart)
    }
}

/// Request shape of the remote listing endpoint.
///
/// Defaults target the exchange's corporate-announcement listing API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EndpointConfig {
    pub base_url: String,
    /// Records per full page. A shorter page ends the chunk.
    pub page_size: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// JSON field holding the record array; `None` expects a bare array.
    pub records_field: Option<String>,
    /// chrono format for the date bounds in the query string.
    pub date_format: String,
    pub page_param: String,
    pub scrip_param: String,
    pub from_param: String,
    pub to_param: String,
    /// Sent only when set; the default endpoint has a fixed page size.
    pub page_size_param: Option<String>,
    /// Static query parameters sent with every request.
    pub params: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        let params = [
            ("strCat", "-1"),
            ("strSearch", "P"),
            ("strType", "C"),
            ("subcategory", "-1"),
        ];
        let headers = [
            ("Accept", "application/json, text/plain, */*"),
            ("Origin", "https://www.bseindia.com"),
            ("Referer", "https://www.bseindia.com/"),
        ];

        Self {
            base_url: "https://api.bseindia.com/BseIndiaAPI/api/AnnSubCategoryGetData/w".into(),
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
            records_field: Some("Table".into()),
            date_format: "%Y%m%d".into(),
            page_param: "pageno".into(),
            scrip_param: "strScrip".into(),
            from_param: "strPrevDate".into(),
            to_param: "strToDate".into(),
            page_size_param: None,
            params: params
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| ConfigError::InvalidDate {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Parse a `KEY=VALUE` header override.
pub fn parse_header(item: &str) -> Result<(String, String), ConfigError> {
    let (key, value) = item
        .split_once('=')
        .ok_or_else(|| ConfigError::InvalidHeader(item.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ConfigError::InvalidHeader(item.to_string()));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
