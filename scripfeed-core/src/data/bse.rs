//! Exchange announcement-listing provider over blocking HTTP.
//!
//! One GET per page. The query names, static parameters, headers, and the
//! JSON field carrying the record list all come from [`EndpointConfig`]. The
//! API is unofficial and tends to answer an unexpected session with an HTML
//! page, which surfaces here as a `PageDecode` error.

use super::provider::{FetchError, Page, PageProvider, PageQuery};
use crate::config::{ConfigError, EndpointConfig};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use std::time::Duration;

pub struct BseProvider {
    client: reqwest::blocking::Client,
    endpoint: EndpointConfig,
}

impl BseProvider {
    pub fn new(endpoint: EndpointConfig) -> Result<Self, ConfigError> {
        if endpoint.page_size == 0 {
            return Err(ConfigError::InvalidPageSize);
        }
        Url::parse(&endpoint.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {e}", endpoint.base_url)))?;

        let mut headers = HeaderMap::new();
        for (key, value) in &endpoint.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| ConfigError::InvalidHeader(format!("{key}={value}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ConfigError::InvalidHeader(format!("{key}={value}")))?;
            headers.insert(name, value);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(endpoint.timeout_secs))
            .user_agent(endpoint.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { client, endpoint })
    }

    /// Full request URL for one page.
    pub fn page_url(&self, query: &PageQuery<'_>) -> Result<Url, FetchError> {
        let ep = &self.endpoint;
        let fmt = ep.date_format.as_str();

        let mut params: Vec<(String, String)> = ep
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        params.push((ep.page_param.clone(), query.page.to_string()));
        params.push((ep.scrip_param.clone(), query.security.scrip_code.clone()));
        params.push((ep.from_param.clone(), query.chunk.start.format(fmt).to_string()));
        params.push((ep.to_param.clone(), query.chunk.end.format(fmt).to_string()));
        if let Some(name) = &ep.page_size_param {
            params.push((name.clone(), query.page_size.to_string()));
        }

        Url::parse_with_params(&ep.base_url, &params).map_err(|e| FetchError::RemoteRequest {
            scrip_code: query.security.scrip_code.clone(),
            reason: format!("invalid request URL: {e}"),
        })
    }
}

impl PageProvider for BseProvider {
    fn name(&self) -> &str {
        "bse_announcements"
    }

    fn page_size(&self) -> usize {
        self.endpoint.page_size
    }

    fn fetch_page(&self, query: &PageQuery<'_>) -> Result<Page, FetchError> {
        let scrip_code = &query.security.scrip_code;
        let url = self.page_url(query)?;
        tracing::debug!(%url, "requesting page");

        let remote = |reason: String| FetchError::RemoteRequest {
            scrip_code: scrip_code.clone(),
            reason,
        };
        let decode = |reason: String| FetchError::PageDecode {
            scrip_code: scrip_code.clone(),
            page: query.page,
            reason,
        };

        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| remote(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(remote(format!("HTTP {status}")));
        }

        let body: serde_json::Value = resp.json().map_err(|e| {
            if e.is_decode() {
                decode(e.to_string())
            } else {
                remote(e.to_string())
            }
        })?;

        Page::from_value(body, self.endpoint.records_field.as_deref()).map_err(decode)
    }

    fn describe(&self, query: &PageQuery<'_>) -> String {
        match self.page_url(query) {
            Ok(url) => url.to_string(),
            Err(e) => format!("<{e}>"),
        }
    }
}
