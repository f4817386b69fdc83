//! Security identifiers and the `ISIN=scripCode` mapping format.

use crate::config::ConfigError;
use std::collections::HashSet;
use std::fmt;

/// One security to fetch: the ISIN names the output file, the scrip code
/// is what the exchange endpoint is queried with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecurityId {
    pub isin: String,
    pub scrip_code: String,
}

impl SecurityId {
    pub fn new(isin: impl Into<String>, scrip_code: impl Into<String>) -> Self {
        Self {
            isin: isin.into(),
            scrip_code: scrip_code.into(),
        }
    }
}

impl fmt::Display for SecurityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.isin, self.scrip_code)
    }
}

/// Parse a comma-separated `ISIN=scripCode` mapping, preserving order.
///
/// Blank entries are skipped so a trailing comma is harmless. Each ISIN may
/// appear only once because it owns exactly one output file.
pub fn parse_securities(mapping: &str) -> Result<Vec<SecurityId>, ConfigError> {
    let mut securities = Vec::new();
    let mut seen = HashSet::new();

    for entry in mapping.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (isin, scrip) = entry
            .split_once('=')
            .map(|(i, s)| (i.trim(), s.trim()))
            .filter(|(i, s)| !i.is_empty() && !s.is_empty())
            .ok_or_else(|| ConfigError::InvalidSecurity(entry.to_string()))?;

        if !seen.insert(isin.to_string()) {
            return Err(ConfigError::DuplicateIsin(isin.to_string()));
        }
        securities.push(SecurityId::new(isin, scrip));
    }

    if securities.is_empty() {
        return Err(ConfigError::NoSecurities);
    }
    Ok(securities)
}
