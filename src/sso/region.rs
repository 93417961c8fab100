//! Start-URL cleanup and best-effort region inference.

use std::sync::OnceLock;

use regex::Regex;
use reqwest::Url;
use thiserror::Error;

/// Region used when nothing better is known.
pub const DEFAULT_REGION: &str = "us-east-1";

static REGION_PATTERN: OnceLock<Regex> = OnceLock::new();

fn region_pattern() -> &'static Regex {
    REGION_PATTERN.get_or_init(|| {
        Regex::new(
            r"\b((?:us|eu|ap|sa|ca|me|af|il|mx|cn)(?:-gov|-iso[a-z]?)?-(?:north|south|east|west|central|northeast|northwest|southeast|southwest)-\d+)\b",
        )
        .expect("region pattern is valid")
    })
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartUrlError {
    #[error("invalid URL format: {0}")]
    Parse(String),
    #[error("SSO URL must use HTTPS")]
    NotHttps,
    #[error("SSO URL must have a valid host")]
    MissingHost,
}

/// Strip the trailing `#`, `/#` and `/` that portal links usually carry.
pub fn normalize_start_url(raw: &str) -> String {
    let mut url = raw.trim();
    url = url.strip_suffix('#').unwrap_or(url);
    url = url.strip_suffix("/#").unwrap_or(url);
    url = url.strip_suffix('/').unwrap_or(url);
    url.to_string()
}

pub fn validate_start_url(start_url: &str) -> Result<Url, StartUrlError> {
    let parsed = Url::parse(start_url).map_err(|e| StartUrlError::Parse(e.to_string()))?;
    if parsed.scheme() != "https" {
        return Err(StartUrlError::NotHttps);
    }
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(StartUrlError::MissingHost),
    }
}

/// Guess the SSO region from the start URL's host.
///
/// `*.awsapps.com` portals do not encode their region, so they get the
/// default; other hosts are searched for a region-shaped label.
pub fn infer_region(start_url: &str) -> String {
    let Ok(parsed) = Url::parse(start_url) else {
        return DEFAULT_REGION.to_string();
    };
    let host = parsed.host_str().unwrap_or_default();
    if host.ends_with(".awsapps.com") {
        return DEFAULT_REGION.to_string();
    }
    region_pattern()
        .captures(host)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_REGION.to_string())
}

/// An explicit region always wins, then the profile's, then inference.
pub fn resolve_region(explicit: Option<&str>, configured: Option<&str>, start_url: &str) -> String {
    [explicit, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|region| !region.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| infer_region(start_url))
}
