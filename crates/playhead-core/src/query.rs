//! Query-string start times
//!
//! Players can be deep-linked with `?t=1m30s` or `?t=0:01:30:00`.

use crate::timecode::parse_duration_to_millis;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;
use url::form_urlencoded;

/// A query parameter value. Bare keys and `true`/`false` become flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Flag(bool),
    Text(String),
}

impl QueryValue {
    fn from_raw(raw: &str) -> Self {
        match raw.trim() {
            "" | "true" => QueryValue::Flag(true),
            "false" => QueryValue::Flag(false),
            other => QueryValue::Text(other.to_string()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            QueryValue::Text(text) => Some(text),
            QueryValue::Flag(_) => None,
        }
    }
}

impl std::fmt::Display for QueryValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryValue::Flag(flag) => write!(f, "{}", flag),
            QueryValue::Text(text) => write!(f, "{}", text),
        }
    }
}

/// Parsed query parameters
pub type QueryParams = BTreeMap<String, QueryValue>;

/// Parse a URL query string (with or without the leading `?`).
///
/// Keys and values are percent-decoded and trimmed.
pub fn parse_query_string(raw: &str) -> QueryParams {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    form_urlencoded::parse(raw.as_bytes())
        .map(|(key, value)| (key.trim().to_string(), QueryValue::from_raw(&value)))
        .collect()
}

/// Parse a `document.cookie` style string (`a=1; b=2`). Values are not decoded.
pub fn parse_cookie_string(raw: &str) -> QueryParams {
    raw.split(';')
        .filter(|pair| !pair.trim().is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key.trim().to_string(), QueryValue::from_raw(value))
        })
        .collect()
}

/// Serialize parameters back into a query string (no leading `?`)
pub fn to_query_string(params: &QueryParams) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(key, value)| (key, value.to_string())))
        .finish()
}

/// Start time in milliseconds requested by the `t` parameter, 0 if absent
/// or unparseable
pub fn start_time_from_query(params: &QueryParams, frame_rate: f64) -> f64 {
    match params.get("t") {
        Some(QueryValue::Text(raw)) => parse_duration_to_millis(raw, frame_rate),
        Some(QueryValue::Flag(_)) => {
            debug!("Start time parameter has no value");
            0.0
        }
        None => 0.0,
    }
}
