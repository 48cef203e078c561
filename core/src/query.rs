//! Query-string rendering.
//!
//! Parameters render in insertion order. Keys and values are percent-encoded
//! with `application/x-www-form-urlencoded` rules (spaces become `+`), so any
//! standard form/query parser reads the pairs back unchanged.

use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::options::ParamValue;

/// How a `ParamValue::Many` entry expands into query pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayFormat {
    /// `ids[0]=a&ids[1]=b`
    #[default]
    Indexed,
    /// `ids[]=a&ids[]=b`
    Brackets,
    /// `ids=a&ids=b`
    Repeat,
}

/// Expand `params` into flat key/value pairs.
pub fn expand_params(
    params: &[(String, ParamValue)],
    format: ArrayFormat,
) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params {
        match value {
            ParamValue::Single(value) => pairs.push((key.clone(), value.clone())),
            ParamValue::Many(values) => {
                for (index, value) in values.iter().enumerate() {
                    let key = match format {
                        ArrayFormat::Indexed => format!("{key}[{index}]"),
                        ArrayFormat::Brackets => format!("{key}[]"),
                        ArrayFormat::Repeat => key.clone(),
                    };
                    pairs.push((key, value.clone()));
                }
            }
        }
    }
    pairs
}

/// Render `params` to an encoded query string without the leading `?`.
///
/// Returns an empty string when there is nothing to render.
pub fn render_query(
    params: &[(String, ParamValue)],
    format: ArrayFormat,
) -> Result<String, TransportError> {
    let pairs = expand_params(params, format);
    if pairs.is_empty() {
        return Ok(String::new());
    }
    Ok(serde_urlencoded::to_string(pairs)?)
}

/// Attach an already-encoded query string to `url`.
///
/// Uses `?` when the URL has no query yet and `&` when it does. A
/// `#fragment` stays at the end.
pub fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let (base, fragment) = match url.find('#') {
        Some(pos) => url.split_at(pos),
        None => (url, ""),
    };
    let separator = match base.find('?') {
        None => "?",
        Some(_) if base.ends_with('?') || base.ends_with('&') => "",
        Some(_) => "&",
    };
    format!("{base}{separator}{query}{fragment}")
}
