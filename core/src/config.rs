//! Dispatcher configuration.
//!
//! `DispatcherConfig` deserializes from any serde format with every field
//! optional, so a host application can embed it in its own config file:
//!
//! ```json
//! { "array_format": "repeat", "default_headers": [["Accept", "application/json"]] }
//! ```

use serde::{Deserialize, Serialize};

use crate::query::ArrayFormat;

fn default_headers() -> Vec<(String, String)> {
    vec![("Content-Type".to_string(), "application/json".to_string())]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Headers sent with every request unless the request overrides them.
    #[serde(default = "default_headers")]
    pub default_headers: Vec<(String, String)>,

    /// Expansion rule for sequence-valued query parameters.
    #[serde(default)]
    pub array_format: ArrayFormat,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            default_headers: default_headers(),
            array_format: ArrayFormat::default(),
        }
    }
}
