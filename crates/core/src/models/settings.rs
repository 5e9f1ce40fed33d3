use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// User-configurable settings, stored inside the portfolio document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// The currency in which all portfolio values are displayed (e.g., "USD", "EUR").
    pub base_currency: String,

    /// Display names of the two people holdings are split between.
    pub people: [String; 2],

    /// Optional API keys for providers that require them.
    /// Keys: provider name (e.g., "finnhub", "metals_dev").
    /// Values: the API key string.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub api_keys: HashMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_currency: "USD".to_string(),
            people: ["Person 1".to_string(), "Person 2".to_string()],
            api_keys: HashMap::new(),
        }
    }
}
