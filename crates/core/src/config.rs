#[cfg(not(target_arch = "wasm32"))]
use log::debug;
use std::collections::HashMap;

use crate::providers::registry::{FINNHUB_KEY, METALS_DEV_KEY};

pub const FINNHUB_ENV: &str = "FINNHUB_API_KEY";
pub const METALS_DEV_ENV: &str = "METALS_DEV_API_KEY";

/// Provider API keys picked up from the environment (or a `.env` file).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderKeys {
    pub finnhub: Option<String>,
    pub metals_dev: Option<String>,
}

impl ProviderKeys {
    /// Load `.env` if present, then read the key variables. Blank values
    /// count as unset.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }
        Self {
            finnhub: read_var(FINNHUB_ENV),
            metals_dev: read_var(METALS_DEV_ENV),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.finnhub.is_none() && self.metals_dev.is_none()
    }

    /// Fill in provider keys missing from `api_keys`. Keys the user saved
    /// in settings always win. Returns whether anything was added.
    ///
    /// Applied to the key map handed to the provider registry, never to the
    /// stored settings.
    pub fn fill_missing(&self, api_keys: &mut HashMap<String, String>) -> bool {
        let mut changed = false;
        for (name, value) in [(FINNHUB_KEY, &self.finnhub), (METALS_DEV_KEY, &self.metals_dev)] {
            let Some(value) = value else { continue };
            let has_key = api_keys.get(name).is_some_and(|k| !k.trim().is_empty());
            if !has_key {
                api_keys.insert(name.to_string(), value.clone());
                changed = true;
            }
        }
        changed
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn read_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
