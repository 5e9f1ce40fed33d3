use log::{debug, warn};

use crate::errors::CoreError;
use crate::models::portfolio::Portfolio;

use super::format::{self, STATE_KEY};
use super::store::KeyValueStore;

/// High-level storage operations: load/save the portfolio document through
/// a [`KeyValueStore`], plus JSON export and import.
pub struct StorageManager;

impl StorageManager {
    /// Load the stored portfolio.
    ///
    /// A missing document gives the defaults. So does a document that
    /// cannot be read or parsed; that case is logged and the bad data is
    /// left in place until the next save overwrites it.
    pub fn load(store: &dyn KeyValueStore) -> Portfolio {
        let raw = match store.get(STATE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No stored portfolio under {STATE_KEY}; starting fresh");
                return Portfolio::default();
            }
            Err(e) => {
                warn!("Could not read stored portfolio, using defaults: {e}");
                return Portfolio::default();
            }
        };

        match format::parse_stored_document(&raw) {
            Ok(portfolio) => portfolio,
            Err(e) => {
                warn!("Discarding stored portfolio, using defaults: {e}");
                Portfolio::default()
            }
        }
    }

    /// Write the whole document under [`STATE_KEY`].
    pub fn save(store: &mut dyn KeyValueStore, portfolio: &Portfolio) -> Result<(), CoreError> {
        let json = format::to_json(portfolio, false)?;
        store.set(STATE_KEY, &json)
    }

    /// Pretty-printed JSON of the full portfolio.
    pub fn export_to_json(portfolio: &Portfolio) -> Result<String, CoreError> {
        format::to_json(portfolio, true)
    }

    /// Parse an export produced by [`export_to_json`](Self::export_to_json)
    /// (or a hand-written equivalent).
    pub fn import_from_json(json: &str) -> Result<Portfolio, CoreError> {
        format::parse_import_document(json).inspect_err(|e| warn!("Import rejected: {e}"))
    }

    /// Save to a file on disk (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn export_to_file(portfolio: &Portfolio, path: &str) -> Result<(), CoreError> {
        std::fs::write(path, Self::export_to_json(portfolio)?)?;
        Ok(())
    }

    /// Read and validate an export file from disk (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn import_from_file(path: &str) -> Result<Portfolio, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::import_from_json(&json)
    }
}
