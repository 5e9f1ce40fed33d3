use log::debug;

use crate::errors::CoreError;
use crate::models::asset::{Asset, NewAsset};
use crate::models::portfolio::Portfolio;

/// Manages the asset list: add, full-replace edit, delete.
///
/// Asset CRUD over the in-memory document. Does no I/O.
pub struct HoldingsService;

impl HoldingsService {
    pub fn new() -> Self {
        Self
    }

    /// Validate and append a new asset. Returns its generated id.
    pub fn add_asset(&self, portfolio: &mut Portfolio, new: NewAsset) -> Result<String, CoreError> {
        let new = new.normalized();
        self.validate(&new)?;

        let asset = Asset::new(new);
        let id = asset.id.clone();
        debug!("Adding asset {} ({})", id, asset.key());
        portfolio.assets.push(asset);
        Ok(id)
    }

    /// Replace the asset with `id` entirely, keeping its id and position.
    ///
    /// If the edit changes the price key, the old cache entry is dropped
    /// unless another asset still uses it.
    pub fn update_asset(
        &self,
        portfolio: &mut Portfolio,
        id: &str,
        new: NewAsset,
    ) -> Result<(), CoreError> {
        let new = new.normalized();
        self.validate(&new)?;

        let idx = portfolio
            .assets
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| CoreError::AssetNotFound(id.to_string()))?;

        let old_key = portfolio.assets[idx].key();
        portfolio.assets[idx] = Asset::with_id(id, new);

        if !portfolio.has_asset_with_key(&old_key) {
            portfolio.price_cache.remove(&old_key);
        }
        Ok(())
    }

    /// Delete the asset with `id` and its price cache entry.
    ///
    /// The cache entry survives if another asset shares the same key.
    pub fn delete_asset(&self, portfolio: &mut Portfolio, id: &str) -> Result<Asset, CoreError> {
        let idx = portfolio
            .assets
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| CoreError::AssetNotFound(id.to_string()))?;

        let removed = portfolio.assets.remove(idx);
        let key = removed.key();
        if !portfolio.has_asset_with_key(&key) && portfolio.price_cache.remove(&key) {
            debug!("Dropped cached price for {key}");
        }
        Ok(removed)
    }

    /// Validate form input before it touches the portfolio.
    ///
    /// Rules:
    /// - Name and symbol must be non-empty
    /// - Quantities must be finite and non-negative
    fn validate(&self, new: &NewAsset) -> Result<(), CoreError> {
        if new.name.is_empty() {
            return Err(CoreError::ValidationError("Asset name must not be empty".into()));
        }
        if new.symbol.is_empty() {
            return Err(CoreError::ValidationError("Asset symbol must not be empty".into()));
        }
        for (label, qty) in [("Person 1", new.p1_qty), ("Person 2", new.p2_qty)] {
            if !qty.is_finite() || qty < 0.0 {
                return Err(CoreError::ValidationError(format!(
                    "{label} quantity must be a finite, non-negative number (got {qty})"
                )));
            }
        }
        Ok(())
    }
}

impl Default for HoldingsService {
    fn default() -> Self {
        Self::new()
    }
}
