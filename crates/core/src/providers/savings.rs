use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::asset::AssetType;
use crate::models::price::Quote;
use super::traits::PriceProvider;

/// Savings are cash: one unit of quantity is one unit of the base currency.
/// No network access.
pub struct SavingsProvider;

impl SavingsProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SavingsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PriceProvider for SavingsProvider {
    fn name(&self) -> &str {
        "Savings"
    }

    fn supported_asset_types(&self) -> Vec<AssetType> {
        vec![AssetType::Savings]
    }

    async fn get_current_price(&self, _symbol: &str, currency: &str) -> Result<Quote, CoreError> {
        Ok(Quote::new(1.0, currency))
    }
}
