use std::collections::HashMap;

use crate::models::asset::AssetType;

use super::coincap::CoinCapProvider;
use super::finnhub::FinnhubProvider;
use super::metals_dev::MetalsDevProvider;
use super::savings::SavingsProvider;
use super::traits::PriceProvider;
#[cfg(not(target_arch = "wasm32"))]
use super::yahoo_finance::YahooFinanceProvider;

/// Settings key holding the Finnhub token.
pub const FINNHUB_KEY: &str = "finnhub";
/// Settings key holding the metals.dev token.
pub const METALS_DEV_KEY: &str = "metals_dev";

/// Registry of all available price providers.
///
/// Registration order is the fallback order: for a given `AssetType` the
/// first registered provider is tried first.
pub struct PriceProviderRegistry {
    providers: Vec<Box<dyn PriceProvider>>,
}

impl PriceProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a registry with all default providers pre-configured.
    ///
    /// Keyed providers are only registered when their key is present and
    /// non-blank.
    pub fn new_with_defaults(api_keys: &HashMap<String, String>) -> Self {
        let mut registry = Self::new();
        let key = |name: &str| {
            api_keys
                .get(name)
                .map(|k| k.trim())
                .filter(|k| !k.is_empty())
                .map(str::to_string)
        };

        // Finnhub: stocks and crypto, needs a key
        if let Some(token) = key(FINNHUB_KEY) {
            registry.register(Box::new(FinnhubProvider::new(token)));
        }

        // Yahoo Finance: stocks, no key, native only
        #[cfg(not(target_arch = "wasm32"))]
        {
            if let Ok(yahoo) = YahooFinanceProvider::new() {
                registry.register(Box::new(yahoo));
            }
        }

        // CoinCap: crypto, no key
        registry.register(Box::new(CoinCapProvider::new()));

        // metals.dev: precious metals, needs a key
        if let Some(token) = key(METALS_DEV_KEY) {
            registry.register(Box::new(MetalsDevProvider::new(token)));
        }

        registry.register(Box::new(SavingsProvider::new()));

        registry
    }

    /// Register a new price provider.
    pub fn register(&mut self, provider: Box<dyn PriceProvider>) {
        self.providers.push(provider);
    }

    /// Find the first provider that supports the given asset type.
    pub fn get_provider_for(&self, asset_type: &AssetType) -> Option<&dyn PriceProvider> {
        self.providers
            .iter()
            .find(|p| p.supported_asset_types().contains(asset_type))
            .map(|p| p.as_ref())
    }

    /// All providers supporting `asset_type`, in fallback order.
    pub fn get_providers_for(&self, asset_type: &AssetType) -> Vec<&dyn PriceProvider> {
        self.providers
            .iter()
            .filter(|p| p.supported_asset_types().contains(asset_type))
            .map(|p| p.as_ref())
            .collect()
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for PriceProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
