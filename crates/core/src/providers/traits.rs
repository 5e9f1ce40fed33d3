use async_trait::async_trait;
use log::warn;
use std::collections::HashMap;

use crate::errors::CoreError;
use crate::models::asset::AssetType;
use crate::models::price::Quote;

/// Trait abstraction for all price data providers.
///
/// One implementation per upstream API (Finnhub, CoinCap, Yahoo Finance,
/// metals.dev). The refresh pipeline only ever sees this trait.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Which asset types this provider can handle.
    fn supported_asset_types(&self) -> Vec<AssetType>;

    /// Get the current (latest) price of a symbol.
    ///
    /// `currency` is the preferred quote currency; providers that can only
    /// quote in one currency ignore it and say so in the returned `Quote`.
    async fn get_current_price(&self, symbol: &str, currency: &str) -> Result<Quote, CoreError>;

    /// Fetch several symbols one request at a time.
    ///
    /// A failing symbol is logged and left out of the map; it never aborts
    /// the rest of the batch.
    async fn fetch_prices(&self, symbols: &[String], currency: &str) -> HashMap<String, Quote> {
        let mut quotes = HashMap::new();
        for symbol in symbols {
            match self.get_current_price(symbol, currency).await {
                Ok(quote) => {
                    quotes.insert(symbol.clone(), quote);
                }
                Err(e) => warn!("{}: failed to fetch {symbol}: {e}", self.name()),
            }
        }
        quotes
    }
}

/// Exchange-rate source used to bring quotes into the base currency.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait RateProvider: Send + Sync {
    fn name(&self) -> &str;

    /// How many units of `to` one unit of `from` buys.
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64, CoreError>;
}
