use async_trait::async_trait;
use yahoo_finance_api::YahooConnector;

use super::http::api_error;
use super::traits::PriceProvider;
use crate::errors::CoreError;
use crate::models::asset::AssetType;
use crate::models::price::Quote;

const PROVIDER: &str = "Yahoo Finance";

/// Keyless stock prices through the unofficial Yahoo chart API, used
/// behind Finnhub. Native only.
///
/// The last daily close is taken as the price and assumed to be USD.
pub struct YahooFinanceProvider {
    connector: YahooConnector,
}

impl YahooFinanceProvider {
    pub fn new() -> Result<Self, CoreError> {
        YahooConnector::new()
            .map(|connector| Self { connector })
            .map_err(|e| api_error(PROVIDER, format!("Connector setup failed: {e}")))
    }
}

#[async_trait]
impl PriceProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn supported_asset_types(&self) -> Vec<AssetType> {
        vec![AssetType::Stock]
    }

    async fn get_current_price(&self, symbol: &str, _currency: &str) -> Result<Quote, CoreError> {
        let close = self
            .connector
            .get_latest_quotes(symbol, "1d")
            .await
            .and_then(|resp| resp.last_quote())
            .map(|q| q.close)
            .map_err(|e| api_error(PROVIDER, format!("{symbol}: {e}")))?;
        Ok(Quote::new(close, "USD"))
    }
}
