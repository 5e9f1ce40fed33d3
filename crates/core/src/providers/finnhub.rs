use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http;
use super::traits::PriceProvider;
use crate::errors::CoreError;
use crate::models::asset::AssetType;
use crate::models::price::Quote;

const BASE_URL: &str = "https://finnhub.io/api/v1";

/// Primary source for stocks and crypto, enabled by the "finnhub" key.
///
/// Crypto holdings use exchange pairs (`BINANCE:BTCUSDT`), which Finnhub
/// accepts as-is on `/quote`. Prices come back in USD.
pub struct FinnhubProvider {
    client: Client,
    api_key: String,
}

impl FinnhubProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: http::client(),
            api_key,
        }
    }
}

#[derive(Deserialize)]
struct QuoteResponse {
    /// Current price. Finnhub answers unknown symbols with 0.
    c: Option<f64>,
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PriceProvider for FinnhubProvider {
    fn name(&self) -> &str {
        "Finnhub"
    }

    fn supported_asset_types(&self) -> Vec<AssetType> {
        vec![AssetType::Stock, AssetType::Crypto]
    }

    async fn get_current_price(&self, symbol: &str, _currency: &str) -> Result<Quote, CoreError> {
        let request = self
            .client
            .get(format!("{BASE_URL}/quote"))
            .query(&[("symbol", symbol), ("token", self.api_key.as_str())]);
        let body: QuoteResponse = http::get_json(request, "Finnhub", symbol).await?;

        match body.c {
            Some(price) if price.is_finite() && price > 0.0 => Ok(Quote::new(price, "USD")),
            _ => Err(CoreError::PriceNotAvailable {
                symbol: symbol.to_string(),
                currency: "USD".to_string(),
            }),
        }
    }
}
