use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::http;
use super::traits::PriceProvider;
use crate::errors::CoreError;
use crate::models::asset::AssetType;
use crate::models::price::Quote;

const BASE_URL: &str = "https://api.metals.dev/v1";

/// Precious metal spot prices, enabled by the "metals_dev" key.
///
/// Quotes come back in the requested currency, so they skip conversion.
/// Holdings may name the metal ("gold") or use its ISO code ("XAU").
pub struct MetalsDevProvider {
    client: Client,
    api_key: String,
}

impl MetalsDevProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: http::client(),
            api_key,
        }
    }

    /// Map ISO metal codes to the names metals.dev expects; anything else
    /// is passed through lowercased.
    pub fn resolve_metal_name(symbol: &str) -> String {
        match symbol.trim().to_uppercase().as_str() {
            "XAU" => "gold".to_string(),
            "XAG" => "silver".to_string(),
            "XPT" => "platinum".to_string(),
            "XPD" => "palladium".to_string(),
            _ => symbol.trim().to_lowercase(),
        }
    }

    /// Pull the spot price out of a response body.
    ///
    /// The documented shape is `{ "rate": { "price": .. } }`, but a bare
    /// numeric `rate` and top-level `price` / `spot` / `value` fields have
    /// all been observed.
    pub fn extract_price(body: &Value) -> Option<f64> {
        let rate = body.get("rate");
        let price = rate
            .and_then(|r| r.get("price"))
            .and_then(|p| p.as_f64())
            .or_else(|| rate.and_then(|r| r.as_f64()))
            .or_else(|| {
                ["price", "spot", "value"]
                    .iter()
                    .find_map(|k| body.get(*k).and_then(|v| v.as_f64()))
            })?;
        (price.is_finite() && price > 0.0).then_some(price)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PriceProvider for MetalsDevProvider {
    fn name(&self) -> &str {
        "metals.dev"
    }

    fn supported_asset_types(&self) -> Vec<AssetType> {
        vec![AssetType::Metal]
    }

    async fn get_current_price(&self, symbol: &str, currency: &str) -> Result<Quote, CoreError> {
        let metal_name = Self::resolve_metal_name(symbol);
        let currency = currency.to_uppercase();
        let request = self.client.get(format!("{BASE_URL}/metal/spot")).query(&[
            ("api_key", self.api_key.as_str()),
            ("metal", metal_name.as_str()),
            ("currency", currency.as_str()),
        ]);
        let body: Value = http::get_json(request, "metals.dev", &metal_name).await?;

        Self::extract_price(&body)
            .map(|price| Quote::new(price, currency.clone()))
            .ok_or_else(|| CoreError::PriceNotAvailable {
                symbol: symbol.to_string(),
                currency,
            })
    }
}
