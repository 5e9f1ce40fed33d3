use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use super::http::{self, api_error};
use super::traits::RateProvider;
use crate::errors::CoreError;

const BASE_URL: &str = "https://api.frankfurter.dev/v1";
const PROVIDER: &str = "Frankfurter";

/// ECB reference rates via Frankfurter (no key). Converts provider quotes
/// into the base currency.
pub struct FrankfurterProvider {
    client: Client,
}

impl FrankfurterProvider {
    pub fn new() -> Self {
        Self {
            client: http::client(),
        }
    }
}

impl Default for FrankfurterProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct LatestRates {
    rates: HashMap<String, f64>,
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl RateProvider for FrankfurterProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_rate(&self, from: &str, to: &str) -> Result<f64, CoreError> {
        let (from, to) = (from.to_uppercase(), to.to_uppercase());
        if from == to {
            return Ok(1.0);
        }

        let pair = format!("{from}/{to}");
        let request = self
            .client
            .get(format!("{BASE_URL}/latest"))
            .query(&[("base", from.as_str()), ("symbols", to.as_str())]);
        let latest: LatestRates = http::get_json(request, PROVIDER, &pair).await?;

        latest
            .rates
            .get(&to)
            .copied()
            .ok_or_else(|| api_error(PROVIDER, format!("No rate for {pair}")))
    }
}
