use log::{debug, warn};
use std::collections::HashMap;

use crate::errors::CoreError;
use crate::models::price::Quote;
use crate::providers::frankfurter::FrankfurterProvider;
use crate::providers::traits::RateProvider;

/// Rates looked up during one refresh, keyed by `(from, to)`.
///
/// Failed lookups are remembered as `None` so a pair is asked for at most
/// once per refresh.
#[derive(Debug, Default)]
pub struct RateCache {
    rates: HashMap<(String, String), Option<f64>>,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

/// Brings provider quotes into the base currency.
///
/// Most providers quote in USD. If the base currency differs, the quote is
/// multiplied by the `quote currency → base` rate from the rate provider
/// (Frankfurter by default).
pub struct CurrencyService {
    rates: Box<dyn RateProvider>,
}

impl CurrencyService {
    pub fn new(rates: Box<dyn RateProvider>) -> Self {
        Self { rates }
    }

    pub fn rate_provider_name(&self) -> &str {
        self.rates.name()
    }

    /// Price of `quote` expressed in `target`.
    pub async fn convert_quote(
        &self,
        quote: &Quote,
        target: &str,
        cache: &mut RateCache,
    ) -> Result<f64, CoreError> {
        let from = quote.currency.to_uppercase();
        let to = target.to_uppercase();

        if from == to {
            return Ok(quote.price);
        }

        let pair = (from.clone(), to.clone());
        let rate = match cache.rates.get(&pair) {
            Some(cached) => *cached,
            None => {
                let fetched = match self.rates.get_rate(&from, &to).await {
                    Ok(rate) if rate.is_finite() && rate > 0.0 => {
                        debug!("Rate {from} → {to}: {rate}");
                        Some(rate)
                    }
                    Ok(rate) => {
                        let source = self.rates.name();
                        warn!("{source} returned invalid rate {rate} for {from} → {to}");
                        None
                    }
                    Err(e) => {
                        warn!("{}: rate {from} → {to} failed: {e}", self.rates.name());
                        None
                    }
                };
                cache.rates.insert(pair, fetched);
                fetched
            }
        };

        rate.map(|r| quote.price * r).ok_or_else(|| CoreError::Api {
            provider: self.rates.name().to_string(),
            message: format!("No exchange rate for {from} → {to}"),
        })
    }
}

impl Default for CurrencyService {
    fn default() -> Self {
        Self::new(Box::new(FrankfurterProvider::new()))
    }
}
