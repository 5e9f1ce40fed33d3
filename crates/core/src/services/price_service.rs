use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::{info, warn};
use std::collections::HashMap;

use crate::errors::CoreError;
use crate::models::asset::{Asset, AssetKey, AssetType};
use crate::models::portfolio::Portfolio;
use crate::models::price::{Quote, RefreshReport};
use crate::providers::registry::PriceProviderRegistry;
use crate::providers::traits::RateProvider;
use super::currency_service::{CurrencyService, RateCache};

/// The `(type, symbol)` pairs one refresh will ask for, grouped by type.
///
/// Each key appears once, even when several assets share it. Assets of an
/// unrecognized type are never planned since no provider can price them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshPlan {
    groups: Vec<(AssetType, Vec<String>)>,
}

impl RefreshPlan {
    pub fn groups(&self) -> &[(AssetType, Vec<String>)] {
        &self.groups
    }

    pub fn symbols_for(&self, asset_type: &AssetType) -> &[String] {
        self.groups
            .iter()
            .find(|(t, _)| t == asset_type)
            .map(|(_, s)| s.as_slice())
            .unwrap_or(&[])
    }

    pub fn keys(&self) -> impl Iterator<Item = AssetKey> + '_ {
        self.groups.iter().flat_map(|(asset_type, symbols)| {
            symbols
                .iter()
                .map(move |s| AssetKey::new(asset_type.clone(), s.clone()))
        })
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, s)| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Prices gathered by [`PriceService::fetch`], already in the base currency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    pub prices: Vec<(AssetKey, f64)>,
    pub failed: Vec<AssetKey>,
    pub total: usize,
}

/// Fetches current prices for every held instrument.
///
/// A refresh runs in three steps so the caller can release the portfolio
/// while network calls are in flight:
/// 1. [`plan_refresh`](Self::plan_refresh): collect unique keys per type.
/// 2. [`fetch`](Self::fetch): one future per asset class, all polled
///    together; inside a class symbols go one at a time, falling back
///    through the registry's providers.
/// 3. [`apply`](Self::apply): write prices into the cache and stamp it.
pub struct PriceService {
    registry: PriceProviderRegistry,
    currency_service: CurrencyService,
}

impl PriceService {
    pub fn new(registry: PriceProviderRegistry) -> Self {
        Self {
            registry,
            currency_service: CurrencyService::default(),
        }
    }

    pub fn with_rate_provider(
        registry: PriceProviderRegistry,
        rates: Box<dyn RateProvider>,
    ) -> Self {
        Self {
            registry,
            currency_service: CurrencyService::new(rates),
        }
    }

    /// Swap in a rebuilt registry (after API keys change).
    pub fn set_registry(&mut self, registry: PriceProviderRegistry) {
        self.registry = registry;
    }

    pub fn set_rate_provider(&mut self, rates: Box<dyn RateProvider>) {
        self.currency_service = CurrencyService::new(rates);
    }

    /// Check if at least one provider is available for a given asset type.
    pub fn has_provider_for(&self, asset_type: &AssetType) -> bool {
        self.registry.get_provider_for(asset_type).is_some()
    }

    /// Get the names of all providers available for a given asset type.
    pub fn get_provider_names(&self, asset_type: &AssetType) -> Vec<String> {
        self.registry
            .get_providers_for(asset_type)
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    pub fn plan_refresh(&self, assets: &[Asset]) -> RefreshPlan {
        let mut groups: Vec<(AssetType, Vec<String>)> = AssetType::KNOWN
            .iter()
            .map(|t| (t.clone(), Vec::new()))
            .collect();

        for asset in assets {
            if let Some((_, symbols)) = groups.iter_mut().find(|(t, _)| *t == asset.asset_type) {
                if !symbols.contains(&asset.symbol) {
                    symbols.push(asset.symbol.clone());
                }
            }
        }

        groups.retain(|(_, symbols)| !symbols.is_empty());
        RefreshPlan { groups }
    }

    /// Fetch every planned key and convert it into `base_currency`.
    ///
    /// Never fails as a whole: a key without a usable price ends up in
    /// `failed`.
    pub async fn fetch(&self, plan: &RefreshPlan, base_currency: &str) -> FetchOutcome {
        info!(
            "Refreshing {} prices across {} asset classes into {base_currency} (rates: {})",
            plan.len(),
            plan.groups.len(),
            self.currency_service.rate_provider_name()
        );

        let per_class = join_all(
            plan.groups
                .iter()
                .map(|(asset_type, symbols)| self.fetch_class(asset_type, symbols, base_currency)),
        )
        .await;

        let mut outcome = FetchOutcome {
            total: plan.len(),
            ..FetchOutcome::default()
        };
        let mut rates = RateCache::new();

        for ((asset_type, symbols), quotes) in plan.groups.iter().zip(per_class) {
            for symbol in symbols {
                let key = AssetKey::new(asset_type.clone(), symbol.clone());
                let converted = match quotes.get(symbol) {
                    Some(quote) => match self
                        .currency_service
                        .convert_quote(quote, base_currency, &mut rates)
                        .await
                    {
                        Ok(price) => Some(price),
                        Err(e) => {
                            warn!("Could not convert {key} into {base_currency}: {e}");
                            None
                        }
                    },
                    None => None,
                };

                match converted {
                    Some(price) => outcome.prices.push((key, price)),
                    None => outcome.failed.push(key),
                }
            }
        }

        outcome
    }

    /// Write fetched prices into the portfolio's cache.
    ///
    /// A price is only written while some asset still has that key, so an
    /// asset deleted mid-refresh does not get its entry back.
    pub fn apply(
        &self,
        portfolio: &mut Portfolio,
        outcome: FetchOutcome,
        now: DateTime<Utc>,
    ) -> RefreshReport {
        let mut report = RefreshReport {
            total: outcome.total,
            errors: outcome.failed.len(),
            failed: outcome.failed,
            ..RefreshReport::default()
        };

        for (key, price) in outcome.prices {
            if portfolio.has_asset_with_key(&key) {
                portfolio.price_cache.set_price(key, price);
                report.updated += 1;
            }
        }

        portfolio.price_cache.mark_updated(now);
        info!(
            "Price refresh done: {} updated, {} errors, {} total",
            report.updated, report.errors, report.total
        );
        report
    }

    /// One asset class: providers in fallback order, each asked only for
    /// the symbols still missing. Quotes must be finite and positive.
    async fn fetch_class(
        &self,
        asset_type: &AssetType,
        symbols: &[String],
        currency: &str,
    ) -> HashMap<String, Quote> {
        let providers = self.registry.get_providers_for(asset_type);
        if providers.is_empty() {
            let err = CoreError::NoProvider(asset_type.to_string());
            warn!("{err}; {} symbols skipped", symbols.len());
            return HashMap::new();
        }

        let mut found: HashMap<String, Quote> = HashMap::new();
        let mut missing: Vec<String> = symbols.to_vec();

        for provider in providers {
            if missing.is_empty() {
                break;
            }

            for (symbol, quote) in provider.fetch_prices(&missing, currency).await {
                if quote.price.is_finite() && quote.price > 0.0 {
                    found.insert(symbol, quote);
                } else {
                    warn!(
                        "{} returned invalid price {} for {symbol}",
                        provider.name(),
                        quote.price
                    );
                }
            }
            missing.retain(|s| !found.contains_key(s));
        }

        if !missing.is_empty() {
            warn!("No {asset_type} price for: {}", missing.join(", "));
        }
        found
    }
}
