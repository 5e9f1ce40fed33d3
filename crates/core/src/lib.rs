pub mod config;
pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use chrono::{DateTime, Utc};
use config::ProviderKeys;
use log::info;
use models::{
    analytics::{HoldingRow, Performers, TableQuery, TypeAllocation},
    asset::{Asset, AssetType, NewAsset},
    chart::{ChartView, CompositionChart, DeltaPoint, ReturnPoint, SavingsSplit, ScatterPoint},
    portfolio::Portfolio,
    price::{PriceCache, RefreshReport},
    range::RangeWindow,
    settings::Settings,
    snapshot::Snapshot,
    totals::{AssetValues, Totals},
};
use providers::{registry::PriceProviderRegistry, traits::RateProvider};
use services::{
    analytics_service::AnalyticsService,
    chart_service::ChartService,
    holdings_service::HoldingsService,
    price_service::{FetchOutcome, PriceService, RefreshPlan},
    snapshot_service::SnapshotService,
    totals_service::TotalsService,
};
use storage::{
    manager::StorageManager,
    store::{KeyValueStore, MemoryStore},
};

use errors::CoreError;

/// Main entry point for the Portfolio Tracker core library.
/// Holds the portfolio state, the store it persists to, and all services
/// needed to operate on it.
///
/// Every mutating call writes the whole document back to the store.
#[must_use]
pub struct PortfolioTracker {
    portfolio: Portfolio,
    holdings_service: HoldingsService,
    totals_service: TotalsService,
    snapshot_service: SnapshotService,
    chart_service: ChartService,
    analytics_service: AnalyticsService,
    price_service: PriceService,
    store: Box<dyn KeyValueStore>,
    /// Provider keys from the environment, used where settings have none.
    env_keys: ProviderKeys,
    /// Set between `begin_refresh` and `finish_refresh`.
    refreshing: bool,
}

impl std::fmt::Debug for PortfolioTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioTracker")
            .field("assets", &self.portfolio.assets.len())
            .field("snapshots", &self.portfolio.snapshots.len())
            .field("settings", &self.portfolio.settings)
            .field("cached_prices", &self.portfolio.price_cache.len())
            .field("refreshing", &self.refreshing)
            .finish()
    }
}

impl PortfolioTracker {
    /// Create a brand new empty portfolio with default settings, backed by
    /// an in-memory store.
    pub fn create_new() -> Self {
        Self::build(
            Portfolio::default(),
            Box::new(MemoryStore::new()),
            ProviderKeys::default(),
        )
    }

    /// Load the portfolio kept in `store` (defaults when absent or corrupt).
    ///
    /// On native targets provider keys are also read from the environment.
    pub fn open(store: Box<dyn KeyValueStore>) -> Self {
        let portfolio = StorageManager::load(store.as_ref());
        #[cfg(not(target_arch = "wasm32"))]
        let env_keys = ProviderKeys::from_env();
        #[cfg(target_arch = "wasm32")]
        let env_keys = ProviderKeys::default();
        Self::build(portfolio, store, env_keys)
    }

    /// Like [`open`](Self::open) with explicit fallback keys instead of the
    /// environment.
    pub fn open_with_keys(store: Box<dyn KeyValueStore>, env_keys: ProviderKeys) -> Self {
        let portfolio = StorageManager::load(store.as_ref());
        Self::build(portfolio, store, env_keys)
    }

    /// Replace the provider registry (custom or mock providers).
    ///
    /// Changing API keys afterwards rebuilds the default registry.
    pub fn with_registry(mut self, registry: PriceProviderRegistry) -> Self {
        self.price_service.set_registry(registry);
        self
    }

    /// Replace the exchange-rate source (Frankfurter by default).
    pub fn with_rate_provider(mut self, rates: Box<dyn RateProvider>) -> Self {
        self.price_service.set_rate_provider(rates);
        self
    }

    /// The whole document, as it would be saved.
    #[must_use]
    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    // ── Asset Management ────────────────────────────────────────────

    /// Add an asset from form input. Returns the generated id.
    pub fn add_asset(&mut self, new: NewAsset) -> Result<String, CoreError> {
        let id = self.holdings_service.add_asset(&mut self.portfolio, new)?;
        self.persist()?;
        Ok(id)
    }

    /// Replace an asset entirely, keeping its id.
    pub fn update_asset(&mut self, id: &str, new: NewAsset) -> Result<(), CoreError> {
        self.holdings_service
            .update_asset(&mut self.portfolio, id, new)?;
        self.persist()
    }

    /// Delete an asset and its cached price. Returns the removed asset.
    pub fn delete_asset(&mut self, id: &str) -> Result<Asset, CoreError> {
        let removed = self.holdings_service.delete_asset(&mut self.portfolio, id)?;
        self.persist()?;
        Ok(removed)
    }

    #[must_use]
    pub fn get_asset(&self, id: &str) -> Option<&Asset> {
        self.portfolio.find_asset(id)
    }

    /// All assets in insertion order.
    #[must_use]
    pub fn assets(&self) -> &[Asset] {
        &self.portfolio.assets
    }

    // ── Values ──────────────────────────────────────────────────────

    /// Per-person, combined and per-type totals at cached prices.
    #[must_use]
    pub fn totals(&self) -> Totals {
        self.totals_service
            .compute_totals(&self.portfolio.assets, &self.portfolio.price_cache)
    }

    #[must_use]
    pub fn asset_values(&self, id: &str) -> Option<AssetValues> {
        self.portfolio
            .find_asset(id)
            .map(|a| self.totals_service.asset_values(a, &self.portfolio.price_cache))
    }

    #[must_use]
    pub fn price_cache(&self) -> &PriceCache {
        &self.portfolio.price_cache
    }

    /// When prices were last refreshed. `None` = never.
    #[must_use]
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.portfolio.price_cache.last_updated
    }

    // ── Prices ──────────────────────────────────────────────────────

    /// Refresh prices for every held instrument and persist the result.
    ///
    /// Dropping the returned future part-way leaves the cache untouched and
    /// the tracker ready for the next refresh.
    pub async fn refresh_prices(&mut self) -> Result<RefreshReport, CoreError> {
        let plan = self.begin_refresh()?;
        let base_currency = self.portfolio.settings.base_currency.clone();
        let outcome = {
            let _busy = BusyFlag(&mut self.refreshing);
            self.price_service.fetch(&plan, &base_currency).await
        };
        self.finish_refresh(outcome, Utc::now())
    }

    /// Start a refresh: mark the tracker busy and plan what to fetch.
    ///
    /// Fails with `RefreshInProgress` until the matching
    /// [`finish_refresh`](Self::finish_refresh).
    pub fn begin_refresh(&mut self) -> Result<RefreshPlan, CoreError> {
        if self.refreshing {
            return Err(CoreError::RefreshInProgress);
        }
        self.refreshing = true;
        let plan = self.price_service.plan_refresh(&self.portfolio.assets);
        info!("Price refresh started for {} instruments", plan.len());
        Ok(plan)
    }

    /// Fetch the planned prices. Borrows the tracker immutably, so hosts
    /// can keep serving reads while it runs.
    pub async fn fetch_planned(&self, plan: &RefreshPlan) -> FetchOutcome {
        self.price_service
            .fetch(plan, &self.portfolio.settings.base_currency)
            .await
    }

    /// Apply fetched prices, clear the busy flag and persist.
    pub fn finish_refresh(
        &mut self,
        outcome: FetchOutcome,
        now: DateTime<Utc>,
    ) -> Result<RefreshReport, CoreError> {
        let report = self.price_service.apply(&mut self.portfolio, outcome, now);
        self.refreshing = false;
        self.persist()?;
        Ok(report)
    }

    /// Abandon a refresh started with [`begin_refresh`](Self::begin_refresh)
    /// whose fetch will never be finished. Returns whether one was running.
    pub fn cancel_refresh(&mut self) -> bool {
        if self.refreshing {
            info!("Price refresh cancelled");
        }
        std::mem::replace(&mut self.refreshing, false)
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    // ── Snapshots ───────────────────────────────────────────────────

    /// Capture the current totals. The oldest snapshot is evicted once the
    /// history is full.
    pub fn save_snapshot(&mut self, now: DateTime<Utc>) -> Result<Snapshot, CoreError> {
        let totals = self.totals();
        let asset_count = self.portfolio.assets.len();
        let snapshot = self
            .portfolio
            .snapshots
            .append(&totals, asset_count, now)
            .clone();
        self.persist()?;
        Ok(snapshot)
    }

    /// Delete the snapshot(s) with this timestamp. Returns how many were removed.
    pub fn delete_snapshot(&mut self, timestamp: i64) -> Result<usize, CoreError> {
        let removed = self.portfolio.snapshots.remove(timestamp);
        if removed > 0 {
            self.persist()?;
        }
        Ok(removed)
    }

    pub fn clear_snapshots(&mut self) -> Result<(), CoreError> {
        self.portfolio.snapshots.clear();
        self.persist()
    }

    /// Snapshots in insertion (chronological) order.
    #[must_use]
    pub fn snapshots(&self) -> &[Snapshot] {
        self.portfolio.snapshots.as_slice()
    }

    #[must_use]
    pub fn snapshots_newest_first(&self) -> Vec<&Snapshot> {
        self.portfolio.snapshots.newest_first()
    }

    #[must_use]
    pub fn filter_snapshots(&self, window: RangeWindow, now: DateTime<Utc>) -> Vec<&Snapshot> {
        self.snapshot_service
            .filter_by_range(self.portfolio.snapshots.as_slice(), window, now)
    }

    // ── Views & Charts ──────────────────────────────────────────────

    #[must_use]
    pub fn holdings_table(&self, query: &TableQuery) -> Vec<HoldingRow> {
        self.analytics_service.holdings_table(
            &self.portfolio.assets,
            &self.portfolio.price_cache,
            query,
        )
    }

    #[must_use]
    pub fn type_allocation(&self) -> Vec<TypeAllocation> {
        self.analytics_service.type_allocation(&self.totals())
    }

    #[must_use]
    pub fn delta_chart(
        &self,
        window: RangeWindow,
        now: DateTime<Utc>,
    ) -> ChartView<Vec<DeltaPoint>> {
        self.chart_service
            .delta_series(self.portfolio.snapshots.as_slice(), window, now)
    }

    #[must_use]
    pub fn cumulative_return_chart(
        &self,
        window: RangeWindow,
        now: DateTime<Utc>,
    ) -> ChartView<Vec<ReturnPoint>> {
        self.chart_service
            .cumulative_return_series(self.portfolio.snapshots.as_slice(), window, now)
    }

    #[must_use]
    pub fn composition_chart(
        &self,
        window: RangeWindow,
        now: DateTime<Utc>,
    ) -> ChartView<CompositionChart> {
        self.chart_service
            .composition_series(self.portfolio.snapshots.as_slice(), window, now)
    }

    #[must_use]
    pub fn savings_split(&self) -> SavingsSplit {
        self.chart_service.savings_split(&self.totals())
    }

    #[must_use]
    pub fn performance_scatter(&self) -> Vec<ScatterPoint> {
        self.chart_service
            .performance_scatter(&self.portfolio.assets, &self.portfolio.price_cache)
    }

    /// Top and bottom movers by last change percent.
    #[must_use]
    pub fn performers(&self) -> Performers {
        self.analytics_service
            .performers(&self.portfolio.assets, &self.portfolio.price_cache)
    }

    // ── Export / Import ─────────────────────────────────────────────

    /// The full document as pretty-printed JSON.
    pub fn export_json(&self) -> Result<String, CoreError> {
        StorageManager::export_to_json(&self.portfolio)
    }

    /// Replace the whole portfolio with an exported document.
    ///
    /// On any error nothing changes, in memory or in the store.
    pub fn import_json(&mut self, json: &str) -> Result<(), CoreError> {
        let imported = StorageManager::import_from_json(json)?;
        info!(
            "Imported portfolio with {} assets and {} snapshots",
            imported.assets.len(),
            imported.snapshots.len()
        );
        self.portfolio = imported;
        self.rebuild_registry();
        self.persist()
    }

    // ── Settings ────────────────────────────────────────────────────

    #[must_use]
    pub fn get_settings(&self) -> &Settings {
        &self.portfolio.settings
    }

    /// Set the display currency. Must be a three-letter code; stored
    /// uppercase. Cached prices stay as they are until the next refresh.
    pub fn set_base_currency(&mut self, currency: &str) -> Result<(), CoreError> {
        let code = currency.trim().to_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::ValidationError(format!(
                "Invalid currency code: {currency:?} (expected 3 letters, e.g. USD)"
            )));
        }
        self.portfolio.settings.base_currency = code;
        self.persist()
    }

    /// Rename the two people holdings are split between.
    pub fn set_people(&mut self, person1: &str, person2: &str) -> Result<(), CoreError> {
        let names = [person1.trim(), person2.trim()];
        if names.iter().any(|n| n.is_empty()) {
            return Err(CoreError::ValidationError(
                "Person names must not be empty".into(),
            ));
        }
        self.portfolio.settings.people = names.map(str::to_string);
        self.persist()
    }

    /// Set an API key for a provider and rebuild the provider registry.
    pub fn set_api_key(&mut self, provider: &str, key: &str) -> Result<(), CoreError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(CoreError::ValidationError(format!(
                "API key for {provider} must not be empty"
            )));
        }
        self.portfolio
            .settings
            .api_keys
            .insert(provider.to_string(), key.to_string());
        self.rebuild_registry();
        self.persist()
    }

    /// Remove an API key for a provider. Returns whether a key was removed.
    pub fn remove_api_key(&mut self, provider: &str) -> Result<bool, CoreError> {
        if self.portfolio.settings.api_keys.remove(provider).is_none() {
            return Ok(false);
        }
        self.rebuild_registry();
        self.persist()?;
        Ok(true)
    }

    // ── Provider Availability ───────────────────────────────────────

    /// Check if at least one price provider is available for a given asset type.
    #[must_use]
    pub fn is_provider_available(&self, asset_type: &AssetType) -> bool {
        self.price_service.has_provider_for(asset_type)
    }

    /// Get the names of available providers for a given asset type.
    #[must_use]
    pub fn get_provider_names(&self, asset_type: &AssetType) -> Vec<String> {
        self.price_service.get_provider_names(asset_type)
    }

    // ── Internal ────────────────────────────────────────────────────

    fn build(portfolio: Portfolio, store: Box<dyn KeyValueStore>, env_keys: ProviderKeys) -> Self {
        let registry = default_registry(&portfolio.settings, &env_keys);

        Self {
            portfolio,
            holdings_service: HoldingsService::new(),
            totals_service: TotalsService::new(),
            snapshot_service: SnapshotService::new(),
            chart_service: ChartService::new(),
            analytics_service: AnalyticsService::new(),
            price_service: PriceService::new(registry),
            store,
            env_keys,
            refreshing: false,
        }
    }

    fn rebuild_registry(&mut self) {
        let registry = default_registry(&self.portfolio.settings, &self.env_keys);
        self.price_service.set_registry(registry);
    }

    fn persist(&mut self) -> Result<(), CoreError> {
        StorageManager::save(self.store.as_mut(), &self.portfolio)
    }
}

/// Clears the refresh flag when dropped, including when the owning future
/// is cancelled mid-fetch.
struct BusyFlag<'a>(&'a mut bool);

impl Drop for BusyFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

fn default_registry(settings: &Settings, env_keys: &ProviderKeys) -> PriceProviderRegistry {
    let mut api_keys = settings.api_keys.clone();
    env_keys.fill_missing(&mut api_keys);
    PriceProviderRegistry::new_with_defaults(&api_keys)
}
