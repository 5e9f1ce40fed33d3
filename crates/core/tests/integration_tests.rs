// ═══════════════════════════════════════════════════════════════════
// Integration Tests: PortfolioTracker end to end with mock providers
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use portfolio_tracker_core::config::ProviderKeys;
use portfolio_tracker_core::errors::CoreError;
use portfolio_tracker_core::models::analytics::{SortColumn, TableQuery};
use portfolio_tracker_core::models::asset::{AssetKey, AssetType, NewAsset};
use portfolio_tracker_core::models::price::Quote;
use portfolio_tracker_core::models::range::RangeWindow;
use portfolio_tracker_core::models::snapshot::MAX_SNAPSHOTS;
use portfolio_tracker_core::providers::registry::{PriceProviderRegistry, FINNHUB_KEY};
use portfolio_tracker_core::providers::traits::{PriceProvider, RateProvider};
use portfolio_tracker_core::storage::format::STATE_KEY;
use portfolio_tracker_core::storage::store::{KeyValueStore, MemoryStore};
use portfolio_tracker_core::PortfolioTracker;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const T: i64 = 1_750_000_000_000;

// ═══════════════════════════════════════════════════════════════════
// Mock Price Provider (for testing without real API calls)
// ═══════════════════════════════════════════════════════════════════

/// Prices come from a shared table the test can change between refreshes.
struct MockPriceProvider {
    types: Vec<AssetType>,
    prices: Arc<Mutex<HashMap<String, f64>>>,
}

#[async_trait]
impl PriceProvider for MockPriceProvider {
    fn name(&self) -> &str {
        "MockProvider"
    }

    fn supported_asset_types(&self) -> Vec<AssetType> {
        self.types.clone()
    }

    async fn get_current_price(&self, symbol: &str, currency: &str) -> Result<Quote, CoreError> {
        let price = self.prices.lock().unwrap().get(symbol).copied();
        price
            .map(|p| Quote::new(p, "USD"))
            .ok_or_else(|| CoreError::PriceNotAvailable {
                symbol: symbol.to_string(),
                currency: currency.to_string(),
            })
    }
}

/// Never answers, like a provider whose request hangs.
struct StalledProvider;

#[async_trait]
impl PriceProvider for StalledProvider {
    fn name(&self) -> &str {
        "Stalled"
    }

    fn supported_asset_types(&self) -> Vec<AssetType> {
        vec![AssetType::Stock]
    }

    async fn get_current_price(&self, _symbol: &str, _currency: &str) -> Result<Quote, CoreError> {
        futures::future::pending().await
    }
}

struct FixedRates;

#[async_trait]
impl RateProvider for FixedRates {
    fn name(&self) -> &str {
        "FixedRates"
    }

    async fn get_rate(&self, from: &str, to: &str) -> Result<f64, CoreError> {
        match (from, to) {
            ("USD", "EUR") => Ok(0.5),
            _ => Err(CoreError::Api {
                provider: "FixedRates".into(),
                message: format!("no rate {from}->{to}"),
            }),
        }
    }
}

struct Harness {
    tracker: PortfolioTracker,
    store: MemoryStore,
    prices: Arc<Mutex<HashMap<String, f64>>>,
}

impl Harness {
    fn new() -> Self {
        let store = MemoryStore::new();
        Self::with_store(store)
    }

    fn with_store(store: MemoryStore) -> Self {
        let prices = Arc::new(Mutex::new(HashMap::new()));
        let mut registry = PriceProviderRegistry::new();
        registry.register(Box::new(MockPriceProvider {
            types: vec![AssetType::Stock, AssetType::Crypto, AssetType::Metal],
            prices: prices.clone(),
        }));
        registry.register(Box::new(
            portfolio_tracker_core::providers::savings::SavingsProvider::new(),
        ));

        let tracker =
            PortfolioTracker::open_with_keys(Box::new(store.clone()), ProviderKeys::default())
                .with_registry(registry)
                .with_rate_provider(Box::new(FixedRates));
        Self {
            tracker,
            store,
            prices,
        }
    }

    fn set_price(&self, symbol: &str, price: f64) {
        self.prices.lock().unwrap().insert(symbol.to_string(), price);
    }
}

fn at(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// Asset lifecycle
// ═══════════════════════════════════════════════════════════════════

mod assets {
    use super::*;

    #[test]
    fn every_mutation_persists() {
        let mut h = Harness::new();
        let id = h
            .tracker
            .add_asset(NewAsset::stock("AAA", "Triple A", 10.0, 0.0))
            .unwrap();
        assert_eq!(h.store.write_count(), 1);

        h.tracker
            .update_asset(&id, NewAsset::stock("AAA", "Triple A", 10.0, 5.0))
            .unwrap();
        assert_eq!(h.store.write_count(), 2);

        let reopened =
            PortfolioTracker::open_with_keys(Box::new(h.store.clone()), ProviderKeys::default());
        assert_eq!(reopened.get_asset(&id).unwrap().holdings.p2.qty, 5.0);

        h.tracker.delete_asset(&id).unwrap();
        assert_eq!(h.store.write_count(), 3);
        assert!(h.tracker.assets().is_empty());
    }

    #[test]
    fn validation_failure_does_not_write() {
        let mut h = Harness::new();
        let err = h.tracker.add_asset(NewAsset::stock("", "Nameless", 1.0, 0.0));
        assert!(matches!(err, Err(CoreError::ValidationError(_))));
        assert_eq!(h.store.write_count(), 0);
    }

    #[test]
    fn delete_unknown_asset() {
        let mut h = Harness::new();
        assert!(matches!(
            h.tracker.delete_asset("asset_missing"),
            Err(CoreError::AssetNotFound(_))
        ));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Price refresh
// ═══════════════════════════════════════════════════════════════════

mod refresh {
    use super::*;

    #[tokio::test]
    async fn refresh_prices_and_totals_example() {
        let mut h = Harness::new();
        h.tracker
            .add_asset(NewAsset::stock("AAA", "Triple A", 10.0, 0.0))
            .unwrap();
        h.set_price("AAA", 5.0);

        let report = h.tracker.refresh_prices().await.unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.errors, 0);
        assert_eq!(report.total, 1);

        let totals = h.tracker.totals();
        assert_eq!(totals.p1.value, 50.0);
        assert_eq!(totals.p2.value, 0.0);
        assert_eq!(totals.combined.value, 50.0);
        assert_eq!(totals.by_type.stock, 50.0);
        assert!(h.tracker.last_updated().is_some());
        assert!(!h.tracker.is_refreshing());
    }

    #[tokio::test]
    async fn failures_are_counted_not_fatal() {
        let mut h = Harness::new();
        h.tracker.add_asset(NewAsset::stock("AAA", "A", 1.0, 0.0)).unwrap();
        h.tracker.add_asset(NewAsset::crypto("NOPE", "Unknown", 1.0, 0.0)).unwrap();
        h.tracker.add_asset(NewAsset::savings("Cash", 100.0, 50.0)).unwrap();
        h.set_price("AAA", 2.0);

        let report = h.tracker.refresh_prices().await.unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.updated, 2);
        assert_eq!(report.errors, 1);
        assert_eq!(report.failed, vec![AssetKey::new(AssetType::Crypto, "NOPE")]);
        assert_eq!(h.tracker.totals().by_type.savings, 150.0);
    }

    #[tokio::test]
    async fn second_refresh_sets_change_percent() {
        let mut h = Harness::new();
        h.tracker.add_asset(NewAsset::stock("AAA", "A", 2.0, 0.0)).unwrap();
        h.set_price("AAA", 10.0);
        h.tracker.refresh_prices().await.unwrap();
        h.set_price("AAA", 12.0);
        h.tracker.refresh_prices().await.unwrap();

        let key = AssetKey::new(AssetType::Stock, "AAA");
        let entry = h.tracker.price_cache().get(&key).unwrap();
        assert_eq!(entry.previous_price, Some(10.0));
        assert!((entry.change_percent.unwrap() - 20.0).abs() < 1e-9);

        let perf = h.tracker.performers();
        assert_eq!(perf.top[0].symbol, "AAA");
        assert_eq!(h.tracker.performance_scatter().len(), 1);
    }

    #[tokio::test]
    async fn busy_guard_rejects_overlapping_refresh() {
        let mut h = Harness::new();
        h.tracker.add_asset(NewAsset::stock("AAA", "A", 1.0, 0.0)).unwrap();
        h.set_price("AAA", 3.0);

        let plan = h.tracker.begin_refresh().unwrap();
        assert!(h.tracker.is_refreshing());
        assert!(matches!(
            h.tracker.begin_refresh(),
            Err(CoreError::RefreshInProgress)
        ));
        assert!(matches!(
            h.tracker.refresh_prices().await,
            Err(CoreError::RefreshInProgress)
        ));

        let outcome = h.tracker.fetch_planned(&plan).await;
        let report = h.tracker.finish_refresh(outcome, at(T)).unwrap();
        assert_eq!(report.updated, 1);
        assert!(!h.tracker.is_refreshing());
        assert_eq!(h.tracker.last_updated(), Some(at(T)));
        assert!(h.tracker.begin_refresh().is_ok());
    }

    #[tokio::test]
    async fn asset_deleted_mid_refresh_gets_no_price() {
        let mut h = Harness::new();
        let id = h.tracker.add_asset(NewAsset::stock("AAA", "A", 1.0, 0.0)).unwrap();
        h.set_price("AAA", 3.0);

        let plan = h.tracker.begin_refresh().unwrap();
        let outcome = h.tracker.fetch_planned(&plan).await;
        h.tracker.delete_asset(&id).unwrap();
        let report = h.tracker.finish_refresh(outcome, at(T)).unwrap();

        assert_eq!(report.updated, 0);
        assert!(h.tracker.price_cache().is_empty());
    }

    #[tokio::test]
    async fn dropped_refresh_does_not_stay_busy() {
        let mut registry = PriceProviderRegistry::new();
        registry.register(Box::new(StalledProvider));
        let mut tracker = PortfolioTracker::create_new().with_registry(registry);
        tracker.add_asset(NewAsset::stock("AAA", "A", 1.0, 0.0)).unwrap();

        let result =
            tokio::time::timeout(Duration::from_millis(50), tracker.refresh_prices()).await;
        assert!(result.is_err());

        assert!(!tracker.is_refreshing());
        assert!(tracker.price_cache().is_empty());
        assert!(tracker.last_updated().is_none());
        assert!(tracker.begin_refresh().is_ok());
    }

    #[test]
    fn cancel_refresh_releases_busy_flag() {
        let mut h = Harness::new();
        h.tracker.add_asset(NewAsset::stock("AAA", "A", 1.0, 0.0)).unwrap();

        assert!(!h.tracker.cancel_refresh());
        h.tracker.begin_refresh().unwrap();
        assert!(h.tracker.cancel_refresh());
        assert!(!h.tracker.is_refreshing());
        assert!(h.tracker.begin_refresh().is_ok());
    }

    #[tokio::test]
    async fn prices_converted_to_base_currency() {
        let mut h = Harness::new();
        h.tracker.set_base_currency("eur").unwrap();
        h.tracker.add_asset(NewAsset::stock("AAA", "A", 4.0, 0.0)).unwrap();
        h.set_price("AAA", 10.0);

        h.tracker.refresh_prices().await.unwrap();
        assert_eq!(h.tracker.totals().combined.value, 20.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Snapshots & charts
// ═══════════════════════════════════════════════════════════════════

mod snapshots {
    use super::*;

    #[tokio::test]
    async fn save_snapshot_captures_current_totals() {
        let mut h = Harness::new();
        h.tracker.add_asset(NewAsset::stock("AAA", "A", 10.0, 0.0)).unwrap();
        h.set_price("AAA", 5.0);
        h.tracker.refresh_prices().await.unwrap();

        let snap = h.tracker.save_snapshot(at(T)).unwrap();
        assert_eq!(snap.total_value, 50.0);
        assert_eq!(snap.asset_count, 1);
        assert_eq!(h.tracker.snapshots().len(), 1);
    }

    #[test]
    fn history_caps_at_max() {
        let mut h = Harness::new();
        for i in 0..(MAX_SNAPSHOTS as i64 + 3) {
            h.tracker.save_snapshot(at(T + i * 1000)).unwrap();
        }
        assert_eq!(h.tracker.snapshots().len(), MAX_SNAPSHOTS);
        assert_eq!(h.tracker.snapshots()[0].timestamp, T + 3000);
        assert_eq!(
            h.tracker.snapshots_newest_first()[0].timestamp,
            T + (MAX_SNAPSHOTS as i64 + 2) * 1000
        );
    }

    #[test]
    fn same_instant_snapshots_are_kept_and_deleted_together() {
        let mut h = Harness::new();
        h.tracker.save_snapshot(at(T)).unwrap();
        h.tracker.save_snapshot(at(T)).unwrap();
        assert_eq!(h.tracker.snapshots().len(), 2);

        assert_eq!(h.tracker.delete_snapshot(T).unwrap(), 2);
        assert!(h.tracker.snapshots().is_empty());
    }

    #[test]
    fn delete_and_clear() {
        let mut h = Harness::new();
        h.tracker.save_snapshot(at(T)).unwrap();
        h.tracker.save_snapshot(at(T + 1)).unwrap();
        let writes = h.store.write_count();

        assert_eq!(h.tracker.delete_snapshot(T).unwrap(), 1);
        assert_eq!(h.tracker.delete_snapshot(T).unwrap(), 0);
        assert_eq!(h.store.write_count(), writes + 1);

        h.tracker.clear_snapshots().unwrap();
        assert!(h.tracker.snapshots().is_empty());
    }

    #[test]
    fn charts_follow_window() {
        let mut h = Harness::new();
        for offset in [8, 3, 1] {
            h.tracker.save_snapshot(at(T - offset * DAY_MS)).unwrap();
        }
        let filtered = h.tracker.filter_snapshots(RangeWindow::SevenDays, at(T));
        assert_eq!(filtered.len(), 2);

        assert!(h.tracker.delta_chart(RangeWindow::SevenDays, at(T)).is_ready());
        assert!(!h.tracker.delta_chart(RangeWindow::OneDay, at(T)).is_ready());

        let returns = h
            .tracker
            .cumulative_return_chart(RangeWindow::All, at(T))
            .into_data()
            .unwrap();
        assert_eq!(returns[0].return_pct, 0.0);

        let composition = h
            .tracker
            .composition_chart(RangeWindow::ThirtyDays, at(T))
            .into_data()
            .unwrap();
        assert_eq!(composition.timestamps.len(), 3);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Views
// ═══════════════════════════════════════════════════════════════════

mod views {
    use super::*;

    #[tokio::test]
    async fn table_allocation_and_split() {
        let mut h = Harness::new();
        h.tracker.add_asset(NewAsset::stock("AAA", "Alpha", 3.0, 0.0)).unwrap();
        h.tracker.add_asset(NewAsset::savings("Cash", 50.0, 50.0)).unwrap();
        h.set_price("AAA", 100.0);
        h.tracker.refresh_prices().await.unwrap();

        let rows = h
            .tracker
            .holdings_table(&TableQuery::new().sorted_by(SortColumn::Combined, true));
        assert_eq!(rows[0].symbol, "Cash");
        assert_eq!(rows[1].allocation_pct, 75.0);

        let alloc = h.tracker.type_allocation();
        let stock = alloc.iter().find(|a| a.asset_type == AssetType::Stock).unwrap();
        assert_eq!(stock.percent, 75.0);

        let split = h.tracker.savings_split();
        assert_eq!(split.savings, 100.0);
        assert_eq!(split.invested_pct, 75.0);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Export / Import through the tracker
// ═══════════════════════════════════════════════════════════════════

mod import_export {
    use super::*;

    #[test]
    fn import_missing_assets_changes_nothing() {
        let mut h = Harness::new();
        h.tracker.add_asset(NewAsset::stock("AAA", "A", 1.0, 0.0)).unwrap();
        let before = h.tracker.portfolio().clone();
        let writes = h.store.write_count();

        let err = h
            .tracker
            .import_json(r#"{"settings": {"baseCurrency": "EUR"}}"#)
            .unwrap_err();

        assert!(matches!(err, CoreError::MalformedImport(_)));
        assert_eq!(h.tracker.portfolio(), &before);
        assert_eq!(h.store.write_count(), writes);
    }

    #[test]
    fn export_import_replaces_state() {
        let mut source = Harness::new();
        source.tracker.add_asset(NewAsset::crypto("BTC", "Bitcoin", 0.5, 2.0)).unwrap();
        source.tracker.set_people("Ada", "Grace").unwrap();
        source.tracker.save_snapshot(at(T)).unwrap();
        let exported = source.tracker.export_json().unwrap();

        let mut target = Harness::new();
        target.tracker.add_asset(NewAsset::stock("OLD", "Old", 1.0, 0.0)).unwrap();
        target.tracker.import_json(&exported).unwrap();

        assert_eq!(target.tracker.portfolio(), source.tracker.portfolio());
        let stored = target.store.get(STATE_KEY).unwrap().unwrap();
        assert!(stored.contains("Bitcoin"));
    }

    const BROWSER_DOCUMENT: &str = r#"{
        "settings": { "baseCurrency": "USD", "people": ["Dean", "Sam"] },
        "assets": [{
            "id": "asset_1718000000000",
            "type": "stock",
            "symbol": "AAA",
            "name": "Triple A",
            "holdings": { "p1": { "qty": 10, "avgCost": 0 }, "p2": { "qty": 0, "avgCost": 0 } }
        }],
        "priceCache": { "lastUpdated": 0, "prices": { "stock:AAA": 5 }, "previousPrices": {} },
        "snapshots": []
    }"#;

    #[test]
    fn import_browser_document() {
        let mut h = Harness::new();
        h.tracker.import_json(BROWSER_DOCUMENT).unwrap();
        assert_eq!(h.tracker.assets().len(), 1);
        assert_eq!(h.tracker.totals().combined.value, 50.0);
        assert_eq!(h.tracker.last_updated(), None);
    }

    #[test]
    fn open_keeps_browser_document() {
        let mut store = MemoryStore::new();
        store.set(STATE_KEY, BROWSER_DOCUMENT).unwrap();
        let h = Harness::with_store(store);
        assert_eq!(h.tracker.assets().len(), 1);
        assert_eq!(h.tracker.get_settings().people[1], "Sam");
        assert_eq!(h.tracker.totals().p1.value, 50.0);
    }

    #[test]
    fn open_recovers_from_corrupt_store() {
        let mut store = MemoryStore::new();
        store.set(STATE_KEY, "definitely not json").unwrap();
        let h = Harness::with_store(store);
        assert!(h.tracker.assets().is_empty());
        assert_eq!(h.tracker.get_settings().base_currency, "USD");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Settings
// ═══════════════════════════════════════════════════════════════════

mod settings {
    use super::*;

    #[test]
    fn base_currency_validation() {
        let mut h = Harness::new();
        h.tracker.set_base_currency(" pln ").unwrap();
        assert_eq!(h.tracker.get_settings().base_currency, "PLN");

        for bad in ["", "EURO", "U5D", "€€€"] {
            assert!(matches!(
                h.tracker.set_base_currency(bad),
                Err(CoreError::ValidationError(_))
            ));
        }
        assert_eq!(h.tracker.get_settings().base_currency, "PLN");
    }

    #[test]
    fn people_names() {
        let mut h = Harness::new();
        h.tracker.set_people(" Ada ", "Grace").unwrap();
        assert_eq!(h.tracker.get_settings().people, ["Ada".to_string(), "Grace".to_string()]);
        assert!(h.tracker.set_people("", "Grace").is_err());
    }

    #[test]
    fn api_keys_rebuild_registry() {
        let mut h = Harness::new();
        h.tracker.set_api_key(FINNHUB_KEY, "token").unwrap();
        assert_eq!(
            h.tracker.get_provider_names(&AssetType::Stock)[0],
            "Finnhub"
        );
        assert!(h.tracker.remove_api_key(FINNHUB_KEY).unwrap());
        assert!(!h.tracker.remove_api_key(FINNHUB_KEY).unwrap());
        assert!(!h
            .tracker
            .get_provider_names(&AssetType::Stock)
            .contains(&"Finnhub".to_string()));
        assert!(h.tracker.set_api_key(FINNHUB_KEY, "  ").is_err());
    }

    #[test]
    fn environment_keys_fill_missing_settings_keys() {
        let keys = ProviderKeys {
            finnhub: Some("from-env".into()),
            metals_dev: None,
        };
        let tracker = PortfolioTracker::open_with_keys(Box::new(MemoryStore::new()), keys);
        assert!(tracker.is_provider_available(&AssetType::Crypto));
        assert_eq!(tracker.get_provider_names(&AssetType::Crypto)[0], "Finnhub");
        assert!(tracker.get_settings().api_keys.is_empty());
    }

    #[test]
    fn fill_missing_keeps_user_keys() {
        let keys = ProviderKeys {
            finnhub: Some("from-env".into()),
            metals_dev: Some("metals-env".into()),
        };
        let mut map = HashMap::from([(FINNHUB_KEY.to_string(), "user".to_string())]);
        assert!(keys.fill_missing(&mut map));
        assert_eq!(map[FINNHUB_KEY], "user");
        assert_eq!(map["metals_dev"], "metals-env");
        assert!(!keys.fill_missing(&mut map));
    }
}
