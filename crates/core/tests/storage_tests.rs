// ═══════════════════════════════════════════════════════════════════
// Storage Tests: KeyValueStore impls, load/save, corrupt recovery,
// export/import validation
// ═══════════════════════════════════════════════════════════════════

use chrono::{TimeZone, Utc};
use serde_json::json;

use portfolio_tracker_core::errors::CoreError;
use portfolio_tracker_core::models::asset::{Asset, AssetKey, AssetType, NewAsset};
use portfolio_tracker_core::models::portfolio::Portfolio;
use portfolio_tracker_core::models::totals::Totals;
use portfolio_tracker_core::storage::format::{self, STATE_KEY};
use portfolio_tracker_core::storage::manager::StorageManager;
use portfolio_tracker_core::storage::store::{FileStore, KeyValueStore, MemoryStore};

/// A document as the browser version of the tracker saved it.
fn browser_document() -> serde_json::Value {
    json!({
        "settings": { "baseCurrency": "USD", "people": ["Dean", "Sam"] },
        "assets": [{
            "id": "asset_1718000000000",
            "type": "stock",
            "symbol": "AAA",
            "name": "Triple A",
            "holdings": { "p1": { "qty": 10, "avgCost": 0 }, "p2": { "qty": 0, "avgCost": 0 } }
        }],
        "priceCache": {
            "lastUpdated": 0,
            "prices": { "stock:AAA": 5 },
            "previousPrices": {}
        },
        "snapshots": [{
            "date": "2025-03-01T10:00:00.000Z",
            "timestamp": 1740823200000i64,
            "totalValue": 50,
            "deanTotal": 50,
            "samTotal": 0,
            "byType": { "stock": 50, "crypto": 0, "metal": 0, "savings": 0 },
            "assetCount": 1
        }]
    })
}

fn sample_portfolio() -> Portfolio {
    let mut p = Portfolio::default();
    p.settings.base_currency = "EUR".into();
    p.settings.people = ["Ada".into(), "Grace".into()];
    p.assets.push(Asset::new(NewAsset::stock("AAPL", "Apple", 3.0, 1.0)));
    p.assets.push(Asset::new(NewAsset::metal("XAU", "Gold", "oz", 1.0, 0.5)));
    p.price_cache
        .set_price(AssetKey::new(AssetType::Stock, "AAPL"), 180.0);
    p.price_cache
        .mark_updated(Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap());
    let mut totals = Totals::default();
    totals.combined.value = 720.0;
    p.snapshots.append(
        &totals,
        2,
        Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
    );
    p
}

// ── MemoryStore ─────────────────────────────────────────────────────

mod memory_store {
    use super::*;

    #[test]
    fn get_set_remove() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn clones_share_contents_and_count_writes() {
        let store = MemoryStore::new();
        let mut handle = store.clone();
        handle.set("a", "1").unwrap();
        handle.set("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("2"));
        assert_eq!(store.write_count(), 2);
    }
}

// ── FileStore ───────────────────────────────────────────────────────

mod file_store {
    use super::*;

    #[test]
    fn creates_directory_and_one_file_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("data");
        let mut store = FileStore::new(&root);

        assert_eq!(store.get(STATE_KEY).unwrap(), None);
        store.set(STATE_KEY, "{}").unwrap();

        let path = root.join("portfolio_v1.json");
        assert_eq!(store.path_for(STATE_KEY), path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
        assert_eq!(store.get(STATE_KEY).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path());
        store.remove("nothing").unwrap();
    }
}

// ── Load / Save ─────────────────────────────────────────────────────

mod load_save {
    use super::*;

    #[test]
    fn missing_document_gives_defaults() {
        let store = MemoryStore::new();
        assert_eq!(StorageManager::load(&store), Portfolio::default());
    }

    #[test]
    fn saved_document_loads_back() {
        let original = sample_portfolio();
        let mut store = MemoryStore::new();
        StorageManager::save(&mut store, &original).unwrap();
        assert_eq!(StorageManager::load(&store), original);
    }

    #[test]
    fn corrupt_document_gives_defaults() {
        let mut store = MemoryStore::new();
        store.set(STATE_KEY, "{not json").unwrap();
        assert_eq!(StorageManager::load(&store), Portfolio::default());

        store.set(STATE_KEY, r#"{"assets": 5, "settings": {}}"#).unwrap();
        assert_eq!(StorageManager::load(&store), Portfolio::default());
    }

    #[test]
    fn corrupt_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("portfolio_v1.json"), [0xFF, 0xFE, 0x00]).unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(StorageManager::load(&store), Portfolio::default());
    }

    #[test]
    fn browser_document_loads_with_assets() {
        let mut store = MemoryStore::new();
        store.set(STATE_KEY, &browser_document().to_string()).unwrap();

        let p = StorageManager::load(&store);
        assert_eq!(p.assets.len(), 1);
        assert_eq!(p.settings.people[0], "Dean");
        assert_eq!(
            p.price_cache.get_price(&AssetKey::new(AssetType::Stock, "AAA")),
            Some(5.0)
        );
        assert_eq!(p.price_cache.last_updated, None);
        assert_eq!(p.snapshots.as_slice()[0].p1_total, 50.0);
    }

    #[test]
    fn unreadable_price_cache_keeps_rest_of_document() {
        let mut doc = browser_document();
        doc["priceCache"] = json!({ "lastUpdated": "yesterday", "prices": [1, 2] });
        let mut store = MemoryStore::new();
        store.set(STATE_KEY, &doc.to_string()).unwrap();

        let p = StorageManager::load(&store);
        assert_eq!(p.assets.len(), 1);
        assert!(p.price_cache.is_empty());
        assert_eq!(p.snapshots.len(), 1);
    }

    #[test]
    fn parse_stored_document_error_kind() {
        let err = format::parse_stored_document("[]").unwrap_err();
        assert!(matches!(err, CoreError::MalformedStoredState(_)));
    }
}

// ── Export / Import ─────────────────────────────────────────────────

mod export_import {
    use super::*;

    #[test]
    fn export_is_pretty_camel_case_json() {
        let json = StorageManager::export_to_json(&sample_portfolio()).unwrap();
        assert!(json.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["settings"]["baseCurrency"], "EUR");
        assert_eq!(value["assets"][1]["unit"], "oz");
        assert_eq!(value["snapshots"][0]["totalValue"], 720.0);
    }

    #[test]
    fn export_then_import_restores_document() {
        let original = sample_portfolio();
        let json = StorageManager::export_to_json(&original).unwrap();
        assert_eq!(StorageManager::import_from_json(&json).unwrap(), original);
    }

    #[test]
    fn import_minimal_document() {
        let doc = json!({ "settings": {}, "assets": [] }).to_string();
        let p = StorageManager::import_from_json(&doc).unwrap();
        assert!(p.assets.is_empty());
        assert!(p.snapshots.is_empty());
        assert_eq!(p.settings.base_currency, "USD");
    }

    #[test]
    fn import_browser_document() {
        let p = StorageManager::import_from_json(&browser_document().to_string()).unwrap();
        assert_eq!(p.assets[0].holdings.p1.qty, 10.0);
        assert_eq!(p.price_cache.len(), 1);

        let mut doc = browser_document();
        doc["priceCache"] = json!(42);
        let p = StorageManager::import_from_json(&doc.to_string()).unwrap();
        assert_eq!(p.assets.len(), 1);
        assert!(p.price_cache.is_empty());
    }

    #[test]
    fn shape_validation() {
        let cases = [
            json!([]),
            json!("text"),
            json!({ "settings": {} }),
            json!({ "assets": [] }),
            json!({ "assets": {}, "settings": {} }),
            json!({ "assets": [], "settings": [] }),
            json!({ "assets": [], "settings": null }),
        ];
        for doc in cases {
            let err = format::validate_import_document(&doc).unwrap_err();
            assert!(matches!(err, CoreError::MalformedImport(_)), "accepted {doc}");
        }
    }

    #[test]
    fn invalid_json_and_bad_fields_are_malformed_import() {
        assert!(matches!(
            StorageManager::import_from_json("not json"),
            Err(CoreError::MalformedImport(_))
        ));

        let bad_asset = json!({ "settings": {}, "assets": [{ "id": "x" }] }).to_string();
        assert!(matches!(
            StorageManager::import_from_json(&bad_asset),
            Err(CoreError::MalformedImport(_))
        ));
    }

    #[test]
    fn export_to_file_and_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format::EXPORT_FILE_NAME);
        let path = path.to_str().unwrap();

        let original = sample_portfolio();
        StorageManager::export_to_file(&original, path).unwrap();
        assert_eq!(StorageManager::import_from_file(path).unwrap(), original);
    }
}
