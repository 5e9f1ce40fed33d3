use serde::{Deserialize, Serialize};

use super::asset::{Asset, AssetKey};
use super::price::{self, PriceCache};
use super::settings::Settings;
use super::snapshot::SnapshotHistory;

/// The main data container. Everything in here is persisted as one JSON
/// document, and the same document is what export/import exchange.
///
/// Contains: assets (two-person holdings), user settings, the price cache
/// (last fetched prices, for offline display) and the snapshot history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub settings: Settings,

    /// All tracked assets, in insertion order
    pub assets: Vec<Asset>,

    /// Derived data; an unreadable cache loads as empty.
    #[serde(default, deserialize_with = "price::deserialize_lenient")]
    pub price_cache: PriceCache,

    #[serde(default)]
    pub snapshots: SnapshotHistory,
}

impl Portfolio {
    pub fn find_asset(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    /// Whether any asset still prices under `key`.
    pub fn has_asset_with_key(&self, key: &AssetKey) -> bool {
        self.assets
            .iter()
            .any(|a| a.asset_type == key.asset_type && a.symbol == key.symbol)
    }
}
