use chrono::{DateTime, TimeZone, Utc};
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::asset::AssetKey;

/// A price plus the currency it is denominated in, as returned by providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: f64,
    pub currency: String,
}

impl Quote {
    pub fn new(price: f64, currency: impl Into<String>) -> Self {
        Self {
            price,
            currency: currency.into().to_uppercase(),
        }
    }
}

/// Last-known price of one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceEntry {
    pub price: f64,

    /// The `price` of the refresh before the latest one. One cycle deep only.
    #[serde(default)]
    pub previous_price: Option<f64>,

    /// `(price - previous) / previous * 100`, absent without a usable previous price.
    #[serde(default)]
    pub change_percent: Option<f64>,
}

/// Local cache of current prices, keyed by `(type, symbol)`.
///
/// Stored inside the portfolio document so values survive restarts and
/// the app keeps working offline with the last fetched prices. On disk it
/// is `{ lastUpdated, prices, previousPrices }` with `lastUpdated` in epoch
/// milliseconds (0 = never); change percents are derived on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredPriceCache", into = "StoredPriceCache")]
pub struct PriceCache {
    pub entries: HashMap<AssetKey, PriceEntry>,

    /// When the last refresh completed, to the millisecond. `None` = never.
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredPriceCache {
    last_updated: i64,
    prices: HashMap<AssetKey, f64>,
    previous_prices: HashMap<AssetKey, f64>,
}

impl From<StoredPriceCache> for PriceCache {
    fn from(stored: StoredPriceCache) -> Self {
        let mut previous = stored.previous_prices;
        let entries = stored
            .prices
            .into_iter()
            .map(|(key, price)| {
                let previous_price = previous.remove(&key);
                let entry = PriceEntry {
                    price,
                    previous_price,
                    change_percent: change_percent(price, previous_price),
                };
                (key, entry)
            })
            .collect();
        Self {
            entries,
            last_updated: millis_to_datetime(stored.last_updated),
        }
    }
}

impl From<PriceCache> for StoredPriceCache {
    fn from(cache: PriceCache) -> Self {
        let mut stored = StoredPriceCache {
            last_updated: cache.last_updated.map_or(0, |t| t.timestamp_millis()),
            ..StoredPriceCache::default()
        };
        for (key, entry) in cache.entries {
            if let Some(prev) = entry.previous_price {
                stored.previous_prices.insert(key.clone(), prev);
            }
            stored.prices.insert(key, entry.price);
        }
        stored
    }
}

/// Read a stored price cache, replacing an unreadable one with an empty
/// cache. The cache is rebuilt by the next refresh, so it never blocks
/// loading the rest of the document.
pub(crate) fn deserialize_lenient<'de, D>(deserializer: D) -> Result<PriceCache, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(PriceCache::deserialize(raw).unwrap_or_else(|e| {
        warn!("Discarding unreadable price cache: {e}");
        PriceCache::default()
    }))
}

fn change_percent(price: f64, previous: Option<f64>) -> Option<f64> {
    previous
        .filter(|p| *p > 0.0)
        .map(|p| (price - p) / p * 100.0)
}

fn millis_to_datetime(ms: i64) -> Option<DateTime<Utc>> {
    if ms <= 0 {
        return None;
    }
    Utc.timestamp_millis_opt(ms).single()
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &AssetKey) -> Option<&PriceEntry> {
        self.entries.get(key)
    }

    /// Current price for `key`, if one was ever fetched.
    pub fn get_price(&self, key: &AssetKey) -> Option<f64> {
        self.entries.get(key).map(|e| e.price)
    }

    pub fn change_percent(&self, key: &AssetKey) -> Option<f64> {
        self.entries.get(key).and_then(|e| e.change_percent)
    }

    /// Store a freshly fetched price, shifting the old one into `previous_price`.
    pub fn set_price(&mut self, key: AssetKey, price: f64) {
        let previous = self.entries.get(&key).map(|e| e.price);
        self.entries.insert(
            key,
            PriceEntry {
                price,
                previous_price: previous,
                change_percent: change_percent(price, previous),
            },
        );
    }

    /// Drop the entry for `key`. Returns `true` if one existed.
    pub fn remove(&mut self, key: &AssetKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Stamp the cache. Kept at millisecond precision, as stored.
    pub fn mark_updated(&mut self, at: DateTime<Utc>) {
        self.last_updated = millis_to_datetime(at.timestamp_millis());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all cached data.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_updated = None;
    }
}

/// Outcome of one price refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    /// Keys whose cached price was written.
    pub updated: usize,

    /// Keys that got no usable price.
    pub errors: usize,

    /// Keys the refresh attempted.
    pub total: usize,

    /// The keys counted in `errors`.
    #[serde(default)]
    pub failed: Vec<AssetKey>,
}
