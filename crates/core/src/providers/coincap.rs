use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;

use super::http::{self, api_error};
use super::traits::PriceProvider;
use crate::errors::CoreError;
use crate::models::asset::AssetType;
use crate::models::price::Quote;

const BASE_URL: &str = "https://api.coincap.io/v2";
const PROVIDER: &str = "CoinCap";

/// Quote currencies stripped from exchange pairs, longest first.
const PAIR_QUOTES: [&str; 4] = ["USDT", "USDC", "BUSD", "USD"];

/// Coins whose CoinCap id is not simply the lowercased ticker.
const KNOWN_IDS: &[(&str, &str)] = &[
    ("BTC", "bitcoin"),
    ("ETH", "ethereum"),
    ("SOL", "solana"),
    ("XRP", "xrp"),
    ("ADA", "cardano"),
    ("DOGE", "dogecoin"),
    ("DOT", "polkadot"),
    ("LTC", "litecoin"),
    ("AVAX", "avalanche"),
    ("LINK", "chainlink"),
    ("BNB", "binance-coin"),
    ("XLM", "stellar"),
    ("XMR", "monero"),
    ("TRX", "tron"),
];

/// Keyless crypto prices in USD, used behind Finnhub.
///
/// Holdings store Finnhub-style pairs (`BINANCE:BTCUSDT`), so each symbol
/// is reduced to its base coin before lookup. Coins outside [`KNOWN_IDS`]
/// are found through `/assets?search=` and remembered for the session.
pub struct CoinCapProvider {
    client: Client,
    searched: Mutex<HashMap<String, String>>,
}

impl CoinCapProvider {
    pub fn new() -> Self {
        Self {
            client: http::client(),
            searched: Mutex::new(HashMap::new()),
        }
    }

    /// `BINANCE:BTCUSDT` → `BTC`, `eth` → `ETH`. A bare quote currency
    /// (`USDT`, `BUSD`) is returned unchanged, and the base left after
    /// stripping must be at least two characters.
    pub fn base_symbol(symbol: &str) -> String {
        let pair = symbol
            .rsplit(':')
            .next()
            .unwrap_or(symbol)
            .trim()
            .to_uppercase();
        if PAIR_QUOTES.contains(&pair.as_str()) {
            return pair;
        }
        PAIR_QUOTES
            .iter()
            .find_map(|q| pair.strip_suffix(q).filter(|base| base.len() >= 2))
            .map(str::to_string)
            .unwrap_or(pair)
    }

    /// Best offline guess at the CoinCap id: the static table, then earlier
    /// search hits, then the lowercased ticker.
    pub fn resolve_id(&self, symbol: &str) -> String {
        let coin = Self::base_symbol(symbol);
        self.lookup(&coin).unwrap_or_else(|| coin.to_lowercase())
    }

    fn lookup(&self, coin: &str) -> Option<String> {
        if let Some((_, id)) = KNOWN_IDS.iter().find(|(ticker, _)| *ticker == coin) {
            return Some((*id).to_string());
        }
        let searched = self.searched.lock().unwrap_or_else(|e| e.into_inner());
        searched.get(coin).cloned()
    }

    async fn id_for(&self, symbol: &str) -> Result<String, CoreError> {
        let coin = Self::base_symbol(symbol);
        if let Some(id) = self.lookup(&coin) {
            return Ok(id);
        }

        let request = self
            .client
            .get(format!("{BASE_URL}/assets"))
            .query(&[("search", coin.as_str()), ("limit", "5")]);
        let found: SearchResponse = http::get_json(request, PROVIDER, &coin).await?;

        let id = found
            .data
            .into_iter()
            .find(|hit| hit.symbol.eq_ignore_ascii_case(&coin))
            .map(|hit| hit.id)
            .ok_or_else(|| api_error(PROVIDER, format!("No asset matches {coin}")))?;

        self.searched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(coin, id.clone());
        Ok(id)
    }
}

impl Default for CoinCapProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct AssetResponse {
    data: AssetBody,
}

#[derive(Deserialize)]
struct AssetBody {
    /// Decimal string, absent for delisted coins
    #[serde(rename = "priceUsd")]
    price_usd: Option<String>,
}

#[derive(Deserialize)]
struct SearchResponse {
    data: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    id: String,
    symbol: String,
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl PriceProvider for CoinCapProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn supported_asset_types(&self) -> Vec<AssetType> {
        vec![AssetType::Crypto]
    }

    async fn get_current_price(&self, symbol: &str, _currency: &str) -> Result<Quote, CoreError> {
        let id = self.id_for(symbol).await?;
        let request = self.client.get(format!("{BASE_URL}/assets/{id}"));
        let asset: AssetResponse = http::get_json(request, PROVIDER, symbol).await?;

        let price = asset
            .data
            .price_usd
            .and_then(|p| p.parse::<f64>().ok())
            .ok_or_else(|| CoreError::PriceNotAvailable {
                symbol: symbol.to_string(),
                currency: "USD".to_string(),
            })?;
        Ok(Quote::new(price, "USD"))
    }
}
