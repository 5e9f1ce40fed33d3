use serde::{Deserialize, Serialize};

/// The type/category of a tracked asset.
/// Determines which price provider is used and which `byType` bucket it lands in.
///
/// Serialized as a lowercase string (`"stock"`, `"crypto"`, ...). Any other
/// string is preserved as `Other` so older or hand-edited documents still load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssetType {
    /// Stocks / equities (AAPL, MSFT, etc.): Finnhub, Yahoo Finance fallback
    Stock,
    /// Cryptocurrencies: Finnhub, CoinCap fallback
    Crypto,
    /// Precious metals (gold, silver, ...): metals.dev
    Metal,
    /// Cash-equivalent savings; quantity is the amount in the base currency
    Savings,
    /// A type string this version does not recognize
    Other(String),
}

impl AssetType {
    /// The four types that have their own `byType` bucket, in display order.
    pub const KNOWN: [AssetType; 4] = [
        AssetType::Stock,
        AssetType::Crypto,
        AssetType::Metal,
        AssetType::Savings,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            AssetType::Stock => "stock",
            AssetType::Crypto => "crypto",
            AssetType::Metal => "metal",
            AssetType::Savings => "savings",
            AssetType::Other(s) => s,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, AssetType::Other(_))
    }
}

impl From<String> for AssetType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "stock" => AssetType::Stock,
            "crypto" => AssetType::Crypto,
            "metal" => AssetType::Metal,
            "savings" => AssetType::Savings,
            _ => AssetType::Other(s),
        }
    }
}

impl From<&str> for AssetType {
    fn from(s: &str) -> Self {
        AssetType::from(s.to_string())
    }
}

impl From<AssetType> for String {
    fn from(t: AssetType) -> Self {
        match t {
            AssetType::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite price-cache key: `(type, symbol)`.
///
/// Equality and hashing use both fields, so `stock:BTC` and `crypto:BTC`
/// never collide. The `"{type}:{symbol}"` text form exists only for
/// serialization; it is split at the FIRST colon because symbols such as
/// `BINANCE:BTCUSDT` may contain colons themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    pub asset_type: AssetType,
    pub symbol: String,
}

impl AssetKey {
    pub fn new(asset_type: AssetType, symbol: impl Into<String>) -> Self {
        Self {
            asset_type,
            symbol: symbol.into(),
        }
    }

    /// Parse the `"{type}:{symbol}"` text form.
    pub fn parse(s: &str) -> Option<Self> {
        let (asset_type, symbol) = s.split_once(':')?;
        if asset_type.is_empty() || symbol.is_empty() {
            return None;
        }
        Some(Self::new(AssetType::from(asset_type), symbol))
    }
}

impl std::fmt::Display for AssetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.asset_type, self.symbol)
    }
}

impl Serialize for AssetKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AssetKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        AssetKey::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid asset key '{s}'")))
    }
}

/// One person's share of an asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonHolding {
    #[serde(default)]
    pub qty: f64,

    /// Recorded but not used by any computation yet.
    #[serde(default)]
    pub avg_cost: f64,
}

impl PersonHolding {
    pub fn new(qty: f64) -> Self {
        Self { qty, avg_cost: 0.0 }
    }
}

/// The two-person quantity split of an asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Holdings {
    #[serde(default)]
    pub p1: PersonHolding,
    #[serde(default)]
    pub p2: PersonHolding,
}

impl Holdings {
    pub fn new(p1_qty: f64, p2_qty: f64) -> Self {
        Self {
            p1: PersonHolding::new(p1_qty),
            p2: PersonHolding::new(p2_qty),
        }
    }

    pub fn total_qty(&self) -> f64 {
        self.p1.qty + self.p2.qty
    }
}

/// A tracked holding. Identity is `id`; `(asset_type, symbol)` is the
/// price lookup key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,

    #[serde(rename = "type")]
    pub asset_type: AssetType,

    /// Ticker or provider symbol (e.g., "AAPL", "BINANCE:BTCUSDT", "XAU")
    pub symbol: String,

    /// Human-readable name (e.g., "Apple Inc.", "Gold")
    pub name: String,

    /// Display unit for metals ("oz", "g", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    pub holdings: Holdings,
}

impl Asset {
    /// Build an asset with a freshly generated id.
    pub fn new(new: NewAsset) -> Self {
        Self::with_id(generate_asset_id(), new)
    }

    /// Build an asset keeping an existing id (used for full-replace edits).
    pub fn with_id(id: impl Into<String>, new: NewAsset) -> Self {
        let new = new.normalized();
        Self {
            id: id.into(),
            asset_type: new.asset_type,
            symbol: new.symbol,
            name: new.name,
            unit: new.unit,
            holdings: Holdings::new(new.p1_qty, new.p2_qty),
        }
    }

    pub fn key(&self) -> AssetKey {
        AssetKey::new(self.asset_type.clone(), self.symbol.clone())
    }
}

/// Generate a new stable asset id.
pub fn generate_asset_id() -> String {
    format!("asset_{}", uuid::Uuid::new_v4().simple())
}

/// Form input for creating or replacing an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAsset {
    pub asset_type: AssetType,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub p1_qty: f64,
    #[serde(default)]
    pub p2_qty: f64,
}

impl NewAsset {
    pub fn new(
        asset_type: AssetType,
        symbol: impl Into<String>,
        name: impl Into<String>,
        p1_qty: f64,
        p2_qty: f64,
    ) -> Self {
        Self {
            asset_type,
            symbol: symbol.into(),
            name: name.into(),
            unit: None,
            p1_qty,
            p2_qty,
        }
    }

    /// Convenience constructors for the common asset types
    pub fn stock(
        symbol: impl Into<String>,
        name: impl Into<String>,
        p1_qty: f64,
        p2_qty: f64,
    ) -> Self {
        Self::new(AssetType::Stock, symbol, name, p1_qty, p2_qty)
    }

    pub fn crypto(
        symbol: impl Into<String>,
        name: impl Into<String>,
        p1_qty: f64,
        p2_qty: f64,
    ) -> Self {
        Self::new(AssetType::Crypto, symbol, name, p1_qty, p2_qty)
    }

    pub fn metal(
        symbol: impl Into<String>,
        name: impl Into<String>,
        unit: impl Into<String>,
        p1_qty: f64,
        p2_qty: f64,
    ) -> Self {
        Self {
            unit: Some(unit.into()),
            ..Self::new(AssetType::Metal, symbol, name, p1_qty, p2_qty)
        }
    }

    pub fn savings(name: impl Into<String>, p1_amount: f64, p2_amount: f64) -> Self {
        let name = name.into();
        Self::new(AssetType::Savings, name.clone(), name, p1_amount, p2_amount)
    }

    /// Trim text fields and drop the unit for anything that isn't a metal.
    pub fn normalized(self) -> Self {
        let unit = match self.asset_type {
            AssetType::Metal => self
                .unit
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty()),
            _ => None,
        };
        Self {
            symbol: self.symbol.trim().to_string(),
            name: self.name.trim().to_string(),
            unit,
            ..self
        }
    }
}
