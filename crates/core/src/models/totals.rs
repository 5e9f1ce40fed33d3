use serde::{Deserialize, Serialize};

use super::asset::AssetType;

/// Value per known asset type. Unknown types have no bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeBreakdown {
    #[serde(default)]
    pub stock: f64,
    #[serde(default)]
    pub crypto: f64,
    #[serde(default)]
    pub metal: f64,
    #[serde(default)]
    pub savings: f64,
}

impl TypeBreakdown {
    pub fn get(&self, asset_type: &AssetType) -> Option<f64> {
        match asset_type {
            AssetType::Stock => Some(self.stock),
            AssetType::Crypto => Some(self.crypto),
            AssetType::Metal => Some(self.metal),
            AssetType::Savings => Some(self.savings),
            AssetType::Other(_) => None,
        }
    }

    /// Add `value` to the bucket for `asset_type`.
    /// Returns `false` (and changes nothing) for unknown types.
    pub fn add(&mut self, asset_type: &AssetType, value: f64) -> bool {
        let bucket = match asset_type {
            AssetType::Stock => &mut self.stock,
            AssetType::Crypto => &mut self.crypto,
            AssetType::Metal => &mut self.metal,
            AssetType::Savings => &mut self.savings,
            AssetType::Other(_) => return false,
        };
        *bucket += value;
        true
    }

    pub fn sum(&self) -> f64 {
        self.stock + self.crypto + self.metal + self.savings
    }

    /// Market-exposed value: everything except savings.
    pub fn invested(&self) -> f64 {
        self.stock + self.crypto + self.metal
    }

    /// `(type, value)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (AssetType, f64)> + '_ {
        AssetType::KNOWN
            .into_iter()
            .map(move |t| {
                let v = self.get(&t).unwrap_or(0.0);
                (t, v)
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueTotal {
    pub value: f64,
}

/// Aggregate value breakdown by person and by asset type.
/// Always derived from assets + price cache, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub p1: ValueTotal,
    pub p2: ValueTotal,
    pub combined: ValueTotal,
    pub by_type: TypeBreakdown,
    pub p1_by_type: TypeBreakdown,
    pub p2_by_type: TypeBreakdown,
}

/// Per-asset values, before any rounding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssetValues {
    /// Price used (0 when uncached)
    pub price: f64,
    pub p1_qty: f64,
    pub p1_value: f64,
    pub p2_qty: f64,
    pub p2_value: f64,
    pub combined_value: f64,
}
