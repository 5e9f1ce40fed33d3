use crate::models::asset::Asset;
use crate::models::price::PriceCache;
use crate::models::totals::{AssetValues, Totals};

/// Turns assets + cached prices into per-person and per-type totals.
///
/// Value arithmetic only, without I/O or rounding. Rounding and
/// currency formatting belong to whatever renders the numbers.
pub struct TotalsService;

impl TotalsService {
    pub fn new() -> Self {
        Self
    }

    /// Value one asset with its cached price (0 when uncached).
    pub fn asset_values(&self, asset: &Asset, cache: &PriceCache) -> AssetValues {
        let price = cache.get_price(&asset.key()).unwrap_or(0.0);
        let p1_qty = asset.holdings.p1.qty;
        let p2_qty = asset.holdings.p2.qty;
        let p1_value = p1_qty * price;
        let p2_value = p2_qty * price;

        AssetValues {
            price,
            p1_qty,
            p1_value,
            p2_qty,
            p2_value,
            combined_value: p1_value + p2_value,
        }
    }

    /// Compute totals for all assets.
    ///
    /// Assets of an unrecognized type count toward the person and combined
    /// totals but are left out of every `by_type` bucket.
    pub fn compute_totals(&self, assets: &[Asset], cache: &PriceCache) -> Totals {
        let mut totals = Totals::default();

        for asset in assets {
            let values = self.asset_values(asset, cache);

            totals.p1.value += values.p1_value;
            totals.p2.value += values.p2_value;

            totals.by_type.add(&asset.asset_type, values.combined_value);
            totals.p1_by_type.add(&asset.asset_type, values.p1_value);
            totals.p2_by_type.add(&asset.asset_type, values.p2_value);
        }

        totals.combined.value = totals.p1.value + totals.p2.value;
        totals
    }
}

impl Default for TotalsService {
    fn default() -> Self {
        Self::new()
    }
}

/// `part / whole * 100`, or 0 when `whole` is not positive.
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}
