use std::cmp::Ordering;

use crate::models::analytics::{
    HoldingRow, Performer, Performers, PriceChange, PriceDirection, SortColumn, TableQuery,
    TypeAllocation, PERFORMER_COUNT,
};
use crate::models::asset::Asset;
use crate::models::price::PriceCache;
use crate::models::totals::Totals;
use crate::services::totals_service::{percent_of, TotalsService};

/// Computes the display-side projections: table rows, type allocation,
/// and top/bottom performers.
///
/// All calculations use the cached prices; nothing here fetches.
pub struct AnalyticsService {
    totals_service: TotalsService,
}

impl AnalyticsService {
    pub fn new() -> Self {
        Self {
            totals_service: TotalsService::new(),
        }
    }

    /// Filtered, sorted holdings table.
    ///
    /// Allocation percentages are relative to the total of ALL assets,
    /// not just the rows that survive the filter.
    pub fn holdings_table(
        &self,
        assets: &[Asset],
        cache: &PriceCache,
        query: &TableQuery,
    ) -> Vec<HoldingRow> {
        let total = self.totals_service.compute_totals(assets, cache).combined.value;
        let search = query.search.trim().to_lowercase();

        let mut rows: Vec<HoldingRow> = assets
            .iter()
            .filter(|a| query.asset_type.as_ref().map_or(true, |t| &a.asset_type == t))
            .filter(|a| {
                search.is_empty()
                    || a.name.to_lowercase().contains(&search)
                    || a.symbol.to_lowercase().contains(&search)
            })
            .map(|a| self.build_row(a, cache, total))
            .collect();

        if let Some(column) = query.sort.column {
            // sort_by is stable: ties keep insertion order
            rows.sort_by(|a, b| {
                let ord = compare_rows(a, b, column);
                if query.sort.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }
        rows
    }

    /// Value and percentage of the combined total for each known type.
    pub fn type_allocation(&self, totals: &Totals) -> Vec<TypeAllocation> {
        let total = totals.combined.value;
        totals
            .by_type
            .iter()
            .map(|(asset_type, value)| TypeAllocation {
                asset_type,
                value,
                percent: percent_of(value, total),
            })
            .collect()
    }

    /// All assets that have both a price and a change percent, best first.
    pub fn rank_performers(&self, assets: &[Asset], cache: &PriceCache) -> Vec<Performer> {
        let mut performers: Vec<Performer> = assets
            .iter()
            .filter_map(|asset| {
                let entry = cache.get(&asset.key())?;
                let change_percent = entry.change_percent?;
                if entry.price <= 0.0 {
                    return None;
                }
                let quantity = asset.holdings.total_qty();
                Some(Performer {
                    name: asset.name.clone(),
                    symbol: asset.symbol.clone(),
                    asset_type: asset.asset_type.clone(),
                    current_price: entry.price,
                    change_percent,
                    quantity,
                    value: quantity * entry.price,
                })
            })
            .collect();

        performers.sort_by(|a, b| {
            b.change_percent
                .partial_cmp(&a.change_percent)
                .unwrap_or(Ordering::Equal)
        });
        performers
    }

    /// Top and bottom `PERFORMER_COUNT` of the ranked list.
    /// Bottom is worst first. Short lists produce overlapping entries.
    pub fn performers(&self, assets: &[Asset], cache: &PriceCache) -> Performers {
        let ranked = self.rank_performers(assets, cache);
        let top = ranked.iter().take(PERFORMER_COUNT).cloned().collect();
        let bottom = ranked.iter().rev().take(PERFORMER_COUNT).cloned().collect();
        Performers { top, bottom }
    }

    fn build_row(&self, asset: &Asset, cache: &PriceCache, total: f64) -> HoldingRow {
        let values = self.totals_service.asset_values(asset, cache);
        let entry = cache.get(&asset.key());

        HoldingRow {
            asset_id: asset.id.clone(),
            name: asset.name.clone(),
            asset_type: asset.asset_type.clone(),
            symbol: asset.symbol.clone(),
            price: entry.map(|e| e.price),
            price_change: entry.and_then(|e| price_change(e.price, e.previous_price)),
            p1_qty: values.p1_qty,
            p1_value: values.p1_value,
            p2_qty: values.p2_qty,
            p2_value: values.p2_value,
            combined_value: values.combined_value,
            allocation_pct: percent_of(values.combined_value, total),
        }
    }
}

impl Default for AnalyticsService {
    fn default() -> Self {
        Self::new()
    }
}

/// Move since the previous refresh; `None` when there is no usable previous
/// price or the price did not change.
fn price_change(current: f64, previous: Option<f64>) -> Option<PriceChange> {
    let previous = previous.filter(|p| *p != 0.0)?;
    if current == previous {
        return None;
    }
    let change = current - previous;
    Some(PriceChange {
        direction: if change > 0.0 {
            PriceDirection::Up
        } else {
            PriceDirection::Down
        },
        percent: change / previous * 100.0,
    })
}

fn compare_rows(a: &HoldingRow, b: &HoldingRow, column: SortColumn) -> Ordering {
    match column {
        SortColumn::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortColumn::Type => a.asset_type.as_str().cmp(b.asset_type.as_str()),
        SortColumn::Price => cmp_f64(a.price.unwrap_or(0.0), b.price.unwrap_or(0.0)),
        SortColumn::Combined => cmp_f64(a.combined_value, b.combined_value),
    }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
