use chrono::{DateTime, Utc};

use crate::models::asset::{Asset, AssetType};
use crate::models::chart::{
    ChartView, CompositionChart, DeltaPoint, ReturnPoint, SavingsSplit, ScatterPoint, TypeSeries,
    MIN_CHART_SNAPSHOTS,
};
use crate::models::price::PriceCache;
use crate::models::range::RangeWindow;
use crate::models::snapshot::Snapshot;
use crate::models::totals::Totals;
use crate::services::snapshot_service::SnapshotService;
use crate::services::totals_service::percent_of;

/// Generates chart-ready data sets from snapshots and current totals.
///
/// All chart numbers are computed here; the frontend only renders them.
/// History charts work on the snapshots inside the requested window, so
/// every derived value (deltas, return base) depends on where that window
/// starts and is recomputed on each call rather than stored.
pub struct ChartService {
    snapshot_service: SnapshotService,
}

impl ChartService {
    pub fn new() -> Self {
        Self {
            snapshot_service: SnapshotService::new(),
        }
    }

    /// Change in total value between consecutive snapshots in the window.
    /// The first snapshot in the window only serves as the starting point.
    pub fn delta_series(
        &self,
        snapshots: &[Snapshot],
        window: RangeWindow,
        now: DateTime<Utc>,
    ) -> ChartView<Vec<DeltaPoint>> {
        self.with_window(snapshots, window, now, |filtered| {
            filtered
                .windows(2)
                .map(|pair| DeltaPoint {
                    timestamp: pair[1].timestamp,
                    total_value: pair[1].total_value,
                    change_from_previous: pair[1].total_value - pair[0].total_value,
                })
                .collect()
        })
    }

    /// Percent return of each snapshot against the first one in the window.
    /// Every point is 0 when the base value is not positive.
    pub fn cumulative_return_series(
        &self,
        snapshots: &[Snapshot],
        window: RangeWindow,
        now: DateTime<Utc>,
    ) -> ChartView<Vec<ReturnPoint>> {
        self.with_window(snapshots, window, now, |filtered| {
            let base = filtered[0].total_value;
            filtered
                .iter()
                .map(|s| ReturnPoint {
                    timestamp: s.timestamp,
                    return_pct: if base > 0.0 {
                        (s.total_value - base) / base * 100.0
                    } else {
                        0.0
                    },
                })
                .collect()
        })
    }

    /// Per-type values straight from each snapshot's `by_type`.
    pub fn composition_series(
        &self,
        snapshots: &[Snapshot],
        window: RangeWindow,
        now: DateTime<Utc>,
    ) -> ChartView<CompositionChart> {
        self.with_window(snapshots, window, now, |filtered| CompositionChart {
            timestamps: filtered.iter().map(|s| s.timestamp).collect(),
            series: AssetType::KNOWN
                .into_iter()
                .map(|asset_type| TypeSeries {
                    values: filtered
                        .iter()
                        .map(|s| s.by_type.get(&asset_type).unwrap_or(0.0))
                        .collect(),
                    asset_type,
                })
                .collect(),
        })
    }

    /// Market-exposed (stock + crypto + metal) vs savings.
    pub fn savings_split(&self, totals: &Totals) -> SavingsSplit {
        let invested = totals.by_type.invested();
        let savings = totals.by_type.savings;
        let whole = invested + savings;
        SavingsSplit {
            invested,
            savings,
            invested_pct: percent_of(invested, whole),
            savings_pct: percent_of(savings, whole),
        }
    }

    /// Today's change vs total value, one point per priced non-savings asset.
    pub fn performance_scatter(&self, assets: &[Asset], cache: &PriceCache) -> Vec<ScatterPoint> {
        assets
            .iter()
            .filter(|a| a.asset_type != AssetType::Savings)
            .filter_map(|asset| {
                let entry = cache.get(&asset.key())?;
                let change_percent = entry.change_percent?;
                if entry.price <= 0.0 {
                    return None;
                }
                let value = asset.holdings.total_qty() * entry.price;
                (value > 0.0).then(|| ScatterPoint {
                    symbol: asset.symbol.clone(),
                    change_percent,
                    value,
                })
            })
            .collect()
    }

    fn with_window<T>(
        &self,
        snapshots: &[Snapshot],
        window: RangeWindow,
        now: DateTime<Utc>,
        build: impl FnOnce(&[&Snapshot]) -> T,
    ) -> ChartView<T> {
        let filtered = self.snapshot_service.filter_by_range(snapshots, window, now);
        if filtered.len() < MIN_CHART_SNAPSHOTS {
            return ChartView::InsufficientData {
                window,
                in_window: filtered.len(),
                total: snapshots.len(),
            };
        }
        ChartView::Ready {
            data: build(&filtered),
        }
    }
}

impl Default for ChartService {
    fn default() -> Self {
        Self::new()
    }
}
