use serde::{Deserialize, Serialize};

use super::asset::AssetType;
use super::range::RangeWindow;

/// Minimum number of snapshots a history chart needs.
pub const MIN_CHART_SNAPSHOTS: usize = 2;

/// Result of a snapshot-based chart query.
///
/// Generated by the core and rendered as-is by the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ChartView<T> {
    Ready { data: T },
    /// Fewer than two snapshots in the window. `total` is the full history
    /// length, so callers can tell "nothing in this window" (`total >= 2`)
    /// apart from "save more snapshots".
    InsufficientData {
        window: RangeWindow,
        in_window: usize,
        total: usize,
    },
}

impl<T> ChartView<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, ChartView::Ready { .. })
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ChartView::Ready { data } => Some(data),
            ChartView::InsufficientData { .. } => None,
        }
    }

    /// Text to show in place of an unready chart, `None` when ready.
    pub fn message(&self) -> Option<String> {
        match self {
            ChartView::Ready { .. } => None,
            ChartView::InsufficientData { total, .. } if *total < MIN_CHART_SNAPSHOTS => {
                Some("Save at least two snapshots to see this chart".to_string())
            }
            ChartView::InsufficientData { window, .. } => Some(format!(
                "Not enough snapshots in the {} for this chart",
                window.label()
            )),
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            ChartView::Ready { data } => Some(data),
            ChartView::InsufficientData { .. } => None,
        }
    }
}

/// One bar of the period-over-period change chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaPoint {
    pub timestamp: i64,
    pub total_value: f64,
    pub change_from_previous: f64,
}

/// One point of the cumulative return line, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnPoint {
    pub timestamp: i64,
    pub return_pct: f64,
}

/// Stacked composition data: one value per snapshot for each known type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionChart {
    pub timestamps: Vec<i64>,
    pub series: Vec<TypeSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeSeries {
    pub asset_type: AssetType,
    pub values: Vec<f64>,
}

/// Market-exposed vs savings split of the current totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsSplit {
    pub invested: f64,
    pub savings: f64,
    pub invested_pct: f64,
    pub savings_pct: f64,
}

/// Asset plotted by today's change (x) against its total value (y).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterPoint {
    pub symbol: String,
    pub change_percent: f64,
    pub value: f64,
}
