use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Time window applied to snapshot sequences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RangeWindow {
    OneDay,
    SevenDays,
    ThirtyDays,
    YearToDate,
    #[default]
    All,
}

impl RangeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeWindow::OneDay => "1d",
            RangeWindow::SevenDays => "7d",
            RangeWindow::ThirtyDays => "30d",
            RangeWindow::YearToDate => "ytd",
            RangeWindow::All => "all",
        }
    }

    /// Human label used when a window has no data ("last 7 days", ...).
    pub fn label(&self) -> &'static str {
        match self {
            RangeWindow::OneDay => "last 24 hours",
            RangeWindow::SevenDays => "last 7 days",
            RangeWindow::ThirtyDays => "last 30 days",
            RangeWindow::YearToDate => "year to date",
            RangeWindow::All => "all time",
        }
    }

    /// Inclusive lower bound in epoch milliseconds, or `None` for `All`.
    ///
    /// Year-to-date starts at 00:00 UTC on January 1st of `now`'s year.
    pub fn lower_bound_millis(&self, now: DateTime<Utc>) -> Option<i64> {
        let now_ms = now.timestamp_millis();
        match self {
            RangeWindow::OneDay => Some(now_ms - DAY_MS),
            RangeWindow::SevenDays => Some(now_ms - 7 * DAY_MS),
            RangeWindow::ThirtyDays => Some(now_ms - 30 * DAY_MS),
            RangeWindow::YearToDate => Utc
                .with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0)
                .single()
                .map(|start| start.timestamp_millis()),
            RangeWindow::All => None,
        }
    }
}

/// Unrecognized strings map to `All`, which filters nothing.
impl From<&str> for RangeWindow {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "1d" => RangeWindow::OneDay,
            "7d" => RangeWindow::SevenDays,
            "30d" => RangeWindow::ThirtyDays,
            "ytd" => RangeWindow::YearToDate,
            _ => RangeWindow::All,
        }
    }
}

impl From<String> for RangeWindow {
    fn from(s: String) -> Self {
        RangeWindow::from(s.as_str())
    }
}

impl From<RangeWindow> for String {
    fn from(w: RangeWindow) -> Self {
        w.as_str().to_string()
    }
}

impl std::fmt::Display for RangeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
