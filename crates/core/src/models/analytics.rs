use serde::{Deserialize, Serialize};

use super::asset::AssetType;

/// Number of entries in each performer list.
pub const PERFORMER_COUNT: usize = 5;

/// Direction of the latest price move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceDirection {
    Up,
    Down,
}

/// Price move since the previous refresh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    pub direction: PriceDirection,
    pub percent: f64,
}

/// One row of the holdings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingRow {
    pub asset_id: String,
    pub name: String,
    pub asset_type: AssetType,
    pub symbol: String,

    /// Cached price, `None` when the asset has never been priced
    pub price: Option<f64>,

    pub price_change: Option<PriceChange>,

    pub p1_qty: f64,
    pub p1_value: f64,
    pub p2_qty: f64,
    pub p2_value: f64,
    pub combined_value: f64,

    /// Share of the overall combined total, in percent
    pub allocation_pct: f64,
}

/// Value and share of one asset type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeAllocation {
    pub asset_type: AssetType,
    pub value: f64,
    pub percent: f64,
}

/// A ranked asset for the top/bottom performer lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performer {
    pub name: String,
    pub symbol: String,
    pub asset_type: AssetType,
    pub current_price: f64,
    pub change_percent: f64,
    pub quantity: f64,
    pub value: f64,
}

/// Best and worst movers. The two lists overlap when fewer than
/// `2 * PERFORMER_COUNT` assets are ranked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Performers {
    pub top: Vec<Performer>,
    pub bottom: Vec<Performer>,
}

/// Column the holdings table can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortColumn {
    Name,
    Type,
    Price,
    Combined,
}

/// Current table sort. `column: None` keeps insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: Option<SortColumn>,
    pub ascending: bool,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            column: None,
            ascending: true,
        }
    }
}

impl SortState {
    pub fn by(column: SortColumn, ascending: bool) -> Self {
        Self {
            column: Some(column),
            ascending,
        }
    }

    /// Clicking the active column flips direction; a new column starts ascending.
    pub fn toggle(&mut self, column: SortColumn) {
        if self.column == Some(column) {
            self.ascending = !self.ascending;
        } else {
            self.column = Some(column);
            self.ascending = true;
        }
    }
}

/// Filter + sort parameters for the holdings table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableQuery {
    /// `None` shows every type
    pub asset_type: Option<AssetType>,
    /// Case-insensitive substring over name and symbol
    pub search: String,
    pub sort: SortState,
}

impl TableQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, asset_type: AssetType) -> Self {
        self.asset_type = Some(asset_type);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn sorted_by(mut self, column: SortColumn, ascending: bool) -> Self {
        self.sort = SortState::by(column, ascending);
        self
    }
}
