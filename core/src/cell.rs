use serde::{Deserialize, Serialize};

use crate::types::Coord2;

/// Player-visible state of a single board cell.
///
/// `Revealed` carries the adjacent-mine count and is never left again;
/// flag toggling only moves a cell between `Hidden` and `Flagged`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    Hidden,
    Flagged,
    Revealed(u8),
}

impl CellState {
    pub const fn is_unrevealed(self) -> bool {
        matches!(self, Self::Hidden | Self::Flagged)
    }

    pub const fn is_revealed(self) -> bool {
        matches!(self, Self::Revealed(_))
    }
}

impl Default for CellState {
    fn default() -> Self {
        Self::Hidden
    }
}

/// One changed cell, the unit of the diff handed to the presentation layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellUpdate {
    pub pos: Coord2,
    pub state: CellState,
}
