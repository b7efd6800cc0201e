use core::ops::BitOr;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

pub use cell::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use score::*;
pub use types::*;

mod cell;
mod engine;
mod error;
mod generator;
mod score;
mod types;

/// Board dimensions and mine budget for one game.
///
/// Presets match the classic difficulty table; anything else is a custom
/// configuration and has no preset name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord2,
    pub mines: CellCount,
}

impl GameConfig {
    pub const EASY: Self = Self::new_unchecked((9, 9), 10);
    pub const MEDIUM: Self = Self::new_unchecked((16, 16), 40);
    pub const HARD: Self = Self::new_unchecked((30, 16), 99);

    pub const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    pub fn new(size: Coord2, mines: CellCount) -> Result<Self> {
        let config = Self::new_unchecked(size, mines);
        config.validate()?;
        Ok(config)
    }

    /// The first reveal must always open a full 3x3 area, so nine cells
    /// stay mine-free no matter where the player starts.
    pub fn validate(&self) -> Result<()> {
        let (size_x, size_y) = self.size;
        if size_x < 4 || size_y < 4 {
            return Err(GameError::InvalidConfiguration);
        }
        if self.mines == 0 || self.mines > self.total_cells() - 9 {
            return Err(GameError::InvalidConfiguration);
        }
        Ok(())
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    /// Key used by the score table; custom configurations are unnamed.
    pub fn preset_name(&self) -> Option<&'static str> {
        match *self {
            Self::EASY => Some("easy"),
            Self::MEDIUM => Some("medium"),
            Self::HARD => Some("hard"),
            _ => None,
        }
    }
}

/// Mine positions plus the per-cell adjacency table.
///
/// Both are fixed at construction; a layout never changes for the lifetime
/// of the game it backs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MineLayout {
    mines: Array2<bool>,
    adjacent: Array2<u8>,
    mine_count: CellCount,
}

impl MineLayout {
    pub fn from_mine_mask(mines: Array2<bool>) -> Self {
        let mine_count = mines
            .iter()
            .filter(|&&is_mine| is_mine)
            .count()
            .try_into()
            .unwrap();

        let mut adjacent: Array2<u8> = Array2::default(mines.raw_dim());
        for ((ix, iy), slot) in adjacent.indexed_iter_mut() {
            let pos: Coord2 = (ix.try_into().unwrap(), iy.try_into().unwrap());
            *slot = mines
                .iter_neighbors(pos)
                .filter(|&neighbor| mines[neighbor.to_nd_index()])
                .count()
                .try_into()
                .unwrap();
        }

        Self {
            mines,
            adjacent,
            mine_count,
        }
    }

    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut mines: Array2<bool> = Array2::default(size.to_nd_index());

        for &coords in mine_coords {
            if coords.0 >= size.0 || coords.1 >= size.1 {
                return Err(GameError::OutOfBounds);
            }
            mines[coords.to_nd_index()] = true;
        }

        Ok(Self::from_mine_mask(mines))
    }

    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            size: self.size(),
            mines: self.mine_count,
        }
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size.0 && coords.1 < size.1 {
            Ok(coords)
        } else {
            Err(GameError::OutOfBounds)
        }
    }

    pub fn size(&self) -> Coord2 {
        let dim = self.mines.dim();
        (dim.0.try_into().unwrap(), dim.1.try_into().unwrap())
    }

    pub fn total_cells(&self) -> CellCount {
        self.mines.len().try_into().unwrap()
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self.mines[coords.to_nd_index()]
    }

    pub fn adjacent_count(&self, coords: Coord2) -> u8 {
        self.adjacent[coords.to_nd_index()]
    }

    /// Every mine position, row-major. Display-only; gameplay code never
    /// needs the full list.
    pub fn mine_coords(&self) -> Vec<Coord2> {
        self.mines
            .indexed_iter()
            .filter(|&(_, &is_mine)| is_mine)
            .map(|((ix, iy), _)| (ix.try_into().unwrap(), iy.try_into().unwrap()))
            .collect()
    }
}

/// Outcome of a flag toggle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlagOutcome {
    Unchanged,
    Toggled,
}

impl FlagOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::Unchanged => false,
            Self::Toggled => true,
        }
    }
}

/// Outcome of revealing one or more cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RevealOutcome {
    Unchanged,
    /// Number of cells newly revealed by this call.
    Revealed(CellCount),
    Exploded,
    Won,
}

impl RevealOutcome {
    pub const fn has_update(self) -> bool {
        use RevealOutcome::*;
        match self {
            Unchanged => false,
            Revealed(_) => true,
            Exploded => true,
            Won => true,
        }
    }
}

/// Merges outcomes when several cells are opened by one operation.
impl BitOr for RevealOutcome {
    type Output = RevealOutcome;

    fn bitor(self, rhs: Self) -> Self::Output {
        use RevealOutcome::*;
        match (self, rhs) {
            // explosion has priority
            (Exploded, _) => Exploded,
            (_, Exploded) => Exploded,
            // then winning
            (Won, _) => Won,
            (_, Won) => Won,
            // reveal counts accumulate
            (Revealed(a), Revealed(b)) => Revealed(a + b),
            (Revealed(n), Unchanged) => Revealed(n),
            (Unchanged, Revealed(n)) => Revealed(n),
            (Unchanged, Unchanged) => Unchanged,
        }
    }
}
