use std::collections::{HashSet, VecDeque};

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// Session lifecycle. Valid transitions:
/// - Pending -> InProgress (first reveal request, places the mines)
/// - InProgress -> Won
/// - InProgress -> Lost
///
/// Won and Lost are terminal; every mutating call is rejected afterwards.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Pending,
    InProgress,
    Won,
    Lost,
}

impl GameState {
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }

    pub const fn is_final(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::Pending
    }
}

/// One game from construction to terminal state.
///
/// The session owns its board exclusively and runs synchronously; hosts
/// driving it from a UI thread plus a timer thread must serialize calls
/// through a single owner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Game {
    config: GameConfig,
    seed: u64,
    minefield: Option<MineLayout>,
    grid: Array2<CellState>,
    revealed_count: CellCount,
    flag_count: CellCount,
    elapsed_secs: u32,
    state: GameState,
    triggered_mine: Option<Coord2>,
    #[serde(skip)]
    updates: Vec<CellUpdate>,
}

impl Game {
    /// Creates a session in `Pending`; mines are placed on the first
    /// reveal, seeded by `seed` and centered away from the clicked cell.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            seed,
            minefield: None,
            grid: Array2::default(config.size.to_nd_index()),
            revealed_count: 0,
            flag_count: 0,
            elapsed_secs: 0,
            state: GameState::default(),
            triggered_mine: None,
            updates: Vec::new(),
        })
    }

    /// Wraps a pre-placed layout, skipping generation on the first reveal.
    /// The layout is taken as-is; no sizing rules are applied.
    pub fn from_layout(minefield: MineLayout) -> Self {
        let config = minefield.game_config();
        Self {
            config,
            seed: 0,
            minefield: Some(minefield),
            grid: Array2::default(config.size.to_nd_index()),
            revealed_count: 0,
            flag_count: 0,
            elapsed_secs: 0,
            state: GameState::default(),
            triggered_mine: None,
            updates: Vec::new(),
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_final()
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn size(&self) -> Coord2 {
        self.config.size
    }

    pub fn total_mines(&self) -> CellCount {
        self.config.mines
    }

    pub fn flag_count(&self) -> CellCount {
        self.flag_count
    }

    /// How many mines have not been flagged yet; negative when the player
    /// has overflagged.
    pub fn mines_left(&self) -> isize {
        (self.config.mines as isize) - (self.flag_count as isize)
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn unrevealed_count(&self) -> CellCount {
        self.config.total_cells() - self.revealed_count
    }

    pub fn cell_at(&self, coords: Coord2) -> Result<CellState> {
        let coords = self.validate_coords(coords)?;
        Ok(self.grid[coords.to_nd_index()])
    }

    /// The mine that ended the game, if it ended in a loss.
    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    /// Full mine layout for display, available only once the game ended.
    pub fn mine_cells(&self) -> Option<Vec<Coord2>> {
        if self.state.is_final() {
            self.minefield.as_ref().map(MineLayout::mine_coords)
        } else {
            None
        }
    }

    /// Hands the cells changed since the last call to the presentation
    /// layer, oldest first.
    pub fn drain_updates(&mut self) -> Vec<CellUpdate> {
        std::mem::take(&mut self.updates)
    }

    /// Advances the elapsed-time counter by one second. The engine never
    /// schedules its own timer; a host collaborator calls this once per
    /// wall-clock second while the game runs.
    pub fn tick_time(&mut self) {
        if matches!(self.state, GameState::InProgress) {
            self.elapsed_secs += 1;
        }
    }

    /// Flags or unflags a hidden cell. Revealed cells are left untouched.
    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<FlagOutcome> {
        use CellState::*;
        use FlagOutcome::*;

        let coords = self.validate_coords(coords)?;
        self.check_not_final()?;

        Ok(match self.grid[coords.to_nd_index()] {
            Hidden => {
                self.set_cell(coords, Flagged);
                self.flag_count += 1;
                Toggled
            }
            Flagged => {
                self.set_cell(coords, Hidden);
                self.flag_count -= 1;
                Toggled
            }
            Revealed(_) => Unchanged,
        })
    }

    /// Reveals a cell, flood-filling outward from zero-adjacency cells.
    ///
    /// The first reveal of a session places the mines with `coords` as the
    /// center of the safe zone and moves the game to `InProgress` before
    /// opening anything.
    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.validate_coords(coords)?;
        self.check_not_final()?;

        if self.minefield.is_none() {
            self.place_mines(coords);
        }
        self.mark_started();

        Ok(self.reveal_single(coords))
    }

    /// Classic chord: on a revealed numbered cell whose flagged-neighbor
    /// count matches its number, opens every remaining hidden neighbor.
    /// Anything else is a quiet no-op.
    pub fn chord(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.validate_coords(coords)?;
        self.check_not_final()?;

        let CellState::Revealed(count) = self.grid[coords.to_nd_index()] else {
            return Ok(RevealOutcome::Unchanged);
        };
        if count == 0 || count != self.count_flagged_neighbors(coords) {
            return Ok(RevealOutcome::Unchanged);
        }

        Ok(self.reveal_neighbors(coords))
    }

    /// Whether a chord on this cell would open anything right now.
    pub fn can_chord(&self, coords: Coord2) -> bool {
        if self.state.is_final() {
            return false;
        }
        match self.cell_at(coords) {
            Ok(CellState::Revealed(count)) => {
                count > 0 && count == self.count_flagged_neighbors(coords)
            }
            _ => false,
        }
    }

    fn place_mines(&mut self, safe_center: Coord2) {
        let generator = RandomMinefieldGenerator::new(self.seed, safe_center);
        self.minefield = Some(generator.generate(self.config));
        log::debug!(
            "placed {} mines, safe zone around {:?}",
            self.config.mines,
            safe_center
        );
    }

    fn mark_started(&mut self) {
        if self.state.is_pending() {
            self.state = GameState::InProgress;
            log::debug!("game started");
        }
    }

    fn end_game(&mut self, won: bool) {
        if self.state.is_final() {
            return;
        }
        self.state = if won { GameState::Won } else { GameState::Lost };
        if won {
            self.triggered_mine = None;
        }
        log::debug!("game ended after {}s: {:?}", self.elapsed_secs, self.state);
    }

    /// Opens a single cell; the exploded mine is shown as part of the
    /// terminal transition, everything else cascades through `flood_fill`.
    fn reveal_single(&mut self, coords: Coord2) -> RevealOutcome {
        if self.grid[coords.to_nd_index()] != CellState::Hidden {
            return RevealOutcome::Unchanged;
        }

        let count = self.adjacent_count(coords);
        self.set_cell(coords, CellState::Revealed(count));
        self.revealed_count += 1;

        if self.has_mine(coords) {
            self.triggered_mine = Some(coords);
            self.end_game(false);
            return RevealOutcome::Exploded;
        }
        log::debug!("revealed {:?}, adjacent mines: {}", coords, count);

        let mut newly_revealed = 1;
        if count == 0 {
            newly_revealed += self.flood_fill(coords);
        }

        if self.revealed_count == self.safe_cell_count() {
            self.end_game(true);
            RevealOutcome::Won
        } else {
            RevealOutcome::Revealed(newly_revealed)
        }
    }

    /// Breadth-first expansion from a freshly revealed zero-adjacency cell.
    ///
    /// A cell is marked revealed before its neighbors are enqueued, so the
    /// grid itself deduplicates; `visited` additionally keeps the frontier
    /// from holding the same coordinate twice. Flagged cells are skipped
    /// and act as walls for the fill. Mines are unreachable here: only
    /// neighbors of zero-count cells are enqueued.
    fn flood_fill(&mut self, origin: Coord2) -> CellCount {
        use CellState::*;

        let mut newly_revealed = 0;
        let mut visited = HashSet::from([origin]);
        let mut to_visit: VecDeque<Coord2> = self
            .grid
            .iter_neighbors(origin)
            .filter(|&pos| self.grid[pos.to_nd_index()] == Hidden)
            .collect();
        log::trace!("flood fill from {:?}, frontier: {:?}", origin, to_visit);

        while let Some(pos) = to_visit.pop_front() {
            if !visited.insert(pos) {
                continue;
            }

            // flagged cells and anything opened meanwhile stay untouched
            if self.grid[pos.to_nd_index()] != Hidden {
                continue;
            }

            let count = self.adjacent_count(pos);
            self.set_cell(pos, Revealed(count));
            self.revealed_count += 1;
            newly_revealed += 1;
            log::trace!("flood revealed {:?}, adjacent mines: {}", pos, count);

            if count == 0 {
                to_visit.extend(
                    self.grid
                        .iter_neighbors(pos)
                        .filter(|&next| self.grid[next.to_nd_index()] == Hidden)
                        .filter(|next| !visited.contains(next)),
                );
            }
        }

        newly_revealed
    }

    /// Opens each unrevealed neighbor in turn, stopping at the first
    /// terminal transition.
    fn reveal_neighbors(&mut self, coords: Coord2) -> RevealOutcome {
        let neighbors: SmallVec<[Coord2; 8]> = self.grid.iter_neighbors(coords).collect();

        let mut merged = RevealOutcome::Unchanged;
        for pos in neighbors {
            merged = merged | self.reveal_single(pos);
            if self.state.is_final() {
                break;
            }
        }
        merged
    }

    fn count_flagged_neighbors(&self, coords: Coord2) -> u8 {
        self.grid
            .iter_neighbors(coords)
            .filter(|&pos| self.grid[pos.to_nd_index()] == CellState::Flagged)
            .count()
            .try_into()
            .unwrap()
    }

    fn has_mine(&self, coords: Coord2) -> bool {
        self.minefield
            .as_ref()
            .is_some_and(|minefield| minefield.contains_mine(coords))
    }

    fn adjacent_count(&self, coords: Coord2) -> u8 {
        self.minefield
            .as_ref()
            .map_or(0, |minefield| minefield.adjacent_count(coords))
    }

    fn safe_cell_count(&self) -> CellCount {
        self.config.total_cells() - self.config.mines
    }

    fn set_cell(&mut self, coords: Coord2, state: CellState) {
        self.grid[coords.to_nd_index()] = state;
        self.updates.push(CellUpdate { pos: coords, state });
    }

    fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let (size_x, size_y) = self.config.size;
        if coords.0 < size_x && coords.1 < size_y {
            Ok(coords)
        } else {
            Err(GameError::OutOfBounds)
        }
    }

    fn check_not_final(&self) -> Result<()> {
        if self.state.is_final() {
            Err(GameError::InvalidState)
        } else {
            Ok(())
        }
    }
}
