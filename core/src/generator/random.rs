use ndarray::Array2;
use smallvec::SmallVec;

use super::*;

/// Seeded uniform placement that keeps the clipped 3x3 block around the
/// first clicked cell free of mines, so the opening move always cascades.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomMinefieldGenerator {
    seed: u64,
    safe_center: Coord2,
}

impl RandomMinefieldGenerator {
    pub fn new(seed: u64, safe_center: Coord2) -> Self {
        Self { seed, safe_center }
    }
}

impl MinefieldGenerator for RandomMinefieldGenerator {
    fn generate(self, config: GameConfig) -> MineLayout {
        use rand::prelude::*;

        let mut mines: Array2<bool> = Array2::default(config.size.to_nd_index());

        // Occupy the safe zone up front so the draw below cannot land there.
        let safe_zone: SmallVec<[Coord2; 9]> = core::iter::once(self.safe_center)
            .chain(mines.iter_neighbors(self.safe_center))
            .collect();
        for &pos in &safe_zone {
            mines[pos.to_nd_index()] = true;
        }

        let blocked: CellCount = safe_zone.len().try_into().unwrap();
        let mut free_cells = config.total_cells() - blocked;
        let mut mines_placed = 0;
        let mut rng = SmallRng::seed_from_u64(self.seed);

        {
            let cells = mines.as_slice_mut().expect("layout should be standard");
            while mines_placed < config.mines && free_cells > 0 {
                // draw a rank among the still-free cells, uniform and
                // without replacement
                let mut rank = rng.random_range(0..free_cells);
                for cell in cells.iter_mut().filter(|cell| !**cell) {
                    if rank == 0 {
                        *cell = true;
                        mines_placed += 1;
                        free_cells -= 1;
                        break;
                    }
                    rank -= 1;
                }
            }
        }

        // return the safe zone to open ground
        for &pos in &safe_zone {
            mines[pos.to_nd_index()] = false;
        }

        let layout = MineLayout::from_mine_mask(mines);
        if layout.mine_count() != config.mines {
            log::warn!(
                "Generated minefield count mismatch, actual: {}, requested: {}",
                layout.mine_count(),
                config.mines
            );
        }
        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chebyshev(a: Coord2, b: Coord2) -> u8 {
        a.0.abs_diff(b.0).max(a.1.abs_diff(b.1))
    }

    #[test]
    fn safe_zone_never_holds_a_mine() {
        let config = GameConfig::EASY;
        for seed in 0..64 {
            for safe_center in [(4, 4), (0, 0), (8, 8), (0, 4)] {
                let generator = RandomMinefieldGenerator::new(seed, safe_center);
                let layout = generator.generate(config);

                assert_eq!(layout.mine_count(), config.mines, "seed {}", seed);
                for pos in layout.mine_coords() {
                    assert!(
                        chebyshev(pos, safe_center) > 1,
                        "seed {}: mine at {:?} inside safe zone of {:?}",
                        seed,
                        pos,
                        safe_center
                    );
                }
            }
        }
    }

    #[test]
    fn requested_count_is_placed_even_at_maximum_density() {
        // 4x4 with 7 mines is the densest configuration validation allows;
        // the clipped corner safe zone leaves 12 eligible cells
        let config = GameConfig::new((4, 4), 7).unwrap();
        let layout = RandomMinefieldGenerator::new(9, (0, 0)).generate(config);

        assert_eq!(layout.mine_count(), 7);
        assert_eq!(layout.safe_cell_count(), 9);
        for pos in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            assert!(!layout.contains_mine(pos));
        }
    }

    #[test]
    fn same_seed_reproduces_the_layout() {
        let first = RandomMinefieldGenerator::new(77, (3, 3)).generate(GameConfig::MEDIUM);
        let second = RandomMinefieldGenerator::new(77, (3, 3)).generate(GameConfig::MEDIUM);

        assert_eq!(first, second);
    }

    #[test]
    fn different_seeds_are_drawn_independently() {
        let layouts: Vec<_> = (0..8)
            .map(|seed| RandomMinefieldGenerator::new(seed, (4, 4)).generate(GameConfig::EASY))
            .collect();

        // at least two of eight draws must differ; a constant generator
        // would be a regression in the rng plumbing
        assert!(layouts.windows(2).any(|pair| pair[0] != pair[1]));
    }
}
