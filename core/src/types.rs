use ndarray::Array2;

/// Single coordinate axis; boards are at most 255 cells wide or tall.
pub type Coord = u8;

/// Counting type wide enough for a full board worth of cells.
pub type CellCount = u16;

/// Grid position `(x, y)`, `x` across, `y` down.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    (a as CellCount).saturating_mul(b as CellCount)
}

/// King-move displacements, clockwise from north.
const DISPLACEMENTS: [(i8, i8); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// Iterates the in-bounds neighbors of a cell in a fixed clockwise order.
/// Edges and corners clip; there is no wraparound.
#[derive(Clone, Debug)]
pub struct NeighborIter {
    center: Coord2,
    bounds: Coord2,
    next: usize,
}

impl NeighborIter {
    pub(crate) fn new(center: Coord2, bounds: Coord2) -> Self {
        Self {
            center,
            bounds,
            next: 0,
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Coord2> {
        while let Some(&(dx, dy)) = DISPLACEMENTS.get(self.next) {
            self.next += 1;

            let x = self.center.0.checked_add_signed(dx);
            let y = self.center.1.checked_add_signed(dy);
            if let (Some(x), Some(y)) = (x, y)
                && x < self.bounds.0
                && y < self.bounds.1
            {
                return Some((x, y));
            }
        }
        None
    }
}

pub trait NeighborIterExt {
    fn iter_neighbors(&self, center: Coord2) -> NeighborIter;
}

impl<T> NeighborIterExt for Array2<T> {
    fn iter_neighbors(&self, center: Coord2) -> NeighborIter {
        let dim = self.dim();
        let bounds = (dim.0.try_into().unwrap(), dim.1.try_into().unwrap());
        NeighborIter::new(center, bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(size: Coord2) -> Array2<u8> {
        Array2::default(size.to_nd_index())
    }

    #[test]
    fn interior_cell_has_eight_neighbors() {
        let neighbors: Vec<_> = grid((5, 5)).iter_neighbors((2, 2)).collect();

        assert_eq!(neighbors.len(), 8);
        assert!(!neighbors.contains(&(2, 2)));
        for (x, y) in neighbors {
            assert!(x.abs_diff(2) <= 1 && y.abs_diff(2) <= 1);
        }
    }

    #[test]
    fn corner_and_edge_cells_clip() {
        assert_eq!(grid((5, 5)).iter_neighbors((0, 0)).count(), 3);
        assert_eq!(grid((5, 5)).iter_neighbors((4, 4)).count(), 3);
        assert_eq!(grid((5, 5)).iter_neighbors((2, 0)).count(), 5);
        assert_eq!(grid((1, 1)).iter_neighbors((0, 0)).count(), 0);
    }

    #[test]
    fn no_wraparound_at_edges() {
        // a 2-wide board must never produce x = 2 or an underflowed x
        for pos in grid((2, 4)).iter_neighbors((1, 1)) {
            assert!(pos.0 < 2 && pos.1 < 4);
        }
    }

    #[test]
    fn order_is_deterministic() {
        let first: Vec<_> = grid((4, 4)).iter_neighbors((1, 2)).collect();
        let second: Vec<_> = grid((4, 4)).iter_neighbors((1, 2)).collect();

        assert_eq!(first, second);
    }
}
