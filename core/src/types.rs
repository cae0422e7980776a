use core::slice;
use ndarray::Array2;

/// Row or column index; boards never exceed 255 cells per side.
pub type Coord = u8;

/// Count of cells or monsters on a board.
pub type CellCount = u16;

/// `(row, col)`, row-major like the stored board.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        let (row, col) = self;
        [usize::from(row), usize::from(col)]
    }
}

/// `rows * cols` without overflow surprises.
pub const fn mult(rows: Coord, cols: Coord) -> CellCount {
    (rows as CellCount).saturating_mul(cols as CellCount)
}

/// Whether `a` and `b` are within Chebyshev distance 1 of each other (same cell included).
pub const fn is_adjacent_or_same(a: Coord2, b: Coord2) -> bool {
    a.0.abs_diff(b.0) <= 1 && a.1.abs_diff(b.1) <= 1
}

pub trait NeighborIterExt {
    fn iter_neighbors(&self, center: Coord2) -> NeighborIter;
}

impl<T> NeighborIterExt for Array2<T> {
    fn iter_neighbors(&self, center: Coord2) -> NeighborIter {
        let (rows, cols) = self.dim();
        let clamp = |side: usize| Coord::try_from(side).unwrap_or(Coord::MAX);
        NeighborIter::new(center, (clamp(rows), clamp(cols)))
    }
}

/// Row-major offsets of the 8-neighborhood.
const OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// In-bounds cells of the 8-neighborhood of `center`, in row-major order, excluding the center.
#[derive(Clone, Debug)]
pub struct NeighborIter {
    center: Coord2,
    bounds: Coord2,
    offsets: slice::Iter<'static, (i8, i8)>,
}

impl NeighborIter {
    pub fn new(center: Coord2, bounds: Coord2) -> Self {
        Self {
            center,
            bounds,
            offsets: OFFSETS.iter(),
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        let ((row, col), (rows, cols)) = (self.center, self.bounds);
        self.offsets.find_map(|&(dr, dc)| {
            let r = row.checked_add_signed(dr).filter(|&r| r < rows)?;
            let c = col.checked_add_signed(dc).filter(|&c| c < cols)?;
            Some((r, c))
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.offsets.len()))
    }
}
