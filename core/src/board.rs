use alloc::vec::Vec;
use core::ops::{Index, IndexMut};
use ndarray::Array2;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::*;

/// Grid of cells owned by a room, fixed in size for the board's lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    cells: Array2<Cell>,
}

impl Board {
    /// A board of `size` with no monsters.
    pub fn empty(size: Coord2) -> Self {
        Self {
            cells: Array2::default(size.to_nd_index()),
        }
    }

    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self> {
        let row_count = rows.len();
        let col_count = rows.first().map_or(0, Vec::len);
        if Coord::try_from(row_count).is_err() || Coord::try_from(col_count).is_err() {
            return Err(GameError::InvalidBoardShape);
        }
        if rows.iter().any(|row| row.len() != col_count) {
            return Err(GameError::InvalidBoardShape);
        }
        let flat: Vec<Cell> = rows.into_iter().flatten().collect();
        let cells = Array2::from_shape_vec((row_count, col_count), flat)
            .map_err(|_| GameError::InvalidBoardShape)?;
        Ok(Self { cells })
    }

    pub fn size(&self) -> Coord2 {
        let (rows, cols) = self.cells.dim();
        // from_rows and empty both keep each side within Coord
        (rows as Coord, cols as Coord)
    }

    pub fn total_cells(&self) -> CellCount {
        let (rows, cols) = self.size();
        mult(rows, cols)
    }

    pub fn get(&self, coords: Coord2) -> Option<&Cell> {
        self.cells.get(coords.to_nd_index())
    }

    pub fn get_mut(&mut self, coords: Coord2) -> Option<&mut Cell> {
        self.cells.get_mut(coords.to_nd_index())
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.cells.iter_neighbors(coords)
    }

    /// Iterates every cell with its coordinates, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (Coord2, &Cell)> {
        self.cells
            .indexed_iter()
            .map(|((row, col), cell)| ((row as Coord, col as Coord), cell))
    }

    /// Sum of monster levels in the 8-neighborhood of `coords`.
    pub fn neighbor_level_sum(&self, coords: Coord2) -> u16 {
        self.iter_neighbors(coords)
            .map(|pos| u16::from(self[pos].monster_level))
            .sum()
    }

    /// Recomputes `neighbor_sum` for every cell from the current monster placement.
    pub fn compute_neighbor_sums(&mut self) {
        let (rows, cols) = self.size();
        for row in 0..rows {
            for col in 0..cols {
                let sum = self.neighbor_level_sum((row, col));
                self[(row, col)].neighbor_sum = sum;
            }
        }
    }

    /// Number of placed monsters per level, index 0 being level 1.
    pub fn monster_counts(&self, max_level: u8) -> Vec<CellCount> {
        let mut counts = alloc::vec![0; usize::from(max_level)];
        for (_, cell) in self.iter() {
            if cell.is_monster {
                if let Some(slot) = usize::from(cell.monster_level)
                    .checked_sub(1)
                    .and_then(|index| counts.get_mut(index))
                {
                    *slot += 1;
                }
            }
        }
        counts
    }

    pub fn monster_count(&self) -> CellCount {
        self.iter().filter(|(_, cell)| cell.is_monster).count() as CellCount
    }

    /// Whether every monster is accounted for under `policy`.
    pub fn all_monsters_cleared(&self, policy: CombatPolicy) -> bool {
        self.cells.iter().all(|cell| policy.is_cleared(cell))
    }

    /// Reveals every monster cell, used when the party is wiped out.
    pub fn reveal_all_monsters(&mut self) {
        for cell in self.cells.iter_mut().filter(|cell| cell.is_monster) {
            cell.is_revealed = true;
        }
    }

    fn rows(&self) -> Vec<Vec<Cell>> {
        self.cells.outer_iter().map(|row| row.to_vec()).collect()
    }
}

impl Index<Coord2> for Board {
    type Output = Cell;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}

impl IndexMut<Coord2> for Board {
    fn index_mut(&mut self, coords: Coord2) -> &mut Self::Output {
        &mut self.cells[coords.to_nd_index()]
    }
}

impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        self.rows().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        let rows = Vec::<Vec<Cell>>::deserialize(deserializer)?;
        Board::from_rows(rows).map_err(<D::Error as DeError>::custom)
    }
}

/// Builds a board with monsters at fixed positions.
#[cfg(test)]
pub(crate) fn board_with(size: Coord2, monsters: &[(Coord2, u8)]) -> Board {
    let mut board = Board::empty(size);
    for &(coords, level) in monsters {
        board[coords] = Cell::monster(level);
    }
    board.compute_neighbor_sums();
    board
}
