use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;

use crate::*;

/// Opens a non-monster cell and chain-opens every zero-sum region reachable from it.
///
/// Returns the cells that were newly revealed, in visiting order. Out of bounds, already revealed, marked and monster
/// cells are left untouched and yield an empty list; monsters are resolved by combat instead.
pub fn reveal_area(board: &mut Board, coords: Coord2, revealer: &str) -> Vec<Coord2> {
    let mut opened = Vec::new();

    if !can_flood_into(board, coords) {
        return opened;
    }

    let mut to_visit = VecDeque::from([coords]);
    while let Some(visit_coords) = to_visit.pop_front() {
        // the queue may hold duplicates, the revealed flag doubles as the visited set
        if !can_flood_into(board, visit_coords) {
            continue;
        }

        let cell = &mut board[visit_coords];
        cell.is_revealed = true;
        cell.revealed_by = Some(String::from(revealer));
        let sum = cell.neighbor_sum;
        opened.push(visit_coords);
        log::trace!("Revealed {:?}, neighbor sum {}", visit_coords, sum);

        if sum == 0 {
            to_visit.extend(
                board
                    .iter_neighbors(visit_coords)
                    .filter(|&pos| can_flood_into(board, pos)),
            );
        }
    }

    opened
}

fn can_flood_into(board: &Board, coords: Coord2) -> bool {
    board
        .get(coords)
        .is_some_and(|cell| cell.is_hidden() && !cell.is_marked() && !cell.is_monster)
}
