//! Per-cell annotations. Each operation touches a single cell, so clients run it as a cell-scoped transaction that
//! does not contend with the rest of the room.

use alloc::string::String;

use crate::*;

/// Checks a typed digit against the mode, `0` meaning "clear".
pub fn validate_mark(mark: u8, max_level: u8) -> Result<u8> {
    if mark <= max_level {
        Ok(mark)
    } else {
        Err(GameError::InvalidMark(mark))
    }
}

/// Advances the hint on a hidden cell, wrapping from `max_level` back to none.
pub fn cycle_mark(cell: &mut Cell, max_level: u8, player: &str) -> MarkOutcome {
    let next = if cell.mark >= max_level { 0 } else { cell.mark + 1 };
    set_mark(cell, next, player)
}

/// Sets the hint on a hidden cell. The mark must already be validated against the mode.
pub fn set_mark(cell: &mut Cell, mark: u8, player: &str) -> MarkOutcome {
    if cell.is_revealed {
        return MarkOutcome::NoChange;
    }
    let mark_by = (mark > 0).then(|| String::from(player));
    if cell.mark == mark && cell.mark_by == mark_by {
        return MarkOutcome::NoChange;
    }
    cell.mark = mark;
    cell.mark_by = mark_by;
    MarkOutcome::Changed
}

pub fn clear_mark(cell: &mut Cell) -> MarkOutcome {
    if cell.is_revealed || (cell.mark == 0 && cell.mark_by.is_none()) {
        return MarkOutcome::NoChange;
    }
    cell.mark = 0;
    cell.mark_by = None;
    MarkOutcome::Changed
}

/// Flips the pin on any cell.
pub fn toggle_pin(cell: &mut Cell, player: &str) -> PinOutcome {
    if cell.pinned {
        cell.pinned = false;
        cell.pinned_by = None;
        PinOutcome::Unpinned
    } else {
        cell.pinned = true;
        cell.pinned_by = Some(String::from(player));
        PinOutcome::Pinned
    }
}

/// Switches a defeated monster between its icon and its neighbor sum.
pub fn toggle_number(cell: &mut Cell) -> MarkOutcome {
    if !(cell.is_monster && cell.is_dead) {
        return MarkOutcome::NoChange;
    }
    cell.show_number = !cell.show_number;
    MarkOutcome::Changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_wraps_to_zero() {
        let mut cell = Cell::default();

        for expected in 1..=3 {
            assert_eq!(cycle_mark(&mut cell, 3, "alice"), MarkOutcome::Changed);
            assert_eq!(cell.mark, expected);
        }
        assert_eq!(cell.mark_by.as_deref(), Some("alice"));

        cycle_mark(&mut cell, 3, "alice");
        assert_eq!(cell.mark, 0);
        assert_eq!(cell.mark_by, None);
    }

    #[test]
    fn revealed_cells_cannot_be_marked() {
        let mut cell = Cell {
            is_revealed: true,
            ..Default::default()
        };

        assert_eq!(cycle_mark(&mut cell, 5, "alice"), MarkOutcome::NoChange);
        assert_eq!(set_mark(&mut cell, 2, "alice"), MarkOutcome::NoChange);
        assert_eq!(cell.mark, 0);
    }

    #[test]
    fn set_and_clear() {
        let mut cell = Cell::default();

        assert_eq!(set_mark(&mut cell, 4, "bob"), MarkOutcome::Changed);
        assert_eq!(set_mark(&mut cell, 4, "bob"), MarkOutcome::NoChange);
        assert_eq!(set_mark(&mut cell, 4, "alice"), MarkOutcome::Changed);
        assert_eq!(clear_mark(&mut cell), MarkOutcome::Changed);
        assert_eq!(clear_mark(&mut cell), MarkOutcome::NoChange);
        assert_eq!(cell.mark_by, None);
    }

    #[test]
    fn digits_are_validated_against_mode() {
        assert_eq!(validate_mark(0, 5), Ok(0));
        assert_eq!(validate_mark(5, 5), Ok(5));
        assert_eq!(validate_mark(6, 5), Err(GameError::InvalidMark(6)));
    }

    #[test]
    fn pins_toggle_with_owner() {
        let mut cell = Cell::default();

        assert_eq!(toggle_pin(&mut cell, "carol"), PinOutcome::Pinned);
        assert_eq!(cell.pinned_by.as_deref(), Some("carol"));
        assert_eq!(toggle_pin(&mut cell, "dave"), PinOutcome::Unpinned);
        assert!(!cell.pinned);
        assert_eq!(cell.pinned_by, None);
    }

    #[test]
    fn number_toggle_only_on_defeated_monsters() {
        let mut alive = Cell::monster(2);
        assert_eq!(toggle_number(&mut alive), MarkOutcome::NoChange);

        let mut dead = Cell {
            is_dead: true,
            is_revealed: true,
            ..Cell::monster(2)
        };
        assert_eq!(toggle_number(&mut dead), MarkOutcome::Changed);
        assert!(dead.show_number);
    }
}
