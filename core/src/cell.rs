use alloc::string::String;
use serde::{Deserialize, Serialize};

/// Shared per-cell state as stored in the room document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cell {
    pub is_monster: bool,
    pub monster_level: u8,
    pub monster_hp: i32,
    pub monster_max_hp: i32,
    pub is_revealed: bool,
    pub is_dead: bool,
    /// Defeated monsters can display their neighbor sum instead of the monster.
    pub show_number: bool,
    pub mark: u8,
    pub mark_by: Option<String>,
    pub pinned: bool,
    pub pinned_by: Option<String>,
    pub neighbor_sum: u16,
    pub revealed_by: Option<String>,
}

impl Cell {
    pub fn monster(level: u8) -> Self {
        Self {
            is_monster: true,
            monster_level: level,
            monster_hp: level.into(),
            monster_max_hp: level.into(),
            ..Default::default()
        }
    }

    pub const fn is_marked(&self) -> bool {
        self.mark > 0
    }

    /// A monster that still has to be dealt with.
    pub const fn is_live_monster(&self) -> bool {
        self.is_monster && !self.is_dead
    }

    pub const fn is_hidden(&self) -> bool {
        !self.is_revealed
    }
}
