use crate::*;
pub use random::*;

mod random;

pub trait BoardGenerator {
    fn generate(self, config: &ModeConfig) -> Board;
}

/// Cells that must stay free of monsters.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SafeZone {
    /// No restriction, used for preview boards before the first click.
    None,
    /// The 3x3 block centered on the first click.
    Around(Coord2),
}

impl SafeZone {
    pub const fn contains(self, coords: Coord2) -> bool {
        match self {
            Self::None => false,
            Self::Around(center) => is_adjacent_or_same(center, coords),
        }
    }
}
