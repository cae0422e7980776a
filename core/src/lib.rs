#![no_std]

extern crate alloc;

pub use board::*;
pub use cell::*;
pub use combat::*;
pub use effects::*;
pub use engine::*;
pub use error::*;
pub use generator::*;
pub use marks::*;
pub use mode::*;
pub use reveal::*;
pub use room::*;
pub use types::*;

mod board;
mod cell;
mod combat;
mod effects;
mod engine;
mod error;
mod generator;
mod marks;
mod mode;
mod reveal;
mod room;
mod types;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

impl MarkOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Changed => true,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PinOutcome {
    Pinned,
    Unpinned,
}

impl PinOutcome {
    /// Pinning on is what triggers the ripple broadcast.
    pub const fn is_pinned(self) -> bool {
        matches!(self, Self::Pinned)
    }
}
