//! Client side of a shared room: the document store contract, an in-memory store, and the per-player coordinator
//! that turns game actions into optimistic transactions.

pub use client::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use feed::*;
pub use memory::*;
pub use press::*;
pub use schedule::*;
pub use store::*;

mod client;
mod clock;
mod config;
mod error;
mod feed;
mod memory;
mod press;
mod schedule;
mod store;
