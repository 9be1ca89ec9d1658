//! Core traits and types shared by the Atom DVI crates.
//!
//! Every chip crate sees memory through [`Bus`], advances through
//! [`Tickable`], and reports its state through [`Observable`]. Video crates
//! share the RGB332 [`pixel`] colours and the 12-row [`Font`] glyph tables.

mod bus;
mod clock;
mod font;
mod observable;
pub mod pixel;
mod tickable;
mod ticks;

pub use bus::{Bus, RamBus};
pub use clock::MasterClock;
pub use font::{Font, GLYPH_ROWS};
pub use observable::{Observable, Value};
pub use pixel::Pixel;
pub use tickable::Tickable;
pub use ticks::Ticks;
