//! Value objects used across the keeper.

pub mod lamports;
pub mod price;
pub mod tick_range;

pub use lamports::{LAMPORTS_PER_SOL, Lamports};
pub use price::Price;
pub use tick_range::TickRange;
