//! Pricing and settlement over chain state.

pub mod price;
pub mod settlement;

pub use price::{FLAT_MULTIPLIER, RISING_MULTIPLIER};
pub use settlement::Settlement;
