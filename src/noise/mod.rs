//! Correlated noise engine: coarse grid sizing and the noise fields drawn on it.

pub mod field;
pub mod grid;

pub use field::{CoarseNoiseField, NoiseChannel, NoiseFields};
pub use grid::{CoarseGrid, GridShape};
