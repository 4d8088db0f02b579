//! Spatially and temporally correlated solar and wind production chronics.

pub mod assemble;
/// Scenario and start-date fan-out.
pub mod batch;
pub mod catalogue;
pub mod config;
pub mod error;
pub mod generator;
pub mod io;
/// Correlated noise engine.
pub mod noise;
pub mod pattern;
pub mod report;
/// Per-node solar and wind models.
pub mod synth;
pub mod time_axis;

pub use error::{GenerationError, Result};
pub use generator::{GenerationOutput, generate};
