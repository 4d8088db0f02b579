//! Output serialization.

pub mod export;

pub use export::{CsvTableWriter, TableWriter, write_chronics};
