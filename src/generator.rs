//! Single-call synthesis pipeline: grid, noise, node models, tables, files.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::assemble::{ProductionChronics, SeriesAssembler};
use crate::catalogue::NodeCatalogue;
use crate::config::GenerationParameters;
use crate::error::{GenerationError, Result};
use crate::io::export::{CsvTableWriter, write_chronics};
use crate::noise::{CoarseGrid, NoiseFields};
use crate::pattern::IrradiancePattern;
use crate::report::ProductionReport;
use crate::synth::{ProductionModel, SolarModel, WindModel};
use crate::time_axis::TimeAxis;

/// Everything one synthesis call produced.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub chronics: ProductionChronics,
    pub report: ProductionReport,
    /// Margin added to the coarse grid.
    pub add_dim: usize,
    /// Files written, empty when no destination was given.
    pub written: Vec<PathBuf>,
}

/// Synthesizes solar and wind chronics for `catalogue`.
///
/// The whole call is a pure function of its inputs and `seed`: one random
/// stream is seeded from it and consumed in a fixed order (the four noise
/// fields, then the actual-table noise of the solar, wind and combined
/// groups). With `destination = None` nothing touches the filesystem.
///
/// # Errors
///
/// Returns the first configuration, alignment, bounds or I/O error met.
/// When writing fails no table file is left in `destination`.
pub fn generate(
    params: &GenerationParameters,
    catalogue: &NodeCatalogue,
    pattern: &IrradiancePattern,
    seed: u64,
    destination: Option<&Path>,
) -> Result<GenerationOutput> {
    if let Some(err) = params.validate().into_iter().next() {
        return Err(GenerationError::Configuration(err));
    }
    let writer = match destination {
        Some(_) => Some(CsvTableWriter::from_config(&params.output)?),
        None => None,
    };

    let axis = TimeAxis::from_config(&params.time)?;
    let horizon = axis.extended(1);
    let grid = CoarseGrid::size(catalogue, &params.correlation)?;
    let shape = grid.shape();
    debug!(
        add_dim = grid.add_dim(),
        nx = shape.nx,
        ny = shape.ny,
        steps = axis.len(),
        "sized correlation grid"
    );

    let irradiance = pattern.align(&horizon, 1, params.pattern.wrap)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let fields = NoiseFields::generate(&mut rng, shape, &horizon, &params.correlation)?;

    let partition = catalogue.partition();
    let solar_model = SolarModel::new(
        &grid,
        &fields.solar,
        &horizon,
        &irradiance,
        &params.production,
    )?;
    let wind_model = WindModel::new(&grid, &fields, &horizon, &params.production);
    let solar = solar_model.series_all(&partition.solar)?;
    let wind = wind_model.series_all(&partition.wind)?;
    debug!(
        solar = solar.len(),
        wind = wind.len(),
        other = partition.other.len(),
        "synthesized node series"
    );

    let chronics = SeriesAssembler::new(&axis, params.production.planned_std).assemble(
        &mut rng,
        catalogue,
        &solar,
        &wind,
    )?;
    let report = ProductionReport::from_chronics(&chronics, catalogue, axis.dt_minutes());

    let written = match (destination, writer) {
        (Some(dir), Some(writer)) => {
            let files = write_chronics(dir, &chronics, &writer)?;
            info!(dir = %dir.display(), files = files.len(), "wrote production chronics");
            files
        }
        _ => Vec::new(),
    };

    info!(
        seed,
        start = %axis.start(),
        steps = axis.len(),
        solar_mwh = report.solar.energy_mwh,
        wind_mwh = report.wind.energy_mwh,
        "generated renewable chronics"
    );

    Ok(GenerationOutput {
        chronics,
        report,
        add_dim: grid.add_dim(),
        written,
    })
}
