//! Solar production: irradiance template modulated by correlated cloud noise.

use crate::catalogue::NodeCharacteristic;
use crate::config::ProductionConfig;
use crate::error::{GenerationError, Result};
use crate::noise::{CoarseGrid, CoarseNoiseField};
use crate::synth::{NodeSeries, ProductionModel};
use crate::time_axis::TimeAxis;

/// Solar model shared by every solar node of one call.
///
/// The normalized output at step `t` is
/// ```text
/// max(0, pattern(t) * (base_factor + smoothdist * noise(cell, t)))
/// ```
/// scaled by the node's `Pmax`. Nodes in the same coarse cell read the same
/// noise, so their outputs differ only by capacity.
#[derive(Debug, Clone)]
pub struct SolarModel<'a> {
    grid: &'a CoarseGrid,
    field: &'a CoarseNoiseField,
    horizon: &'a TimeAxis,
    /// Template aligned on `horizon`.
    pattern: &'a [f64],
    smoothdist: f64,
    base_factor: f64,
}

impl<'a> SolarModel<'a> {
    /// # Errors
    ///
    /// Returns a data alignment error if `pattern` is shorter than `horizon`.
    pub fn new(
        grid: &'a CoarseGrid,
        field: &'a CoarseNoiseField,
        horizon: &'a TimeAxis,
        pattern: &'a [f64],
        production: &ProductionConfig,
    ) -> Result<Self> {
        if pattern.len() < horizon.len() {
            return Err(GenerationError::DataAlignment(format!(
                "aligned irradiance holds {} samples for a {}-step horizon",
                pattern.len(),
                horizon.len()
            )));
        }
        Ok(Self {
            grid,
            field,
            horizon,
            pattern,
            smoothdist: production.smoothdist,
            base_factor: production.solar_base_factor,
        })
    }
}

impl ProductionModel for SolarModel<'_> {
    fn series(&self, node: &NodeCharacteristic) -> Result<NodeSeries> {
        let noise = self
            .field
            .trajectory(&node.name, self.grid.cell_of(node), self.horizon)?;
        let values = noise
            .iter()
            .zip(self.pattern)
            .map(|(z, p)| {
                let normalized = (p * (self.base_factor + self.smoothdist * z)).max(0.0);
                normalized * node.pmax
            })
            .collect();
        Ok(NodeSeries {
            name: node.name.clone(),
            fuel: node.fuel.clone(),
            pmax: node.pmax,
            values,
        })
    }

    fn model_type(&self) -> &'static str {
        "solar"
    }
}
