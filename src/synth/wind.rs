//! Wind production: seasonal capacity factor plus three-scale correlated noise.

use std::f64::consts::PI;

use crate::catalogue::NodeCharacteristic;
use crate::config::ProductionConfig;
use crate::error::Result;
use crate::noise::{CoarseGrid, NoiseFields};
use crate::synth::{NodeSeries, ProductionModel};
use crate::time_axis::TimeAxis;

/// Days per year used by the seasonal cycle.
const DAYS_PER_YEAR: f64 = 365.25;
/// Day of year (0-based) of the seasonal wind peak.
const SEASONAL_PEAK_DAY: f64 = 30.0;

/// Seasonal multiplier at fractional day of year `day`; peaks in late January.
pub fn seasonal_factor(day: f64, amplitude: f64) -> f64 {
    1.0 + amplitude * (2.0 * PI * (day - SEASONAL_PEAK_DAY) / DAYS_PER_YEAR).cos()
}

/// Wind model shared by every wind node of one call.
///
/// The normalized output at step `t` is
/// ```text
/// capacity_factor * seasonal(t) + smoothdist * (long + medium + short)
/// ```
/// scaled by `Pmax` and clamped to `[0, Pmax]`.
#[derive(Debug, Clone)]
pub struct WindModel<'a> {
    grid: &'a CoarseGrid,
    fields: &'a NoiseFields,
    horizon: &'a TimeAxis,
    smoothdist: f64,
    /// Seasonal mean capacity factor at each horizon step.
    mean: Vec<f64>,
}

impl<'a> WindModel<'a> {
    pub fn new(
        grid: &'a CoarseGrid,
        fields: &'a NoiseFields,
        horizon: &'a TimeAxis,
        production: &ProductionConfig,
    ) -> Self {
        let mean = (0..horizon.len())
            .map(|i| {
                production.wind_capacity_factor
                    * seasonal_factor(horizon.day_of_year(i), production.wind_seasonal_amplitude)
            })
            .collect();
        Self {
            grid,
            fields,
            horizon,
            smoothdist: production.smoothdist,
            mean,
        }
    }
}

impl ProductionModel for WindModel<'_> {
    fn series(&self, node: &NodeCharacteristic) -> Result<NodeSeries> {
        let cell = self.grid.cell_of(node);
        let long = self.fields.wind_long.trajectory(&node.name, cell, self.horizon)?;
        let medium = self.fields.wind_medium.trajectory(&node.name, cell, self.horizon)?;
        let short = self.fields.wind_short.trajectory(&node.name, cell, self.horizon)?;
        let values = (0..self.horizon.len())
            .map(|i| {
                let noise = long[i] + medium[i] + short[i];
                let normalized = self.mean[i] + self.smoothdist * noise;
                (normalized * node.pmax).clamp(0.0, node.pmax)
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
        "wind"
    }
}
