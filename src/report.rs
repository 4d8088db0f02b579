//! Post-hoc production summary computed from the assembled tables.

use std::fmt;

use serde::Serialize;

use crate::assemble::{OutputTable, ProductionChronics};
use crate::catalogue::NodeCatalogue;

/// Aggregates of one production table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    /// Number of node columns.
    pub nodes: usize,
    /// Sum of node capacities (MW).
    pub installed_mw: f64,
    /// Energy over the window (MWh).
    pub energy_mwh: f64,
    /// Energy divided by installed capacity times window length.
    pub capacity_factor: f64,
    /// Largest row total (MW).
    pub peak_mw: f64,
}

impl GroupSummary {
    /// Computes the summary of `table`.
    ///
    /// Capacities are looked up in `catalogue` by column name.
    pub fn from_table(table: &OutputTable, catalogue: &NodeCatalogue, dt_hours: f64) -> Self {
        let installed_mw: f64 = table
            .columns()
            .iter()
            .filter_map(|c| catalogue.get(c))
            .map(|n| n.pmax)
            .sum();

        let mut energy_mwh = 0.0;
        let mut peak_mw = 0.0_f64;
        for row in 0..table.n_rows() {
            let total: f64 = table.row(row).sum();
            energy_mwh += total * dt_hours;
            peak_mw = peak_mw.max(total);
        }

        let hours = table.n_rows() as f64 * dt_hours;
        let capacity_factor = if installed_mw > 0.0 && hours > 0.0 {
            energy_mwh / (installed_mw * hours)
        } else {
            0.0
        };

        Self {
            nodes: table.columns().len(),
            installed_mw,
            energy_mwh,
            capacity_factor,
            peak_mw,
        }
    }
}

/// Summary of the actual solar and wind tables of one call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionReport {
    pub solar: GroupSummary,
    pub wind: GroupSummary,
    /// Number of timestamps.
    pub steps: usize,
}

impl ProductionReport {
    pub fn from_chronics(
        chronics: &ProductionChronics,
        catalogue: &NodeCatalogue,
        dt_minutes: u32,
    ) -> Self {
        let dt_hours = f64::from(dt_minutes) / 60.0;
        Self {
            solar: GroupSummary::from_table(&chronics.solar_actual, catalogue, dt_hours),
            wind: GroupSummary::from_table(&chronics.wind_actual, catalogue, dt_hours),
            steps: chronics.solar_actual.n_rows(),
        }
    }
}

impl fmt::Display for ProductionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Production Report ({} steps) ---", self.steps)?;
        for (label, g) in [("Solar", &self.solar), ("Wind", &self.wind)] {
            writeln!(
                f,
                "{label:<6} {:>4} nodes  {:>9.1} MW installed  {:>11.1} MWh  CF {:>5.1}%  peak {:.1} MW",
                g.nodes,
                g.installed_mw,
                g.energy_mwh,
                100.0 * g.capacity_factor,
                g.peak_mw
            )?;
        }
        Ok(())
    }
}
