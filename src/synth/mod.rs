//! Per-node production synthesis from the shared noise fields.

/// Solar production model.
pub mod solar;
/// Wind production model.
pub mod wind;

pub use solar::SolarModel;
pub use wind::WindModel;

use crate::catalogue::{FuelKind, NodeCharacteristic};
use crate::error::Result;

/// Raw production of one node over the synthesis horizon (MW).
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSeries {
    pub name: String,
    pub fuel: FuelKind,
    pub pmax: f64,
    pub values: Vec<f64>,
}

impl NodeSeries {
    /// Upper clamp for noisy variants of this series.
    pub fn upper_bound(&self) -> f64 {
        match self.fuel {
            FuelKind::Wind => self.pmax,
            _ => f64::INFINITY,
        }
    }
}

/// A production model turning a catalogue node into a raw series.
pub trait ProductionModel {
    /// Synthesizes the raw series of `node` over the model's horizon.
    fn series(&self, node: &NodeCharacteristic) -> Result<NodeSeries>;

    /// Short model name used in logs.
    fn model_type(&self) -> &'static str;

    /// Synthesizes every node in `nodes`, in order.
    fn series_all(&self, nodes: &[&NodeCharacteristic]) -> Result<Vec<NodeSeries>> {
        nodes.iter().map(|n| self.series(n)).collect()
    }
}
