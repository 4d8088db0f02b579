//! Generation node catalogue: loading, validation and fuel partitioning.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::error::{GenerationError, Result};

/// Fuel type of a generation node, resolved once when the catalogue is read.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FuelKind {
    Solar,
    Wind,
    /// Any other technology (thermal, hydro, nuclear, ...); kept for voltages only.
    Other(String),
}

impl FuelKind {
    /// Maps a catalogue `type` label to a fuel kind.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "solar" => Self::Solar,
            "wind" => Self::Wind,
            other => Self::Other(other.to_string()),
        }
    }

    /// Catalogue label of this fuel kind.
    pub fn label(&self) -> &str {
        match self {
            Self::Solar => "solar",
            Self::Wind => "wind",
            Self::Other(label) => label,
        }
    }
}

/// One generation node of the catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeCharacteristic {
    /// Unique node name; also the output column name.
    pub name: String,
    pub fuel: FuelKind,
    /// Planar x coordinate, same unit as the correlation lengths.
    pub x: f64,
    /// Planar y coordinate.
    pub y: f64,
    /// Nominal capacity (MW).
    pub pmax: f64,
    /// Nominal voltage setpoint (kV).
    pub voltage: f64,
}

impl NodeCharacteristic {
    pub fn new(name: &str, fuel: FuelKind, x: f64, y: f64, pmax: f64, voltage: f64) -> Self {
        Self {
            name: name.to_string(),
            fuel,
            x,
            y,
            pmax,
            voltage,
        }
    }
}

/// Raw catalogue row as laid out in `prods_charac.csv`.
#[derive(Debug, Deserialize)]
struct CatalogueRow {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    x: f64,
    y: f64,
    #[serde(rename = "Pmax")]
    pmax: f64,
    #[serde(rename = "V")]
    voltage: f64,
}

/// Validated, read-only node catalogue.
#[derive(Debug, Clone)]
pub struct NodeCatalogue {
    nodes: Vec<NodeCharacteristic>,
}

/// Nodes split by fuel kind, each list in catalogue order.
#[derive(Debug)]
pub struct FuelPartition<'a> {
    pub solar: Vec<&'a NodeCharacteristic>,
    pub wind: Vec<&'a NodeCharacteristic>,
    pub other: Vec<&'a NodeCharacteristic>,
}

impl NodeCatalogue {
    /// Validates and wraps a list of nodes.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the offending node when the list
    /// is empty, a name is duplicated or blank, a coordinate is negative or
    /// non-finite, `Pmax` is not positive, or `V` is negative.
    pub fn new(nodes: Vec<NodeCharacteristic>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(GenerationError::config("catalogue", "no generation node"));
        }
        let mut seen = BTreeSet::new();
        for node in &nodes {
            let field = format!("catalogue.{}", node.name);
            if node.name.trim().is_empty() {
                return Err(GenerationError::config("catalogue.name", "blank node name"));
            }
            if !seen.insert(node.name.as_str()) {
                return Err(GenerationError::config(field, "duplicate node name"));
            }
            if !node.x.is_finite() || !node.y.is_finite() || node.x < 0.0 || node.y < 0.0 {
                return Err(GenerationError::config(
                    field,
                    format!(
                        "coordinates ({}, {}) must be finite and >= 0",
                        node.x, node.y
                    ),
                ));
            }
            if !node.pmax.is_finite() || node.pmax <= 0.0 {
                return Err(GenerationError::config(
                    field,
                    format!("Pmax {} must be finite and > 0", node.pmax),
                ));
            }
            if !node.voltage.is_finite() || node.voltage < 0.0 {
                return Err(GenerationError::config(
                    field,
                    format!("V {} must be finite and >= 0", node.voltage),
                ));
            }
        }
        Ok(Self { nodes })
    }

    /// Reads a comma-separated catalogue with columns `name,type,x,y,Pmax,V`.
    ///
    /// Extra columns are ignored.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened, a CSV error on
    /// malformed rows, or a configuration error from [`NodeCatalogue::new`].
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| GenerationError::io(path, e))?;
        Self::from_reader(file)
    }

    /// Reads a catalogue from any CSV source.
    ///
    /// # Errors
    ///
    /// See [`NodeCatalogue::from_csv_path`].
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut nodes = Vec::new();
        for row in rdr.deserialize::<CatalogueRow>() {
            let row = row?;
            nodes.push(NodeCharacteristic {
                fuel: FuelKind::from_label(&row.kind),
                name: row.name,
                x: row.x,
                y: row.y,
                pmax: row.pmax,
                voltage: row.voltage,
            });
        }
        Self::new(nodes)
    }

    pub fn nodes(&self) -> &[NodeCharacteristic] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node by name.
    pub fn get(&self, name: &str) -> Option<&NodeCharacteristic> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Splits the catalogue by fuel kind; every node lands in exactly one list.
    pub fn partition(&self) -> FuelPartition<'_> {
        let mut partition = FuelPartition {
            solar: Vec::new(),
            wind: Vec::new(),
            other: Vec::new(),
        };
        for node in &self.nodes {
            match node.fuel {
                FuelKind::Solar => partition.solar.push(node),
                FuelKind::Wind => partition.wind.push(node),
                FuelKind::Other(_) => partition.other.push(node),
            }
        }
        partition
    }
}
