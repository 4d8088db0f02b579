//! Coarse correlation grid sizing.

use crate::catalogue::{FuelKind, NodeCatalogue, NodeCharacteristic};
use crate::config::CorrelationConfig;
use crate::error::{GenerationError, Result};

/// Largest cell count allowed along one axis of the coarse grid.
pub const MAX_AXIS_CELLS: usize = 10_000;

/// Cell counts of the coarse grid along x and y.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub nx: usize,
    pub ny: usize,
}

impl GridShape {
    /// Whether `(ix, iy)` is a valid cell.
    pub fn contains(&self, ix: i64, iy: i64) -> bool {
        ix >= 0 && iy >= 0 && (ix as usize) < self.nx && (iy as usize) < self.ny
    }
}

fn check_length(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(GenerationError::config(
            field,
            format!("correlation length {value} must be finite and > 0"),
        ));
    }
    Ok(())
}

/// Coordinates used for cell mapping: solar nodes are rescaled when a factor is set.
pub fn correlation_coordinates(node: &NodeCharacteristic, solar_scale: Option<f64>) -> (f64, f64) {
    match (&node.fuel, solar_scale) {
        (FuelKind::Solar, Some(scale)) => (node.x * scale, node.y * scale),
        _ => (node.x, node.y),
    }
}

/// Margin, in cells, that the coarse grid needs to cover every node.
///
/// Each node's (possibly rescaled) coordinate is mapped to a cell by floor
/// division with the correlation length; the result is the largest cell index
/// plus one over all nodes and both axes.
///
/// # Errors
///
/// Returns a configuration error if a correlation length is zero, negative or
/// not finite, or naming the first node that maps past [`MAX_AXIS_CELLS`].
pub fn add_dim(
    nodes: &[NodeCharacteristic],
    dx_corr: f64,
    dy_corr: f64,
    solar_scale: Option<f64>,
) -> Result<usize> {
    check_length("correlation.dx_corr", dx_corr)?;
    check_length("correlation.dy_corr", dy_corr)?;
    let mut margin = 0_usize;
    for node in nodes {
        let (x, y) = correlation_coordinates(node, solar_scale);
        let cells = (x / dx_corr).max(y / dy_corr).floor() + 1.0;
        if cells > MAX_AXIS_CELLS as f64 {
            return Err(GenerationError::config(
                format!("catalogue.{}", node.name),
                format!(
                    "coordinates ({x}, {y}) need {cells} correlation cells, above the limit of {MAX_AXIS_CELLS}"
                ),
            ));
        }
        margin = margin.max(cells as usize);
    }
    Ok(margin)
}

fn base_cells(field: &str, extent: f64, corr_length: f64) -> Result<usize> {
    let cells = (extent.max(0.0) / corr_length).floor() + 1.0;
    if !cells.is_finite() || cells > MAX_AXIS_CELLS as f64 {
        return Err(GenerationError::config(
            field,
            format!("extent {extent} needs {cells} correlation cells, above the limit of {MAX_AXIS_CELLS}"),
        ));
    }
    Ok(cells as usize)
}

/// The coarse grid shared by every noise channel of one call.
#[derive(Debug, Clone)]
pub struct CoarseGrid {
    dx_corr: f64,
    dy_corr: f64,
    solar_scale: Option<f64>,
    add_dim: usize,
    shape: GridShape,
}

impl CoarseGrid {
    /// Sizes the grid for `catalogue`.
    ///
    /// The base grid covers the configured domain (`lx`, `ly`); `add_dim`
    /// extra cells are appended on both axes.
    ///
    /// # Errors
    ///
    /// See [`add_dim`]; also returns a configuration error if the domain
    /// extent alone needs more than [`MAX_AXIS_CELLS`] cells on an axis.
    pub fn size(catalogue: &NodeCatalogue, corr: &CorrelationConfig) -> Result<Self> {
        let margin = add_dim(
            catalogue.nodes(),
            corr.dx_corr,
            corr.dy_corr,
            corr.scale_solar_coord_for_correlation,
        )?;
        let base_x = base_cells("correlation.lx", corr.lx, corr.dx_corr)?;
        let base_y = base_cells("correlation.ly", corr.ly, corr.dy_corr)?;
        Ok(Self {
            dx_corr: corr.dx_corr,
            dy_corr: corr.dy_corr,
            solar_scale: corr.scale_solar_coord_for_correlation,
            add_dim: margin,
            shape: GridShape {
                nx: base_x + margin,
                ny: base_y + margin,
            },
        })
    }

    pub fn add_dim(&self) -> usize {
        self.add_dim
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Cell a node maps to; may lie outside the grid only if sizing is wrong.
    pub fn cell_of(&self, node: &NodeCharacteristic) -> (i64, i64) {
        let (x, y) = correlation_coordinates(node, self.solar_scale);
        (
            (x / self.dx_corr).floor() as i64,
            (y / self.dy_corr).floor() as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenerationParameters;

    fn node(name: &str, fuel: FuelKind, x: f64, y: f64) -> NodeCharacteristic {
        NodeCharacteristic::new(name, fuel, x, y, 10.0, 20.0)
    }

    fn corr(d: f64, scale: Option<f64>) -> CorrelationConfig {
        let mut c = GenerationParameters::baseline().correlation;
        c.dx_corr = d;
        c.dy_corr = d;
        c.lx = 0.0;
        c.ly = 0.0;
        c.scale_solar_coord_for_correlation = scale;
        c
    }

    #[test]
    fn rescaled_solar_node_extends_margin() {
        let nodes = vec![node("s", FuelKind::Solar, 50.0, 50.0)];
        assert_eq!(add_dim(&nodes, 10.0, 10.0, Some(2.0)).unwrap(), 11);
        assert_eq!(add_dim(&nodes, 10.0, 10.0, None).unwrap(), 6);
    }

    #[test]
    fn wind_nodes_are_never_rescaled() {
        let nodes = vec![node("w", FuelKind::Wind, 50.0, 50.0)];
        assert_eq!(add_dim(&nodes, 10.0, 10.0, Some(2.0)).unwrap(), 6);
    }

    #[test]
    fn margin_takes_max_over_axes_and_nodes() {
        let nodes = vec![
            node("a", FuelKind::Wind, 95.0, 0.0),
            node("b", FuelKind::Other("hydro".into()), 0.0, 131.0),
        ];
        assert_eq!(add_dim(&nodes, 10.0, 20.0, None).unwrap(), 10);
    }

    #[test]
    fn zero_correlation_length_is_configuration_error() {
        let nodes = vec![node("a", FuelKind::Wind, 1.0, 1.0)];
        assert!(matches!(
            add_dim(&nodes, 0.0, 10.0, None),
            Err(GenerationError::Configuration(_))
        ));
        assert!(matches!(
            add_dim(&nodes, 10.0, -1.0, None),
            Err(GenerationError::Configuration(_))
        ));
    }

    #[test]
    fn far_node_is_rejected_by_name() {
        let nodes = vec![
            node("near", FuelKind::Wind, 10.0, 10.0),
            node("far", FuelKind::Wind, 1.0e12, 5.0),
        ];
        match add_dim(&nodes, 10.0, 10.0, None) {
            Err(GenerationError::Configuration(e)) => assert_eq!(e.field, "catalogue.far"),
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn oversized_domain_is_configuration_error() {
        let cat = NodeCatalogue::new(vec![node("w", FuelKind::Wind, 0.0, 0.0)]).unwrap();
        let mut c = corr(1.0, None);
        c.ly = 1.0e9;
        match CoarseGrid::size(&cat, &c) {
            Err(GenerationError::Configuration(e)) => assert_eq!(e.field, "correlation.ly"),
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn every_node_cell_is_inside_the_grid() {
        let nodes = vec![
            node("s1", FuelKind::Solar, 50.0, 50.0),
            node("s2", FuelKind::Solar, 0.0, 0.0),
            node("w1", FuelKind::Wind, 100.0, 3.0),
            node("w2", FuelKind::Wind, 99.9, 99.9),
        ];
        let cat = NodeCatalogue::new(nodes).unwrap();
        let grid = CoarseGrid::size(&cat, &corr(10.0, Some(2.0))).unwrap();
        for n in cat.nodes() {
            let (ix, iy) = grid.cell_of(n);
            assert!(grid.shape().contains(ix, iy), "{} at ({ix}, {iy})", n.name);
        }
        assert_eq!(grid.cell_of(&cat.nodes()[0]), (10, 10));
        assert_eq!(grid.add_dim(), 11);
    }

    #[test]
    fn base_grid_covers_domain_extent() {
        let cat = NodeCatalogue::new(vec![node("w", FuelKind::Wind, 0.0, 0.0)]).unwrap();
        let mut c = corr(250.0, None);
        c.lx = 1000.0;
        c.ly = 500.0;
        let grid = CoarseGrid::size(&cat, &c).unwrap();
        assert_eq!(grid.shape(), GridShape { nx: 6, ny: 4 });
    }
}
