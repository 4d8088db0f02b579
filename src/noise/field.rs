//! Spatio-temporally correlated Gaussian noise on the coarse grid.

use rand::Rng;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

use crate::config::CorrelationConfig;
use crate::error::{GenerationError, Result};
use crate::noise::grid::GridShape;
use crate::time_axis::TimeAxis;

/// Largest number of values one field may hold (cells times knots).
pub const MAX_FIELD_VALUES: usize = 50_000_000;

/// Independent noise field kinds, listed in draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoiseChannel {
    Solar,
    WindLong,
    WindMedium,
    WindShort,
}

impl NoiseChannel {
    /// Order in which channels consume the random stream.
    pub const DRAW_ORDER: [NoiseChannel; 4] = [
        NoiseChannel::Solar,
        NoiseChannel::WindLong,
        NoiseChannel::WindMedium,
        NoiseChannel::WindShort,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Solar => "solar",
            Self::WindLong => "wind-long",
            Self::WindMedium => "wind-medium",
            Self::WindShort => "wind-short",
        }
    }

    /// Configuration key holding this channel's knot spacing.
    pub fn config_field(&self) -> &'static str {
        match self {
            Self::Solar => "correlation.solar_corr",
            Self::WindLong => "correlation.long_wind_corr",
            Self::WindMedium => "correlation.medium_wind_corr",
            Self::WindShort => "correlation.short_wind_corr",
        }
    }

    /// Temporal correlation length (knot spacing) of this channel, in minutes.
    pub fn knot_minutes(&self, corr: &CorrelationConfig) -> u32 {
        match self {
            Self::Solar => corr.solar_corr,
            Self::WindLong => corr.long_wind_corr,
            Self::WindMedium => corr.medium_wind_corr,
            Self::WindShort => corr.short_wind_corr,
        }
    }
}

/// Standard-normal noise sampled on the coarse grid at temporal knots.
///
/// White draws are smoothed over each cell's 3x3 neighbourhood so adjacent
/// cells share part of their noise while the per-cell variance stays one.
#[derive(Debug, Clone)]
pub struct CoarseNoiseField {
    channel: NoiseChannel,
    shape: GridShape,
    knots: usize,
    knot_minutes: u32,
    /// x-major, then y, then knot.
    values: Vec<f64>,
}

impl CoarseNoiseField {
    /// Draws a field covering `horizon_minutes` with knots every `knot_minutes`.
    ///
    /// Exactly `nx * ny * knots` normals are taken from `rng`, x-major then y
    /// then knot, where `knots = horizon_minutes / knot_minutes + 2`.
    pub fn generate(
        rng: &mut StdRng,
        channel: NoiseChannel,
        shape: GridShape,
        horizon_minutes: u64,
        knot_minutes: u32,
    ) -> Self {
        let knot_minutes = knot_minutes.max(1);
        let knots = knot_count(horizon_minutes, knot_minutes);
        let total = shape.nx * shape.ny * knots;
        let white: Vec<f64> = (0..total).map(|_| rng.sample(StandardNormal)).collect();

        let idx = |x: usize, y: usize, k: usize| (x * shape.ny + y) * knots + k;
        let mut values = vec![0.0; total];
        for x in 0..shape.nx {
            for y in 0..shape.ny {
                let xs = x.saturating_sub(1)..=(x + 1).min(shape.nx - 1);
                let ys = y.saturating_sub(1)..=(y + 1).min(shape.ny - 1);
                let count = (xs.clone().count() * ys.clone().count()) as f64;
                let norm = count.sqrt();
                for k in 0..knots {
                    let mut sum = 0.0;
                    for xi in xs.clone() {
                        for yi in ys.clone() {
                            sum += white[idx(xi, yi, k)];
                        }
                    }
                    values[idx(x, y, k)] = sum / norm;
                }
            }
        }

        Self {
            channel,
            shape,
            knots,
            knot_minutes,
            values,
        }
    }

    pub fn channel(&self) -> NoiseChannel {
        self.channel
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn knots(&self) -> usize {
        self.knots
    }

    /// Knot values of one cell; `None` outside the grid.
    pub fn knot_series(&self, ix: i64, iy: i64) -> Option<&[f64]> {
        if !self.shape.contains(ix, iy) {
            return None;
        }
        let start = (ix as usize * self.shape.ny + iy as usize) * self.knots;
        Some(&self.values[start..start + self.knots])
    }

    /// Noise trajectory of cell `(ix, iy)` resampled on `axis`.
    ///
    /// Between two knots the value is the variance-preserving blend
    /// `((1-w)a + w b) / sqrt((1-w)^2 + w^2)`, so every sample stays standard
    /// normal.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::OutOfBounds`] naming `node` when the cell
    /// lies outside the field.
    pub fn trajectory(&self, node: &str, cell: (i64, i64), axis: &TimeAxis) -> Result<Vec<f64>> {
        let (ix, iy) = cell;
        let knots = self
            .knot_series(ix, iy)
            .ok_or_else(|| GenerationError::OutOfBounds {
                node: node.to_string(),
                channel: self.channel.label(),
                x: ix,
                y: iy,
                nx: self.shape.nx,
                ny: self.shape.ny,
            })?;
        let spacing = u64::from(self.knot_minutes);
        let mut out = Vec::with_capacity(axis.len());
        for i in 0..axis.len() {
            let t = axis.minutes_at(i);
            let k = (t / spacing) as usize;
            let w = (t % spacing) as f64 / spacing as f64;
            let a = knots[k.min(self.knots - 1)];
            let b = knots[(k + 1).min(self.knots - 1)];
            let blend = if w == 0.0 {
                a
            } else {
                ((1.0 - w) * a + w * b) / ((1.0 - w).powi(2) + w * w).sqrt()
            };
            out.push(blend);
        }
        Ok(out)
    }
}

fn knot_count(horizon_minutes: u64, knot_minutes: u32) -> usize {
    let knots = horizon_minutes / u64::from(knot_minutes.max(1)) + 2;
    usize::try_from(knots).unwrap_or(usize::MAX)
}

/// Number of values a field of `shape` holds, if it stays within [`MAX_FIELD_VALUES`].
pub fn field_size(shape: GridShape, horizon_minutes: u64, knot_minutes: u32) -> Option<usize> {
    shape
        .nx
        .checked_mul(shape.ny)
        .and_then(|cells| cells.checked_mul(knot_count(horizon_minutes, knot_minutes)))
        .filter(|total| *total <= MAX_FIELD_VALUES)
}

/// The four noise fields of one synthesis call.
#[derive(Debug, Clone)]
pub struct NoiseFields {
    pub solar: CoarseNoiseField,
    pub wind_long: CoarseNoiseField,
    pub wind_medium: CoarseNoiseField,
    pub wind_short: CoarseNoiseField,
}

impl NoiseFields {
    /// Draws every channel in [`NoiseChannel::DRAW_ORDER`] over the span of `horizon`.
    ///
    /// All four channels are drawn even if the catalogue has no node of the
    /// matching fuel, so the random stream consumed here depends only on the
    /// grid shape, the horizon and the correlation lengths.
    ///
    /// # Errors
    ///
    /// Returns a configuration error, before anything is drawn, if a channel
    /// would exceed [`MAX_FIELD_VALUES`].
    pub fn generate(
        rng: &mut StdRng,
        shape: GridShape,
        horizon: &TimeAxis,
        corr: &CorrelationConfig,
    ) -> Result<Self> {
        let span = horizon.span_minutes();
        for channel in NoiseChannel::DRAW_ORDER {
            let knot_minutes = channel.knot_minutes(corr);
            if field_size(shape, span, knot_minutes).is_none() {
                return Err(GenerationError::config(
                    channel.config_field(),
                    format!(
                        "{} field of {}x{} cells with knots every {knot_minutes} min over {span} min exceeds {MAX_FIELD_VALUES} values",
                        channel.label(),
                        shape.nx,
                        shape.ny
                    ),
                ));
            }
        }
        let mut draw = |channel: NoiseChannel| {
            CoarseNoiseField::generate(rng, channel, shape, span, channel.knot_minutes(corr))
        };
        let [solar, long, medium, short] = NoiseChannel::DRAW_ORDER;
        let solar = draw(solar);
        let wind_long = draw(long);
        let wind_medium = draw(medium);
        let wind_short = draw(short);
        Ok(Self {
            solar,
            wind_long,
            wind_medium,
            wind_short,
        })
    }
}
