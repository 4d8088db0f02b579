//! Output table assembly: forecast and actual variants, grouped by fuel.

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use rand::Rng;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

use crate::catalogue::NodeCatalogue;
use crate::error::{GenerationError, Result};
use crate::synth::NodeSeries;
use crate::time_axis::TimeAxis;

/// Multiplier applied to the nominal voltage of every node.
pub const VOLTAGE_UPLIFT: f64 = 1.04;

/// Compares names with embedded digit runs ordered numerically.
///
/// `gen_2` sorts before `gen_10`. Names equal under that rule (for example
/// `a01` and `a1`) fall back to plain string order, so the result is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key_cmp(a, b).then_with(|| a.cmp(b))
}

fn natural_key_cmp(a: &str, b: &str) -> Ordering {
    let (mut a, mut b) = (a.as_bytes(), b.as_bytes());
    loop {
        match (a.first(), b.first()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) if ca.is_ascii_digit() && cb.is_ascii_digit() => {
                let da = a.iter().take_while(|c| c.is_ascii_digit()).count();
                let db = b.iter().take_while(|c| c.is_ascii_digit()).count();
                let na = trim_zeros(&a[..da]);
                let nb = trim_zeros(&b[..db]);
                let ord = na.len().cmp(&nb.len()).then_with(|| na.cmp(nb));
                if ord != Ordering::Equal {
                    return ord;
                }
                a = &a[da..];
                b = &b[db..];
            }
            (Some(ca), Some(cb)) => {
                if ca != cb {
                    return ca.cmp(cb);
                }
                a = &a[1..];
                b = &b[1..];
            }
        }
    }
}

fn trim_zeros(digits: &[u8]) -> &[u8] {
    let skip = digits.iter().take_while(|c| **c == b'0').count();
    &digits[skip..]
}

/// Sorts names into canonical column order.
pub fn canonical_order<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut names: Vec<&str> = names.into_iter().collect();
    names.sort_by(|a, b| natural_cmp(a, b));
    names
}

/// One output table: named columns sharing a time index.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    name: &'static str,
    timestamps: Vec<NaiveDateTime>,
    with_index: bool,
    columns: Vec<String>,
    /// Column-major values.
    data: Vec<Vec<f64>>,
}

impl OutputTable {
    pub fn new(name: &'static str, timestamps: Vec<NaiveDateTime>, with_index: bool) -> Self {
        Self {
            name,
            timestamps,
            with_index,
            columns: Vec::new(),
            data: Vec::new(),
        }
    }

    /// File stem of the table, e.g. `solar_p`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the time index is written as the first column.
    pub fn with_index(&self) -> bool {
        self.with_index
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.timestamps.len()
    }

    /// Appends a column; `values` must hold one value per row.
    fn push_column(&mut self, name: &str, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.timestamps.len());
        self.columns.push(name.to_string());
        self.data.push(values);
    }

    /// Values of column `name`.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.data[i].as_slice())
    }

    /// Values of row `row`, in column order.
    pub fn row(&self, row: usize) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().map(move |col| col[row])
    }
}

/// Every table produced by one synthesis call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionChronics {
    pub solar_actual: OutputTable,
    pub solar_forecast: OutputTable,
    pub wind_actual: OutputTable,
    pub wind_forecast: OutputTable,
    pub prod_actual: OutputTable,
    pub prod_forecast: OutputTable,
    pub voltage: OutputTable,
}

impl ProductionChronics {
    /// All tables in write order.
    pub fn tables(&self) -> [&OutputTable; 7] {
        [
            &self.solar_actual,
            &self.solar_forecast,
            &self.wind_actual,
            &self.wind_forecast,
            &self.prod_actual,
            &self.prod_forecast,
            &self.voltage,
        ]
    }
}

/// Builds forecast and actual tables from raw node series.
///
/// Raw series span the output axis plus one step. The forecast at row `t`
/// is the raw value at `t + 1`; the actual at row `t` is the raw value at `t`
/// plus Gaussian noise of standard deviation `planned_std`.
#[derive(Debug, Clone)]
pub struct SeriesAssembler<'a> {
    axis: &'a TimeAxis,
    planned_std: f64,
}

impl<'a> SeriesAssembler<'a> {
    pub fn new(axis: &'a TimeAxis, planned_std: f64) -> Self {
        Self { axis, planned_std }
    }

    /// Assembles the seven output tables.
    ///
    /// Actual-table noise is drawn from `rng` for the solar, wind, then
    /// combined group, each row-major over canonical columns. Draws happen
    /// even when `planned_std` is zero, so the stream consumed depends only
    /// on the table shapes.
    ///
    /// # Errors
    ///
    /// Returns a data alignment error if a series is shorter than the axis
    /// plus one step.
    pub fn assemble(
        &self,
        rng: &mut StdRng,
        catalogue: &NodeCatalogue,
        solar: &[NodeSeries],
        wind: &[NodeSeries],
    ) -> Result<ProductionChronics> {
        let needed = self.axis.len() + 1;
        if let Some(s) = solar.iter().chain(wind).find(|s| s.values.len() < needed) {
            return Err(GenerationError::DataAlignment(format!(
                "series of node \"{}\" holds {} samples, expected {needed}",
                s.name,
                s.values.len()
            )));
        }

        let solar = sorted(solar.iter().collect());
        let wind = sorted(wind.iter().collect());
        let prod = sorted(solar.iter().chain(&wind).copied().collect());

        let solar_forecast = self.forecast("solar_p_forecasted", &solar);
        let wind_forecast = self.forecast("wind_p_forecasted", &wind);
        let prod_forecast = self.forecast("prod_p_forecasted", &prod);
        let solar_actual = self.actual(rng, "solar_p", &solar);
        let wind_actual = self.actual(rng, "wind_p", &wind);
        let prod_actual = self.actual(rng, "prod_p", &prod);

        Ok(ProductionChronics {
            solar_actual,
            solar_forecast,
            wind_actual,
            wind_forecast,
            prod_actual,
            prod_forecast,
            voltage: self.voltage(catalogue),
        })
    }

    fn forecast(&self, name: &'static str, series: &[&NodeSeries]) -> OutputTable {
        let n = self.axis.len();
        let mut table = OutputTable::new(name, self.axis.timestamps().collect(), false);
        for s in series {
            table.push_column(&s.name, s.values[1..=n].to_vec());
        }
        table
    }

    fn actual(&self, rng: &mut StdRng, name: &'static str, series: &[&NodeSeries]) -> OutputTable {
        let n = self.axis.len();
        let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(n); series.len()];
        for t in 0..n {
            for (col, s) in columns.iter_mut().zip(series) {
                let z: f64 = rng.sample(StandardNormal);
                let value = s.values[t] + self.planned_std * z;
                col.push(value.clamp(0.0, s.upper_bound()));
            }
        }
        let mut table = OutputTable::new(name, self.axis.timestamps().collect(), true);
        for (s, values) in series.iter().zip(columns) {
            table.push_column(&s.name, values);
        }
        table
    }

    fn voltage(&self, catalogue: &NodeCatalogue) -> OutputTable {
        let n = self.axis.len();
        let mut table = OutputTable::new("prod_v", self.axis.timestamps().collect(), false);
        for name in canonical_order(catalogue.nodes().iter().map(|node| node.name.as_str())) {
            if let Some(node) = catalogue.get(name) {
                table.push_column(name, vec![node.voltage * VOLTAGE_UPLIFT; n]);
            }
        }
        table
    }
}

fn sorted(mut series: Vec<&NodeSeries>) -> Vec<&NodeSeries> {
    series.sort_by(|a, b| natural_cmp(&a.name, &b.name));
    series
}
