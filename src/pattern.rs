//! Yearly irradiance template and its alignment to the output time axis.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::config::{PatternWrap, TrailingSample};
use crate::error::{GenerationError, Result};
use crate::time_axis::TimeAxis;

/// Hourly samples in a common year.
pub const HOURS_PER_YEAR: usize = 8760;
/// Hourly samples in a leap year.
pub const HOURS_PER_LEAP_YEAR: usize = 8784;

/// One year of hourly normalized solar output, shared by every solar node.
#[derive(Debug, Clone, PartialEq)]
pub struct IrradiancePattern {
    values: Vec<f64>,
}

impl IrradiancePattern {
    /// Wraps raw hourly samples.
    ///
    /// The trailing wrap-around sample (hour 0 of the next year) is removed
    /// according to `trailing`. Negative samples are clamped to zero.
    ///
    /// # Errors
    ///
    /// Returns a data alignment error if the remaining length is not one
    /// common or leap year, or if a sample is not finite.
    pub fn new(mut values: Vec<f64>, trailing: TrailingSample) -> Result<Self> {
        let drop_last = match trailing {
            TrailingSample::Auto => {
                values.len() == HOURS_PER_YEAR + 1 || values.len() == HOURS_PER_LEAP_YEAR + 1
            }
            TrailingSample::Drop => true,
            TrailingSample::Keep => false,
        };
        if drop_last {
            values.pop();
        }
        if values.len() != HOURS_PER_YEAR && values.len() != HOURS_PER_LEAP_YEAR {
            return Err(GenerationError::DataAlignment(format!(
                "irradiance template holds {} hourly samples, expected {HOURS_PER_YEAR} or {HOURS_PER_LEAP_YEAR}",
                values.len()
            )));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(GenerationError::DataAlignment(format!(
                "irradiance template sample {i} is not finite"
            )));
        }
        for v in &mut values {
            *v = v.max(0.0);
        }
        Ok(Self { values })
    }

    /// Reads a single-column template file; an optional header line is skipped.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened, otherwise see
    /// [`IrradiancePattern::from_reader`].
    pub fn from_csv_path(path: &Path, trailing: TrailingSample) -> Result<Self> {
        let file = File::open(path).map_err(|e| GenerationError::io(path, e))?;
        Self::from_reader(file, trailing)
    }

    /// Reads a single-column template from any CSV source.
    ///
    /// Only the first field of each record is used.
    ///
    /// # Errors
    ///
    /// Returns a CSV error on unreadable input and a data alignment error on a
    /// non-numeric sample or a wrong length.
    pub fn from_reader(reader: impl Read, trailing: TrailingSample) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut values = Vec::with_capacity(HOURS_PER_LEAP_YEAR + 1);
        for (line, record) in rdr.records().enumerate() {
            let record = record?;
            let Some(field) = record.get(0) else {
                continue;
            };
            match field.parse::<f64>() {
                Ok(v) => values.push(v),
                Err(_) if line == 0 => {}
                Err(_) => {
                    return Err(GenerationError::DataAlignment(format!(
                        "irradiance template line {} is not a number: \"{field}\"",
                        line + 1
                    )));
                }
            }
        }
        Self::new(values, trailing)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Resamples the template onto `axis`.
    ///
    /// Hour 0 of the template is January 1st 00:00 of the axis' start year;
    /// values between hourly samples are linearly interpolated. The last
    /// `lookahead` steps of `axis` extend past the output window; under
    /// [`PatternWrap::SingleYear`] they are held at the final template hour
    /// instead of failing, as is any instant after the final hour.
    ///
    /// # Errors
    ///
    /// Returns a data alignment error if the timestep neither divides nor is
    /// a multiple of one hour, or, under [`PatternWrap::SingleYear`], if a
    /// window step leaves the template year.
    pub fn align(&self, axis: &TimeAxis, lookahead: usize, wrap: PatternWrap) -> Result<Vec<f64>> {
        let dt = axis.dt_minutes();
        if 60 % dt != 0 && dt % 60 != 0 {
            return Err(GenerationError::DataAlignment(format!(
                "timestep of {dt} min cannot be aligned to an hourly template"
            )));
        }
        let n = self.values.len();
        let window = axis.len().saturating_sub(lookahead);
        let mut aligned = Vec::with_capacity(axis.len());
        for i in 0..axis.len() {
            let hours = axis.hours_since_year_start(i);
            let h0 = hours.floor();
            let frac = hours - h0;
            let h0 = h0 as usize;
            let value = match wrap {
                PatternWrap::Periodic => {
                    let (a, b) = (self.values[h0 % n], self.values[(h0 + 1) % n]);
                    a + (b - a) * frac
                }
                PatternWrap::SingleYear if h0 >= n => {
                    if i < window {
                        return Err(GenerationError::DataAlignment(format!(
                            "{} falls outside the {n}-hour irradiance template year",
                            axis.timestamp(i)
                        )));
                    }
                    self.values[n - 1]
                }
                PatternWrap::SingleYear if h0 + 1 == n => self.values[h0],
                PatternWrap::SingleYear => {
                    let (a, b) = (self.values[h0], self.values[h0 + 1]);
                    a + (b - a) * frac
                }
            };
            aligned.push(value);
        }
        Ok(aligned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ramp(len: usize) -> Vec<f64> {
        (0..len).map(|h| (h % 24) as f64 / 23.0).collect()
    }

    fn axis(y: i32, m: u32, d: u32, days: i64, dt: u32) -> TimeAxis {
        let start = NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        TimeAxis::new(start, start + chrono::Duration::days(days), dt, false).unwrap()
    }

    #[test]
    fn trailing_duplicate_is_dropped_automatically() {
        let p = IrradiancePattern::new(ramp(HOURS_PER_YEAR + 1), TrailingSample::Auto).unwrap();
        assert_eq!(p.len(), HOURS_PER_YEAR);
        let p = IrradiancePattern::new(ramp(HOURS_PER_YEAR), TrailingSample::Auto).unwrap();
        assert_eq!(p.len(), HOURS_PER_YEAR);
    }

    #[test]
    fn keep_rejects_wrap_sample() {
        let err = IrradiancePattern::new(ramp(HOURS_PER_YEAR + 1), TrailingSample::Keep);
        assert!(matches!(err, Err(GenerationError::DataAlignment(_))));
    }

    #[test]
    fn wrong_length_is_alignment_error() {
        let err = IrradiancePattern::new(ramp(100), TrailingSample::Auto);
        assert!(matches!(err, Err(GenerationError::DataAlignment(_))));
    }

    #[test]
    fn negative_samples_are_clamped() {
        let mut raw = ramp(HOURS_PER_YEAR);
        raw[3] = -0.5;
        let p = IrradiancePattern::new(raw, TrailingSample::Keep).unwrap();
        assert_eq!(p.values()[3], 0.0);
    }

    #[test]
    fn reader_skips_header_line() {
        let mut text = String::from("solar\n");
        for v in ramp(HOURS_PER_YEAR + 1) {
            text.push_str(&format!("{v}\n"));
        }
        let p = IrradiancePattern::from_reader(text.as_bytes(), TrailingSample::Auto).unwrap();
        assert_eq!(p.len(), HOURS_PER_YEAR);
    }

    #[test]
    fn reader_rejects_garbage_after_header() {
        let text = "solar\n0.1\nnope\n";
        let err = IrradiancePattern::from_reader(text.as_bytes(), TrailingSample::Auto);
        assert!(matches!(err, Err(GenerationError::DataAlignment(_))));
    }

    #[test]
    fn align_interpolates_between_hours() {
        let p = IrradiancePattern::new(ramp(HOURS_PER_YEAR), TrailingSample::Keep).unwrap();
        let a = axis(2013, 1, 1, 1, 30);
        let aligned = p.align(&a, 0, PatternWrap::Periodic).unwrap();
        assert_eq!(aligned.len(), 48);
        assert_eq!(aligned[2], p.values()[1]);
        let mid = (p.values()[1] + p.values()[2]) / 2.0;
        assert!((aligned[3] - mid).abs() < 1e-12);
    }

    #[test]
    fn align_starts_at_day_of_year() {
        let p = IrradiancePattern::new(
            (0..HOURS_PER_YEAR).map(|h| h as f64).collect(),
            TrailingSample::Keep,
        )
        .unwrap();
        let a = axis(2013, 2, 1, 1, 60);
        let aligned = p.align(&a, 0, PatternWrap::Periodic).unwrap();
        assert_eq!(aligned[0], 31.0 * 24.0);
    }

    #[test]
    fn periodic_wraps_past_year_end() {
        let p = IrradiancePattern::new(ramp(HOURS_PER_YEAR), TrailingSample::Keep).unwrap();
        let a = axis(2013, 12, 31, 2, 60);
        let aligned = p.align(&a, 0, PatternWrap::Periodic).unwrap();
        assert_eq!(aligned[24], p.values()[0]);
    }

    #[test]
    fn single_year_rejects_window_past_year_end() {
        let p = IrradiancePattern::new(ramp(HOURS_PER_YEAR), TrailingSample::Keep).unwrap();
        let a = axis(2013, 12, 31, 2, 60);
        let err = p.align(&a, 0, PatternWrap::SingleYear);
        assert!(matches!(err, Err(GenerationError::DataAlignment(_))));
    }

    #[test]
    fn incompatible_timestep_is_alignment_error() {
        let p = IrradiancePattern::new(ramp(HOURS_PER_YEAR), TrailingSample::Keep).unwrap();
        let a = axis(2013, 1, 1, 1, 7);
        assert!(matches!(
            p.align(&a, 0, PatternWrap::Periodic),
            Err(GenerationError::DataAlignment(_))
        ));
    }

    #[test]
    fn single_year_covers_a_full_calendar_year() {
        let p = IrradiancePattern::new(ramp(HOURS_PER_YEAR), TrailingSample::Keep).unwrap();
        let horizon = axis(2013, 1, 1, 365, 60).extended(1);
        let aligned = p.align(&horizon, 1, PatternWrap::SingleYear).unwrap();
        assert_eq!(aligned.len(), HOURS_PER_YEAR + 1);
        assert_eq!(aligned[HOURS_PER_YEAR - 1], p.values()[HOURS_PER_YEAR - 1]);
        assert_eq!(aligned[HOURS_PER_YEAR], p.values()[HOURS_PER_YEAR - 1]);
    }

    #[test]
    fn single_year_holds_the_last_hour_on_new_years_eve() {
        let p = IrradiancePattern::new(ramp(HOURS_PER_YEAR), TrailingSample::Keep).unwrap();
        let horizon = axis(2013, 12, 31, 1, 5).extended(1);
        let aligned = p.align(&horizon, 1, PatternWrap::SingleYear).unwrap();
        assert_eq!(aligned.len(), 24 * 12 + 1);
        let last = p.values()[HOURS_PER_YEAR - 1];
        assert!(aligned[23 * 12..].iter().all(|v| *v == last));
    }

    #[test]
    fn single_year_still_rejects_window_steps_past_year_end() {
        let p = IrradiancePattern::new(ramp(HOURS_PER_YEAR), TrailingSample::Keep).unwrap();
        let horizon = axis(2013, 12, 31, 2, 60).extended(1);
        let err = p.align(&horizon, 1, PatternWrap::SingleYear);
        assert!(matches!(err, Err(GenerationError::DataAlignment(_))));
    }
}
