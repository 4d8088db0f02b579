//! TOML-based generation parameters and the built-in baseline preset.

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use thiserror::Error;

/// Top-level generation parameters parsed from TOML.
///
/// `[time]`, `[correlation]` and `[production]` are required and carry the
/// keys every run must set explicitly. The remaining sections default to the
/// baseline values. Load with [`GenerationParameters::from_toml_file`] or use
/// [`GenerationParameters::baseline`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationParameters {
    /// Seed of the call-scoped random source.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Time window and resolution.
    pub time: TimeConfig,
    /// Spatial and temporal correlation scales of the noise fields.
    pub correlation: CorrelationConfig,
    /// How noise perturbs the deterministic production patterns.
    pub production: ProductionConfig,
    /// Irradiance template alignment.
    #[serde(default)]
    pub pattern: PatternConfig,
    /// Tabular writer formatting.
    #[serde(default)]
    pub output: OutputConfig,
    /// Scenario fan-out.
    #[serde(default)]
    pub batch: BatchConfig,
}

fn default_seed() -> u64 {
    42
}

/// Time window and resolution.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeConfig {
    /// First timestamp of the horizon (`YYYY-MM-DD[ HH:MM[:SS]]`).
    #[serde(deserialize_with = "datetime_format::deserialize")]
    pub start_date: NaiveDateTime,
    /// End of the horizon, excluded unless `end_inclusive` is set.
    #[serde(deserialize_with = "datetime_format::deserialize")]
    pub end_date: NaiveDateTime,
    /// Timestep in minutes (must be > 0).
    pub dt: u32,
    /// Whether a timestamp falling exactly on `end_date` is part of the axis.
    #[serde(default)]
    pub end_inclusive: bool,
}

/// Spatial and temporal correlation scales.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorrelationConfig {
    /// Correlation length along x (same unit as node coordinates).
    pub dx_corr: f64,
    /// Correlation length along y.
    pub dy_corr: f64,
    /// Domain extent along x covered by the base grid.
    #[serde(default)]
    pub lx: f64,
    /// Domain extent along y covered by the base grid.
    #[serde(default)]
    pub ly: f64,
    /// Temporal correlation of the solar channel (minutes).
    pub solar_corr: u32,
    /// Seasonal-drift wind channel (minutes).
    #[serde(default = "default_long_wind_corr")]
    pub long_wind_corr: u32,
    /// Weather-front wind channel (minutes).
    #[serde(default = "default_medium_wind_corr")]
    pub medium_wind_corr: u32,
    /// Gust wind channel (minutes).
    #[serde(default = "default_short_wind_corr")]
    pub short_wind_corr: u32,
    /// Factor applied to solar coordinates before cell mapping; absent means no rescale.
    #[serde(default)]
    pub scale_solar_coord_for_correlation: Option<f64>,
}

fn default_long_wind_corr() -> u32 {
    30 * 24 * 60
}

fn default_medium_wind_corr() -> u32 {
    2 * 24 * 60
}

fn default_short_wind_corr() -> u32 {
    60
}

/// How noise perturbs the deterministic production patterns.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductionConfig {
    /// Smoothing factor: weight of the raw noise in the normalized signal.
    pub smoothdist: f64,
    /// Standard deviation of the actual-vs-forecast noise (MW).
    pub planned_std: f64,
    /// Normalized solar level around which the solar noise fluctuates.
    #[serde(default = "default_solar_base_factor")]
    pub solar_base_factor: f64,
    /// Mean wind capacity factor before seasonal modulation.
    #[serde(default = "default_wind_capacity_factor")]
    pub wind_capacity_factor: f64,
    /// Relative amplitude of the yearly wind cycle (winter peak).
    #[serde(default = "default_wind_seasonal_amplitude")]
    pub wind_seasonal_amplitude: f64,
}

fn default_solar_base_factor() -> f64 {
    0.75
}

fn default_wind_capacity_factor() -> f64 {
    0.3
}

fn default_wind_seasonal_amplitude() -> f64 {
    0.3
}

/// Treatment of timestamps beyond the template's one-year span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternWrap {
    /// The template repeats every year.
    #[default]
    Periodic,
    /// The window must fit inside the template year.
    SingleYear,
}

/// Handling of a wrap-around duplicate at the end of the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailingSample {
    /// Drop the last sample when the length is one more than a whole year.
    #[default]
    Auto,
    /// Always drop the last sample.
    Drop,
    /// Never drop.
    Keep,
}

/// Irradiance template alignment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PatternConfig {
    pub wrap: PatternWrap,
    pub trailing_sample: TrailingSample,
}

/// Tabular writer formatting.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Field delimiter.
    pub delimiter: char,
    /// Digits after the decimal point.
    pub float_precision: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            delimiter: ';',
            float_precision: 1,
        }
    }
}

/// Scenario fan-out parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Number of scenarios per start date.
    pub scenarios: usize,
    /// Sub-period start dates; empty means `time.start_date` only.
    pub start_dates: Vec<String>,
    /// Worker threads (0 = one per CPU).
    pub threads: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenarios: 1,
            start_dates: Vec::new(),
            threads: 0,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"correlation.dx_corr"`) or node reference.
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl GenerationParameters {
    /// Returns the baseline parameters: one week at 5-minute resolution.
    pub fn baseline() -> Self {
        let start = NaiveDate::from_ymd_opt(2012, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self {
            seed: default_seed(),
            time: TimeConfig {
                start_date: start,
                end_date: start + chrono::Duration::days(7),
                dt: 5,
                end_inclusive: false,
            },
            correlation: CorrelationConfig {
                dx_corr: 250.0,
                dy_corr: 250.0,
                lx: 1000.0,
                ly: 1000.0,
                solar_corr: 240,
                long_wind_corr: default_long_wind_corr(),
                medium_wind_corr: default_medium_wind_corr(),
                short_wind_corr: default_short_wind_corr(),
                scale_solar_coord_for_correlation: None,
            },
            production: ProductionConfig {
                smoothdist: 0.15,
                planned_std: 0.01,
                solar_base_factor: default_solar_base_factor(),
                wind_capacity_factor: default_wind_capacity_factor(),
                wind_seasonal_amplitude: default_wind_seasonal_amplitude(),
            },
            pattern: PatternConfig::default(),
            output: OutputConfig::default(),
            batch: BatchConfig::default(),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline"];

    /// Loads parameters from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses parameters from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses parameters from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid, misses a required key,
    /// or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Batch start dates, falling back to `time.start_date`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` naming the first unparsable entry, or the first
    /// entry falling on the same calendar day as an earlier one. Batch jobs
    /// are keyed and stored by day.
    pub fn batch_start_dates(&self) -> Result<Vec<NaiveDateTime>, ConfigError> {
        if self.batch.start_dates.is_empty() {
            return Ok(vec![self.time.start_date]);
        }
        let mut dates: Vec<NaiveDateTime> = Vec::with_capacity(self.batch.start_dates.len());
        for (i, raw) in self.batch.start_dates.iter().enumerate() {
            let field = format!("batch.start_dates[{i}]");
            let date = datetime_format::parse(raw)
                .ok_or_else(|| ConfigError::new(field.clone(), format!("invalid date \"{raw}\"")))?;
            if let Some(j) = dates.iter().position(|d| d.date() == date.date()) {
                return Err(ConfigError::new(
                    field,
                    format!("falls on the same day as batch.start_dates[{j}]"),
                ));
            }
            dates.push(date);
        }
        Ok(dates)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the parameters are valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let t = &self.time;
        if t.dt == 0 {
            errors.push(ConfigError::new("time.dt", "must be > 0"));
        }
        if t.end_date <= t.start_date {
            errors.push(ConfigError::new(
                "time.end_date",
                "must be after time.start_date",
            ));
        } else if t.dt > 0 && !t.end_inclusive {
            let span = (t.end_date - t.start_date).num_minutes();
            if span < i64::from(t.dt) {
                errors.push(ConfigError::new(
                    "time.end_date",
                    "window is shorter than one timestep",
                ));
            }
        }

        let c = &self.correlation;
        for (field, value) in [
            ("correlation.dx_corr", c.dx_corr),
            ("correlation.dy_corr", c.dy_corr),
        ] {
            if !value.is_finite() || value <= 0.0 {
                errors.push(ConfigError::new(field, "must be finite and > 0"));
            }
        }
        for (field, value) in [("correlation.lx", c.lx), ("correlation.ly", c.ly)] {
            if !value.is_finite() || value < 0.0 {
                errors.push(ConfigError::new(field, "must be finite and >= 0"));
            }
        }
        for (field, value) in [
            ("correlation.solar_corr", c.solar_corr),
            ("correlation.long_wind_corr", c.long_wind_corr),
            ("correlation.medium_wind_corr", c.medium_wind_corr),
            ("correlation.short_wind_corr", c.short_wind_corr),
        ] {
            if value == 0 {
                errors.push(ConfigError::new(field, "must be > 0"));
            }
        }
        if let Some(scale) = c.scale_solar_coord_for_correlation {
            if !scale.is_finite() || scale <= 0.0 {
                errors.push(ConfigError::new(
                    "correlation.scale_solar_coord_for_correlation",
                    "must be finite and > 0",
                ));
            }
        }

        let p = &self.production;
        for (field, value) in [
            ("production.smoothdist", p.smoothdist),
            ("production.planned_std", p.planned_std),
            ("production.solar_base_factor", p.solar_base_factor),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(ConfigError::new(field, "must be finite and >= 0"));
            }
        }
        if !(0.0..=1.0).contains(&p.wind_capacity_factor) {
            errors.push(ConfigError::new(
                "production.wind_capacity_factor",
                "must be in [0.0, 1.0]",
            ));
        }
        if !(0.0..1.0).contains(&p.wind_seasonal_amplitude) {
            errors.push(ConfigError::new(
                "production.wind_seasonal_amplitude",
                "must be in [0.0, 1.0)",
            ));
        }

        let o = &self.output;
        if !o.delimiter.is_ascii() || matches!(o.delimiter, '"' | '\n' | '\r') {
            errors.push(ConfigError::new(
                "output.delimiter",
                "must be a single ASCII character other than a quote or newline",
            ));
        }
        if o.float_precision > 12 {
            errors.push(ConfigError::new("output.float_precision", "must be <= 12"));
        }

        if self.batch.scenarios == 0 {
            errors.push(ConfigError::new("batch.scenarios", "must be > 0"));
        }
        if let Err(e) = self.batch_start_dates() {
            errors.push(e);
        }

        errors
    }
}

/// Lenient `YYYY-MM-DD[ HH:MM[:SS]]` timestamps.
pub(crate) mod datetime_format {
    use chrono::{NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer, de::Error};

    const FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        FORMATS
            .iter()
            .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| {
            D::Error::custom(format!(
                "invalid date \"{raw}\", expected YYYY-MM-DD[ HH:MM[:SS]]"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[time]
start_date = "2012-01-01"
end_date = "2012-01-08"
dt = 5

[correlation]
dx_corr = 10.0
dy_corr = 10.0
solar_corr = 60

[production]
smoothdist = 0.1
planned_std = 0.0
"#;

    #[test]
    fn baseline_preset_valid() {
        let cfg = GenerationParameters::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = GenerationParameters::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let cfg = GenerationParameters::from_toml_str(MINIMAL);
        assert!(cfg.is_ok(), "minimal TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.seed), Some(42));
        assert_eq!(cfg.as_ref().map(|c| c.time.dt), Some(5));
        assert_eq!(
            cfg.as_ref().map(|c| c.correlation.short_wind_corr),
            Some(60)
        );
        assert_eq!(cfg.as_ref().map(|c| c.output.delimiter), Some(';'));
        assert_eq!(
            cfg.as_ref()
                .and_then(|c| c.correlation.scale_solar_coord_for_correlation),
            None
        );
    }

    #[test]
    fn full_toml_parses() {
        let toml = r#"
seed = 7

[time]
start_date = "2012-03-01 06:00"
end_date = "2012-03-02 06:00"
dt = 60
end_inclusive = true

[correlation]
dx_corr = 250.0
dy_corr = 250.0
lx = 1000.0
ly = 500.0
solar_corr = 120
long_wind_corr = 10080
medium_wind_corr = 1440
short_wind_corr = 30
scale_solar_coord_for_correlation = 2.0

[production]
smoothdist = 0.2
planned_std = 0.5
wind_capacity_factor = 0.35

[pattern]
wrap = "single_year"
trailing_sample = "keep"

[output]
delimiter = ","
float_precision = 3

[batch]
scenarios = 3
start_dates = ["2012-01-01", "2012-02-01"]
threads = 2
"#;
        let cfg = GenerationParameters::from_toml_str(toml);
        assert!(cfg.is_ok(), "full TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        let cfg = cfg.as_ref();
        assert_eq!(cfg.map(|c| c.seed), Some(7));
        assert_eq!(cfg.map(|c| c.pattern.wrap), Some(PatternWrap::SingleYear));
        assert_eq!(
            cfg.map(|c| c.pattern.trailing_sample),
            Some(TrailingSample::Keep)
        );
        assert_eq!(
            cfg.and_then(|c| c.correlation.scale_solar_coord_for_correlation),
            Some(2.0)
        );
        assert_eq!(
            cfg.map(|c| c.batch_start_dates().map(|d| d.len())),
            Some(Ok(2))
        );
        assert_eq!(cfg.map(|c| c.validate().is_empty()), Some(true));
    }

    #[test]
    fn missing_required_key_is_rejected() {
        let toml = MINIMAL.replace("dt = 5\n", "");
        let err = GenerationParameters::from_toml_str(&toml);
        assert!(err.is_err());
        assert!(err.unwrap_err().message.contains("dt"));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = format!("{MINIMAL}bogus_field = true\n");
        let result = GenerationParameters::from_toml_str(&toml);
        assert!(result.is_err());
    }

    #[test]
    fn invalid_date_is_rejected() {
        let toml = MINIMAL.replace("2012-01-08", "2012-13-45");
        assert!(GenerationParameters::from_toml_str(&toml).is_err());
    }

    #[test]
    fn validation_catches_zero_dt() {
        let mut cfg = GenerationParameters::baseline();
        cfg.time.dt = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "time.dt"));
    }

    #[test]
    fn validation_catches_non_positive_correlation_length() {
        let mut cfg = GenerationParameters::baseline();
        cfg.correlation.dx_corr = 0.0;
        cfg.correlation.dy_corr = -5.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "correlation.dx_corr"));
        assert!(errors.iter().any(|e| e.field == "correlation.dy_corr"));
    }

    #[test]
    fn validation_catches_reversed_window() {
        let mut cfg = GenerationParameters::baseline();
        cfg.time.end_date = cfg.time.start_date;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "time.end_date"));
    }

    #[test]
    fn validation_catches_negative_planned_std() {
        let mut cfg = GenerationParameters::baseline();
        cfg.production.planned_std = -0.1;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "production.planned_std"));
    }

    #[test]
    fn validation_catches_bad_rescale_factor() {
        let mut cfg = GenerationParameters::baseline();
        cfg.correlation.scale_solar_coord_for_correlation = Some(0.0);
        let errors = cfg.validate();
        assert!(
            errors
                .iter()
                .any(|e| e.field == "correlation.scale_solar_coord_for_correlation")
        );
    }

    #[test]
    fn validation_catches_bad_batch_date() {
        let mut cfg = GenerationParameters::baseline();
        cfg.batch.start_dates = vec!["2012-01-01".into(), "yesterday".into()];
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "batch.start_dates[1]"));
    }

    #[test]
    fn validation_rejects_two_batch_dates_on_one_day() {
        let mut cfg = GenerationParameters::baseline();
        cfg.batch.start_dates = vec!["2012-01-01 00:00".into(), "2012-01-01 12:00".into()];
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "batch.start_dates[1]"));

        cfg.batch.start_dates = vec!["2012-03-01".into(), "2012-02-01".into(), "2012-03-01".into()];
        let err = cfg.batch_start_dates().unwrap_err();
        assert_eq!(err.field, "batch.start_dates[2]");
        assert!(err.message.contains("[0]"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in GenerationParameters::PRESETS {
            let cfg = GenerationParameters::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }
}
