//! Shared time axis of every output table.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::config::TimeConfig;
use crate::error::{GenerationError, Result};

/// A fixed-resolution sequence of timestamps.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use res_chronics::time_axis::TimeAxis;
///
/// let start = NaiveDate::from_ymd_opt(2012, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let end = NaiveDate::from_ymd_opt(2012, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let axis = TimeAxis::new(start, end, 60, false).unwrap();
/// assert_eq!(axis.len(), 24);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeAxis {
    start: NaiveDateTime,
    dt_minutes: u32,
    len: usize,
}

impl TimeAxis {
    /// Builds the axis from `start` to `end` at `dt_minutes` resolution.
    ///
    /// With `end_inclusive = false` the axis holds every timestamp strictly
    /// before `end`; otherwise a timestamp landing on `end` is kept.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `dt_minutes` is zero or the window is
    /// empty.
    pub fn new(
        start: NaiveDateTime,
        end: NaiveDateTime,
        dt_minutes: u32,
        end_inclusive: bool,
    ) -> Result<Self> {
        if dt_minutes == 0 {
            return Err(GenerationError::config("time.dt", "must be > 0"));
        }
        let span = (end - start).num_minutes();
        if span < 0 {
            return Err(GenerationError::config(
                "time.end_date",
                "must be after time.start_date",
            ));
        }
        let span = span as u64;
        let dt = u64::from(dt_minutes);
        let len = if end_inclusive {
            span / dt + 1
        } else {
            span.div_ceil(dt)
        };
        if len == 0 {
            return Err(GenerationError::config(
                "time.end_date",
                "window is shorter than one timestep",
            ));
        }
        Ok(Self {
            start,
            dt_minutes,
            len: len as usize,
        })
    }

    /// Builds the axis described by the `[time]` section.
    ///
    /// # Errors
    ///
    /// See [`TimeAxis::new`].
    pub fn from_config(cfg: &TimeConfig) -> Result<Self> {
        Self::new(cfg.start_date, cfg.end_date, cfg.dt, cfg.end_inclusive)
    }

    /// Number of timestamps.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false for a constructed axis; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn dt_minutes(&self) -> u32 {
        self.dt_minutes
    }

    /// Minutes elapsed between the first timestamp and timestamp `i`.
    pub fn minutes_at(&self, i: usize) -> u64 {
        i as u64 * u64::from(self.dt_minutes)
    }

    /// Minutes spanned from the first to the last timestamp.
    pub fn span_minutes(&self) -> u64 {
        self.minutes_at(self.len.saturating_sub(1))
    }

    /// Timestamp at index `i`.
    pub fn timestamp(&self, i: usize) -> NaiveDateTime {
        self.start + Duration::minutes(self.minutes_at(i) as i64)
    }

    /// Iterates over every timestamp in order.
    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        (0..self.len).map(|i| self.timestamp(i))
    }

    /// Same start and resolution, `extra` more steps.
    pub fn extended(&self, extra: usize) -> Self {
        Self {
            len: self.len + extra,
            ..self.clone()
        }
    }

    /// Hours elapsed since January 1st 00:00 of the start year, at index `i`.
    pub fn hours_since_year_start(&self, i: usize) -> f64 {
        let ts = self.timestamp(i);
        let year_start = NaiveDate::from_ymd_opt(self.start.year(), 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or(self.start);
        (ts - year_start).num_seconds() as f64 / 3600.0
    }

    /// Fractional day of year (0-based) of timestamp `i`.
    pub fn day_of_year(&self, i: usize) -> f64 {
        let ts = self.timestamp(i);
        f64::from(ts.ordinal0()) + f64::from(ts.num_seconds_from_midnight()) / 86_400.0
    }
}
