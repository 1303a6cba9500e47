//! Capacity forecasting.
//!
//! `regression::fit` turns a usage history into a line, `Evaluator` turns
//! that line plus the latest usage and capacity into a `ForecastResult`: how
//! full the resource is now and when it will cross each configured
//! utilization threshold.

pub mod regression;

pub use self::regression::{fit, Regression};

use chrono::{DateTime, Utc};
use constants::{BYTES_PER_TB, SECS_PER_DAY};
use std::fmt;
use thiserror::Error;
use time;

/// Forecast errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A capacity of zero makes utilization meaningless.
    #[error("capacity undefined: capacity is zero")]
    CapacityUndefined,
}

/// When a threshold will be crossed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Crossing {
    /// Usage is flat or shrinking, the threshold is never reached.
    Never,
    /// The projected instant of the crossing. May be in the past.
    At(DateTime<Utc>),
    /// The projection lies beyond what a calendar can represent.
    Beyond,
    /// The projection lies before what a calendar can represent.
    Past,
}

impl Crossing {
    /// Whole days from `now` until the crossing, rounded towards the past.
    /// `None` unless the crossing has a representable instant.
    pub fn days_from(&self, now: i64) -> Option<i64> {
        match *self {
            Crossing::At(dt) => Some((dt.timestamp() - now).div_euclid(SECS_PER_DAY)),
            Crossing::Never | Crossing::Beyond | Crossing::Past => None,
        }
    }

    /// Render the crossing date for a report.
    pub fn date(&self) -> String {
        match *self {
            Crossing::Never => "never".to_string(),
            Crossing::At(dt) => dt.format("%Y-%m-%d").to_string(),
            Crossing::Beyond => "> 1 year".to_string(),
            Crossing::Past => "long past".to_string(),
        }
    }

    /// Render the time remaining until the crossing for a report.
    pub fn remaining(&self, now: i64) -> String {
        match self.days_from(now) {
            Some(days) => format!("{} days", days),
            None => match *self {
                Crossing::Never => "never".to_string(),
                Crossing::Past => "long past".to_string(),
                _ => "> 1 year".to_string(),
            },
        }
    }
}

/// Projection for one threshold fraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Fraction of capacity, 1.0 being full.
    pub threshold: f64,
    /// When usage reaches `threshold * capacity`.
    pub crossing: Crossing,
}

/// The forecast for one series.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    /// Series key.
    pub series: String,
    /// Latest usage in bytes.
    pub latest_used: f64,
    /// Latest capacity in bytes.
    pub latest_capacity: f64,
    /// Latest free space in bytes.
    pub latest_remaining: f64,
    /// Latest usage as a percentage of capacity.
    pub percent_used: f64,
    /// The fitted trend.
    pub regression: Regression,
    /// One projection per configured threshold, in configuration order.
    pub projections: Vec<Projection>,
}

impl fmt::Display for ForecastResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: used {:.2} TB of {:.2} TB ({:.2}%), y = {:.3} * x + {:.3}",
            self.series,
            self.latest_used / BYTES_PER_TB,
            self.latest_capacity / BYTES_PER_TB,
            self.percent_used,
            self.regression.slope,
            self.regression.intercept
        )
    }
}

/// Turns fitted trends into forecasts.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluator {
    thresholds: Vec<f64>,
    now: i64,
}

impl Default for Evaluator {
    fn default() -> Evaluator {
        Evaluator::new(vec![1.0, 0.9])
    }
}

impl Evaluator {
    /// Create an evaluator for the given threshold fractions, as of now.
    pub fn new(thresholds: Vec<f64>) -> Evaluator {
        Evaluator {
            thresholds: thresholds,
            now: time::now(),
        }
    }

    /// Pin the wall-clock used to compute time remaining.
    pub fn now(mut self, now: i64) -> Evaluator {
        self.now = now;
        self
    }

    /// The wall-clock, seconds since the Unix epoch.
    pub fn current_time(&self) -> i64 {
        self.now
    }

    /// The configured threshold fractions.
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// `used / capacity * 100`.
    pub fn percent_used(used: f64, capacity: f64) -> Result<f64, Error> {
        if capacity == 0.0 {
            return Err(Error::CapacityUndefined);
        }
        Ok(used / capacity * 100.0)
    }

    /// When `regression` reaches `threshold * capacity`.
    pub fn crossing(regression: &Regression, capacity: f64, threshold: f64) -> Crossing {
        if !(regression.slope > 0.0) {
            return Crossing::Never;
        }
        let x = regression.solve(threshold * capacity).round();
        if x.is_nan() {
            return Crossing::Beyond;
        }
        if x <= i64::min_value() as f64 {
            return Crossing::Past;
        }
        if x >= i64::max_value() as f64 {
            return Crossing::Beyond;
        }
        match time::from_timestamp(x as i64) {
            Some(dt) => Crossing::At(dt),
            None if x < 0.0 => Crossing::Past,
            None => Crossing::Beyond,
        }
    }

    /// Forecast one series from its fitted trend and latest readings.
    pub fn evaluate<S>(
        &self,
        series: S,
        regression: Regression,
        used: f64,
        capacity: f64,
    ) -> Result<ForecastResult, Error>
    where
        S: Into<String>,
    {
        let percent_used = Evaluator::percent_used(used, capacity)?;
        let projections = self.thresholds
            .iter()
            .map(|&threshold| Projection {
                threshold: threshold,
                crossing: Evaluator::crossing(&regression, capacity, threshold),
            })
            .collect();
        Ok(ForecastResult {
            series: series.into(),
            latest_used: used,
            latest_capacity: capacity,
            latest_remaining: capacity - used,
            percent_used: percent_used,
            regression: regression,
            projections: projections,
        })
    }
}
