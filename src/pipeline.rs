//! The batch jobs.
//!
//! Each job is a straight line through the core modules. Failures that
//! concern a single series, record or endpoint are logged and skipped; only
//! the surrounding job decides whether a run as a whole succeeded.

use aggregate::{Aggregator, Leaf};
use anchor::Anchor;
use config::{ForecastConfig, ForecastSource, SynthConfig, VsphereConfig};
use constants::BYTES_PER_TB;
use forecast::{self, regression, Evaluator, ForecastResult};
use metric::Sample;
use series::{self, Builder, Series};
use sink::{self, Sink};
use source::{self, influxdb, Query};
use thiserror::Error;
use util::convert_to_alnum;

/// Why a series produced no forecast.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Skip {
    /// No usable points.
    #[error("{0}")]
    Series(#[from] series::Error),
    /// No trend could be fitted.
    #[error("{0}")]
    Regression(#[from] regression::Error),
    /// The trend could not be evaluated.
    #[error("{0}")]
    Forecast(#[from] forecast::Error),
    /// The latest point lacks a value.
    #[error("latest point has no value for {0}")]
    MissingField(String),
}

impl Skip {
    /// Short name of the failure, for the log.
    pub fn kind(&self) -> &'static str {
        match *self {
            Skip::Series(series::Error::Empty(_)) => "EmptySeries",
            Skip::Regression(regression::Error::InsufficientData(_)) => "InsufficientData",
            Skip::Regression(regression::Error::Degenerate(_)) => "DegenerateRegression",
            Skip::Regression(regression::Error::Mismatch(..)) => "Mismatch",
            Skip::Forecast(forecast::Error::CapacityUndefined) => "CapacityUndefined",
            Skip::MissingField(_) => "MissingField",
        }
    }
}

/// Outcome of a forecast run.
#[derive(Debug, Default)]
pub struct Report {
    /// One result per forecastable series, in source then key order.
    pub results: Vec<ForecastResult>,
    /// Series that produced no forecast.
    pub skipped: Vec<(String, Skip)>,
    /// Sources whose queries failed.
    pub failed_sources: Vec<String>,
}

impl Report {
    fn skip(&mut self, key: String, skip: Skip) {
        warn!("skipping {} ({}): {}", key, skip.kind(), skip);
        self.skipped.push((key, skip));
    }
}

/// Forecast one series.
///
/// The series carries the `used` and `capacity` columns of
/// `influxdb::usage_history`, scaled by the source's bytes factor.
pub fn forecast_series(
    mut series: Series,
    source: &ForecastSource,
    evaluator: &Evaluator,
) -> Result<ForecastResult, Skip> {
    if source.anchor {
        Anchor::new(vec!["used".to_string()])
            .offset(source.anchor_offset)
            .apply(&mut series);
    }
    let (xs, ys) = series.points("used", source.bytes_factor);
    debug!("{} raw points: x={:?} y={:?}", series.key(), xs, ys);
    let reg = regression::fit(&xs, &ys)?;
    debug!(
        "{} regression: y = {:.3} * x + {:.3}",
        series.key(),
        reg.slope,
        reg.intercept
    );

    let latest = series.latest();
    let used = latest
        .numeric("used")
        .ok_or_else(|| Skip::MissingField("used".to_string()))?;
    let capacity = latest
        .numeric("capacity")
        .ok_or_else(|| Skip::MissingField("capacity".to_string()))?;
    let result = evaluator.evaluate(
        series.key(),
        reg,
        used * source.bytes_factor,
        capacity * source.bytes_factor,
    )?;
    debug!("{}", result);
    Ok(result)
}

/// Forecast every series of one source into `report`.
///
/// Only the listing query failing fails the source. A failing history query
/// skips that measurement.
pub fn forecast_source<Q>(
    query: &mut Q,
    source: &ForecastSource,
    config: &ForecastConfig,
    evaluator: &Evaluator,
    report: &mut Report,
) -> Result<(), source::Error>
where
    Q: Query,
{
    let listing = query.query(&influxdb::show_measurements(&source.pattern))?;
    let measurements = influxdb::measurement_names(&listing);
    info!(
        "source {}: {} measurements match {}",
        source.name,
        measurements.len(),
        source.pattern
    );

    for measurement in measurements {
        let history = influxdb::usage_history(
            &measurement,
            &source.used,
            &source.capacity,
            config.range,
            config.interval,
        );
        let raw = match query.query(&history) {
            Ok(raw) => raw,
            Err(e) => {
                error!("unable to query history of {}: {}", measurement, e);
                continue;
            }
        };
        if raw.is_empty() {
            let skip = Skip::from(series::Error::Empty(measurement.clone()));
            report.skip(measurement, skip);
            continue;
        }
        let mut builder = Builder::new().require("used").require("capacity");
        for r in &raw {
            builder.extend_raw(r);
        }
        for built in builder.finish() {
            let found = match built {
                Ok(found) => found,
                Err(e) => {
                    let key = match e {
                        series::Error::Empty(ref key) => key.clone(),
                    };
                    report.skip(key, Skip::from(e));
                    continue;
                }
            };
            let key = found.key().to_string();
            match forecast_series(found, source, evaluator) {
                Ok(result) => report.results.push(result),
                Err(skip) => report.skip(key, skip),
            }
        }
    }
    Ok(())
}

/// Forecast every configured source.
///
/// A source whose listing query fails is logged and the next source
/// proceeds.
pub fn run_forecast<Q>(query: &mut Q, config: &ForecastConfig, evaluator: &Evaluator) -> Report
where
    Q: Query,
{
    let mut report = Report::default();
    for source in &config.sources {
        if let Err(e) = forecast_source(query, source, config, evaluator, &mut report) {
            error!("unable to forecast source {}: {}", source.name, e);
            report.failed_sources.push(source.name.clone());
        }
    }
    info!(
        "forecast {} series, skipped {}",
        report.results.len(),
        report.skipped.len()
    );
    report
}

fn threshold_label(threshold: f64) -> String {
    if (threshold - 1.0).abs() < 1e-9 {
        "Full".to_string()
    } else {
        format!("{}% Full", (threshold * 100.0).round())
    }
}

/// Render results as the comma-separated report table.
pub fn render(results: &[ForecastResult], evaluator: &Evaluator) -> String {
    let mut out = String::with_capacity(256 + results.len() * 128);
    out.push_str("Series, Capacity, Used, Remaining, Percent Used");
    for threshold in evaluator.thresholds() {
        let label = threshold_label(*threshold);
        out.push_str(&format!(", Date {}, Days Until {}", label, label));
    }
    out.push('\n');

    let now = evaluator.current_time();
    for result in results {
        out.push_str(&format!(
            "{}, {:.2} TB, {:.2} TB, {:.2} TB, {:.2}%",
            result.series,
            result.latest_capacity / BYTES_PER_TB,
            result.latest_used / BYTES_PER_TB,
            result.latest_remaining / BYTES_PER_TB,
            result.percent_used
        ));
        for projection in &result.projections {
            out.push_str(&format!(
                ", {}, {}",
                projection.crossing.date(),
                projection.crossing.remaining(now)
            ));
        }
        out.push('\n');
    }
    out
}

/// Anchor points for every young series matching the synth pattern.
///
/// Reads the first point of every series, optionally only within the
/// search interval, and returns the anchors that are needed.
pub fn synthesize<Q>(query: &mut Q, config: &SynthConfig) -> Result<Vec<Sample>, source::Error>
where
    Q: Query,
{
    let q = influxdb::first_points(
        &config.pattern,
        config.search_interval.as_ref().map(|s| s.as_str()),
    );
    let anchor = Anchor::new(config.fields.clone()).offset(config.offset);
    let mut anchors = Vec::new();
    for raw in query.query(&q)? {
        let first = raw.samples()
            .into_iter()
            .filter(|s| s.timestamp.is_some())
            .min_by_key(|s| s.timestamp);
        let first = match first {
            Some(first) => first,
            None => continue,
        };
        if let Some(point) = anchor.synthesize(&first) {
            anchors.push(point);
        }
    }
    info!("synthesized {} anchor points", anchors.len());
    Ok(anchors)
}

/// The stored form of a leaf: `<measurement>.<vcenter>` with the leaf's tags
/// and fields.
pub fn leaf_sample(leaf: &Leaf, measurement: &str) -> Sample {
    let endpoint = leaf.segments.first().map(|s| convert_to_alnum(s));
    let name = match endpoint {
        Some(endpoint) => format!("{}.{}", measurement, endpoint),
        None => measurement.to_string(),
    };
    let mut sample = Sample::new(name).overlay_tags_from_map(&leaf.tags);
    sample.fields = leaf.fields.clone();
    sample.timestamp = leaf.timestamp;
    sample
}

/// Leaf samples followed by roll-up samples for the first `depth` levels.
pub fn rollup(leaves: &[Leaf], config: &VsphereConfig) -> Vec<Sample> {
    let aggregator = Aggregator::new(config.aggregate_prefix.as_str()).levels(config.levels.clone());
    let mut samples: Vec<Sample> = leaves
        .iter()
        .map(|leaf| leaf_sample(leaf, &config.measurement))
        .collect();
    let records = aggregator.aggregate(leaves);
    let before = samples.len();
    samples.extend(
        records
            .into_iter()
            .filter(|r| r.level < config.depth)
            .map(|r| r.sample),
    );
    info!(
        "{} leaves rolled up into {} records",
        before,
        samples.len() - before
    );
    samples
}

/// Write a job's samples to `out`, returning how many were written. A job
/// that collected nothing has failed.
pub fn store<S>(out: &mut S, samples: Vec<Sample>) -> Result<usize, sink::Error>
where
    S: Sink + ?Sized,
{
    if samples.is_empty() {
        return Err(sink::Error::NothingCollected);
    }
    let total = samples.len();
    info!("storing {} samples", total);
    out.deliver_all(samples)?;
    Ok(total)
}
