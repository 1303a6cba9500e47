//! Per-entity histories.
//!
//! A `Builder` takes the flat output of a time-ranged query and groups it
//! into one `Series` per series key, oldest sample first. Gaps are left as
//! they are; nothing is interpolated.

use metric::Sample;
use source::RawSeries;
use std::collections::BTreeMap;
use thiserror::Error;

/// Series construction errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The series has no usable points in the requested range.
    #[error("series {0} has no points")]
    Empty(String),
}

/// An ordered history of samples belonging to one logical entity.
///
/// A series is never empty and its samples are ascending by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    key: String,
    samples: Vec<Sample>,
}

impl Series {
    /// Create a series from samples in any order.
    ///
    /// Samples without a timestamp cannot be placed in a history and are
    /// dropped. Samples sharing a timestamp keep their relative order.
    pub fn new<S>(key: S, samples: Vec<Sample>) -> Result<Series, Error>
    where
        S: Into<String>,
    {
        let key = key.into();
        let mut samples: Vec<Sample> = samples
            .into_iter()
            .filter(|s| s.timestamp.is_some())
            .collect();
        if samples.is_empty() {
            return Err(Error::Empty(key));
        }
        samples.sort_by_key(|s| s.timestamp);
        Ok(Series {
            key: key,
            samples: samples,
        })
    }

    /// The series key shared by every sample.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// All samples, oldest first.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Number of samples in the series.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false, a series holds at least one sample.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The oldest sample.
    pub fn earliest(&self) -> &Sample {
        &self.samples[0]
    }

    /// The most recent sample.
    pub fn latest(&self) -> &Sample {
        &self.samples[self.samples.len() - 1]
    }

    /// Insert `sample` in front of the current earliest sample.
    ///
    /// The caller guarantees `sample` is not newer than the earliest sample.
    pub fn prepend(&mut self, sample: Sample) {
        debug_assert!(sample.timestamp <= self.earliest().timestamp);
        self.samples.insert(0, sample);
    }

    /// Parallel `(time, value)` arrays for `field`, each value multiplied by
    /// `factor`. Samples where `field` is not numeric are skipped.
    pub fn points(&self, field: &str, factor: f64) -> (Vec<f64>, Vec<f64>) {
        let mut xs = Vec::with_capacity(self.samples.len());
        let mut ys = Vec::with_capacity(self.samples.len());
        for sample in &self.samples {
            if let (Some(ts), Some(v)) = (sample.timestamp, sample.numeric(field)) {
                xs.push(ts as f64);
                ys.push(v * factor);
            }
        }
        (xs, ys)
    }
}

/// Groups query output into series.
#[derive(Debug, Default)]
pub struct Builder {
    required: Vec<String>,
    groups: BTreeMap<String, Vec<Sample>>,
}

impl Builder {
    /// Create a builder that accepts every timestamped point.
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Drop points that lack a numeric value for `field`.
    pub fn require<S>(mut self, field: S) -> Builder
    where
        S: Into<String>,
    {
        self.required.push(field.into());
        self
    }

    /// Add one point. The point's series is known to the builder afterwards
    /// even if the point itself is filtered out.
    pub fn push(&mut self, sample: Sample) {
        let key = sample.series_key();
        let keep = sample.timestamp.is_some()
            && self.required.iter().all(|f| sample.numeric(f).is_some());
        let group = self.groups.entry(key).or_insert_with(Vec::new);
        if keep {
            group.push(sample);
        } else {
            trace!("filtered point {:?}", sample);
        }
    }

    /// Add every row of a query result.
    pub fn extend_raw(&mut self, raw: &RawSeries) {
        self.groups.entry(raw.series_key()).or_insert_with(Vec::new);
        for sample in raw.samples() {
            self.push(sample);
        }
    }

    /// Take the series for `key` out of the builder.
    pub fn build(&mut self, key: &str) -> Result<Series, Error> {
        match self.groups.remove(key) {
            Some(samples) => Series::new(key, samples),
            None => Err(Error::Empty(key.to_string())),
        }
    }

    /// Build every series seen, in key order.
    pub fn finish(self) -> Vec<Result<Series, Error>> {
        self.groups
            .into_iter()
            .map(|(key, samples)| Series::new(key, samples))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn point(ts: i64, used: i64) -> Sample {
        Sample::new("xioprop.xms1.c1")
            .overlay_tag("xms", "xms1")
            .field("used", used)
            .field("capacity", 100)
            .time(ts)
    }

    #[test]
    fn groups_and_sorts() {
        let mut builder = Builder::new();
        builder.push(point(30, 3));
        builder.push(point(10, 1));
        builder.push(Sample::new("other").field("used", 9).time(5));
        builder.push(point(20, 2));

        let series = builder.finish();
        assert_eq!(2, series.len());
        let other = series[0].as_ref().unwrap();
        assert_eq!("other", other.key());
        let xio = series[1].as_ref().unwrap();
        assert_eq!("xioprop.xms1.c1,xms=xms1", xio.key());
        let stamps: Vec<Option<i64>> = xio.samples().iter().map(|s| s.timestamp).collect();
        assert_eq!(vec![Some(10), Some(20), Some(30)], stamps);
        assert_eq!(Some(10), xio.earliest().timestamp);
        assert_eq!(Some(30), xio.latest().timestamp);
    }

    #[test]
    fn filtered_series_is_empty() {
        let mut builder = Builder::new().require("used");
        builder.push(Sample::new("pool").field("capacity", 10).time(1));
        builder.push(point(10, 1));

        assert_eq!(Err(Error::Empty("pool".to_string())), builder.build("pool"));
        assert!(builder.build("xioprop.xms1.c1,xms=xms1").is_ok());
    }

    #[test]
    fn unknown_key_is_empty() {
        let mut builder = Builder::new();
        assert_eq!(Err(Error::Empty("nope".to_string())), builder.build("nope"));
    }

    #[test]
    fn untimed_points_are_dropped() {
        let series = Series::new("k", vec![Sample::new("k").field("used", 1)]);
        assert_eq!(Err(Error::Empty("k".to_string())), series);
    }

    #[test]
    fn points_scale_values() {
        let series = Series::new("k", vec![point(2, 3), point(1, 1)]).unwrap();
        let (xs, ys) = series.points("used", 1024.0);
        assert_eq!(vec![1.0, 2.0], xs);
        assert_eq!(vec![1024.0, 3072.0], ys);
    }
}
