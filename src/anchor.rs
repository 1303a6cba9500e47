//! Synthetic zero-usage anchor points.
//!
//! An entity that is first observed already in use, say a virtual machine
//! created between two collection runs, has no zero-usage baseline and its
//! fitted trend starts too steep. For such series we fabricate the missing
//! birth point: a copy of the earliest sample, placed a fixed offset earlier,
//! with every designated field forced to zero.
//!
//! The trigger is deliberately simple. A series whose earliest sample holds a
//! non-zero value in any designated field gets an anchor, a series whose
//! designated fields already read zero does not.

use constants;
use metric::{FieldValue, Sample};
use series::Series;

/// Fabricates anchor points.
#[derive(Clone, Debug, PartialEq)]
pub struct Anchor {
    fields: Vec<String>,
    offset: i64,
}

impl Anchor {
    /// Create an anchor generator for the given must-start-at-zero fields,
    /// using the default ten minute offset.
    pub fn new(fields: Vec<String>) -> Anchor {
        Anchor {
            fields: fields,
            offset: constants::ANCHOR_OFFSET_SECS,
        }
    }

    /// Seconds between the anchor and the earliest observation.
    pub fn offset(mut self, offset: i64) -> Anchor {
        self.offset = offset;
        self
    }

    /// Whether `earliest` needs an anchor in front of it.
    pub fn needed(&self, earliest: &Sample) -> bool {
        self.fields.iter().any(|f| match earliest.fields.get(f.as_str()) {
            Some(v) => v.is_numeric() && !v.is_zero(),
            None => false,
        })
    }

    /// The anchor for `earliest`, if one is needed and can be placed.
    ///
    /// Samples without a timestamp cannot be anchored.
    pub fn synthesize(&self, earliest: &Sample) -> Option<Sample> {
        if !self.needed(earliest) {
            return None;
        }
        let ts = match earliest.timestamp {
            Some(ts) => ts,
            None => {
                debug!(
                    "cannot anchor {} without a timestamp",
                    earliest.series_key()
                );
                return None;
            }
        };
        let mut anchor = earliest.clone();
        anchor.timestamp = Some(ts.saturating_sub(self.offset));
        for field in &self.fields {
            anchor.fields.insert(field.clone(), FieldValue::Integer(0));
        }
        Some(anchor)
    }

    /// Prepend an anchor to `series` when needed. Returns whether one was
    /// added.
    pub fn apply(&self, series: &mut Series) -> bool {
        match self.synthesize(series.earliest()) {
            Some(anchor) => {
                debug!(
                    "anchoring {} at {:?}",
                    series.key(),
                    anchor.timestamp
                );
                series.prepend(anchor);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn vm(ts: i64, committed: i64, cpu: i64) -> Sample {
        Sample::new("vmprop.vc1")
            .overlay_tag("name", "web01")
            .field("summary.storage.committed", committed)
            .field("config.hardware.numCPU", cpu)
            .field("guest.guestState", "running")
            .time(ts)
    }

    fn anchor() -> Anchor {
        Anchor::new(vec![
            "summary.storage.committed".to_string(),
            "config.hardware.numCPU".to_string(),
        ])
    }

    #[test]
    fn nonzero_first_sample_is_anchored() {
        let first = Sample::new("pool").field("used", 500).time(10_000);
        let anchor = Anchor::new(vec!["used".to_string()]);
        let synth = anchor.synthesize(&first).unwrap();
        assert_eq!(Some(10_000 - 600), synth.timestamp);
        assert_eq!(Some(&FieldValue::Integer(0)), synth.fields.get("used"));
        assert_eq!(first.tags, synth.tags);
        assert_eq!(first.measurement, synth.measurement);
    }

    #[test]
    fn zero_first_sample_is_left_alone() {
        let first = Sample::new("pool").field("used", 0).time(10_000);
        let anchor = Anchor::new(vec!["used".to_string()]);
        assert!(anchor.synthesize(&first).is_none());
    }

    #[test]
    fn any_designated_field_triggers() {
        let synth = anchor().synthesize(&vm(5_000, 0, 2)).unwrap();
        assert_eq!(
            Some(&FieldValue::Integer(0)),
            synth.fields.get("config.hardware.numCPU")
        );
        assert_eq!(
            Some(&FieldValue::Integer(0)),
            synth.fields.get("summary.storage.committed")
        );
        assert_eq!(
            Some(&FieldValue::from("running")),
            synth.fields.get("guest.guestState")
        );
    }

    #[test]
    fn custom_offset() {
        let synth = anchor().offset(3_600).synthesize(&vm(5_000, 1, 1)).unwrap();
        assert_eq!(Some(1_400), synth.timestamp);
    }

    #[test]
    fn untimed_sample_is_not_anchored() {
        let first = Sample::new("pool").field("used", 500);
        assert!(Anchor::new(vec!["used".to_string()]).synthesize(&first).is_none());
    }

    #[test]
    fn apply_prepends() {
        let mut series = Series::new("k", vec![vm(5_000, 10, 1), vm(6_000, 20, 1)]).unwrap();
        assert!(anchor().apply(&mut series));
        assert_eq!(3, series.len());
        assert_eq!(Some(4_400), series.earliest().timestamp);
        assert!(!anchor().apply(&mut series));
        assert_eq!(3, series.len());
    }
}
