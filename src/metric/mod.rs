//! The data model shared by every stage of capstan.

mod tagmap;
mod value;

pub use self::tagmap::cmp;
pub use self::value::FieldValue;

use std::cmp::Ordering;
use std::fmt;

/// Identity tags of a `Sample`.
pub type TagMap = self::tagmap::TagMap<String, String>;

/// Measured fields of a `Sample`.
pub type FieldMap = self::tagmap::TagMap<String, FieldValue>;

/// One entity's property snapshot at one point in time.
///
/// Tags identify the series a sample belongs to and are never aggregated.
/// Fields carry the measured data. The timestamp is in seconds since the Unix
/// epoch and is absent only for samples that have not been persisted yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Logical metric stream, eg. `vmprop.vcenter01`.
    pub measurement: String,
    /// Identity and dimension tags.
    pub tags: TagMap,
    /// Measured values.
    pub fields: FieldMap,
    /// Seconds since the Unix epoch.
    pub timestamp: Option<i64>,
}

impl Sample {
    /// Create a new, empty `Sample` for the given measurement.
    pub fn new<S>(measurement: S) -> Sample
    where
        S: Into<String>,
    {
        Sample {
            measurement: measurement.into(),
            tags: TagMap::default(),
            fields: FieldMap::default(),
            timestamp: None,
        }
    }

    /// Set the timestamp of the Sample
    pub fn time(mut self, time: i64) -> Sample {
        self.timestamp = Some(time);
        self
    }

    /// Insert a tag, replacing any previous value under the same key.
    pub fn overlay_tag<S>(mut self, key: S, val: S) -> Sample
    where
        S: Into<String>,
    {
        self.tags.insert(key.into(), val.into());
        self
    }

    /// Insert every tag from `map`, replacing previous values.
    pub fn overlay_tags_from_map(mut self, map: &TagMap) -> Sample {
        for &(ref k, ref v) in map.iter() {
            self.tags.insert(k.clone(), v.clone());
        }
        self
    }

    /// Insert a field, replacing any previous value under the same key.
    pub fn field<S, V>(mut self, key: S, val: V) -> Sample
    where
        S: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), val.into());
        self
    }

    /// Look up a numeric field as a float.
    pub fn numeric(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(|v| v.as_f64())
    }

    /// The identity of the series this sample belongs to: the measurement
    /// followed by its tags, in key order.
    pub fn series_key(&self) -> String {
        let mut key = String::with_capacity(self.measurement.len() + 32);
        key.push_str(&self.measurement);
        for &(ref k, ref v) in self.tags.iter() {
            key.push(',');
            key.push_str(k);
            key.push('=');
            key.push_str(v);
        }
        key
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Measurement: {}", self.measurement)?;
        write!(f, "Tags: {{")?;
        for (i, &(ref k, ref v)) in self.tags.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", k, v)?;
        }
        writeln!(f, "}}")?;
        write!(f, "Fields: {{")?;
        for (i, &(ref k, ref v)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", k, v)?;
        }
        writeln!(f, "}}")?;
        match self.timestamp {
            Some(ts) => write!(f, "Timestamp: {}", ts),
            None => write!(f, "Timestamp: -"),
        }
    }
}

/// Total order over field maps, see `FieldValue::total_cmp`.
pub fn cmp_fields(left: &FieldMap, right: &FieldMap) -> Ordering {
    match left.len().cmp(&right.len()) {
        Ordering::Equal => {}
        other => return other,
    }
    for (&(ref lk, ref lv), &(ref rk, ref rv)) in left.iter().zip(right.iter()) {
        let order = lk.cmp(rk).then_with(|| lv.total_cmp(rv));
        if order != Ordering::Equal {
            return order;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn series_key_is_tag_ordered() {
        let s = Sample::new("vnxprop.spa")
            .overlay_tag("vnx", "spa")
            .overlay_tag("Pool_Name", "Pool_0")
            .field("LUN_Count", 3);
        assert_eq!("vnxprop.spa,Pool_Name=Pool_0,vnx=spa", s.series_key());
    }

    #[test]
    fn numeric_lookup() {
        let s = Sample::new("m").field("used", 10).field("state", "on");
        assert_eq!(Some(10.0), s.numeric("used"));
        assert_eq!(None, s.numeric("state"));
        assert_eq!(None, s.numeric("missing"));
    }

    #[test]
    fn display_lists_everything() {
        let s = Sample::new("m")
            .overlay_tag("name", "vm01")
            .field("cpu", 2)
            .time(42);
        let out = format!("{}", s);
        assert!(out.contains("Measurement: m"));
        assert!(out.contains("Tags: {name: vm01}"));
        assert!(out.contains("Fields: {cpu: 2}"));
        assert!(out.contains("Timestamp: 42"));
    }
}
