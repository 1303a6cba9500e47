//! Hierarchical roll-up of leaf samples.
//!
//! Every leaf carries its containment path as a list of segments such as
//! `[vcenter, datacenter, folder, vm]`. The aggregator produces one
//! `AggregateRecord` for every distinct prefix of every leaf path, numeric
//! fields summed and categorical fields taken from the first contributor.
//! Segments are opaque, a name containing `/` is still a single level.
//!
//! "First contributor" is only meaningful with a fixed order, so leaves are
//! sorted by path, then tags, then fields before they are folded. Any
//! permutation of the same leaves therefore yields exactly the same records.

pub mod tree;

use metric::{self, FieldMap, Sample, TagMap};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use util::convert_to_alnum;

/// A directly observed reading for one concrete entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Leaf {
    /// Non-empty containment segments, the entity's own name last.
    pub segments: Vec<String>,
    /// Identity tags of the entity.
    pub tags: TagMap,
    /// Measured values of the entity.
    pub fields: FieldMap,
    /// When the entity was observed.
    pub timestamp: Option<i64>,
}

impl Leaf {
    /// Create a leaf at the slash-delimited `path` with no tags or fields.
    pub fn new(path: &str) -> Leaf {
        Leaf::from_segments(path.split('/'))
    }

    /// Create a leaf from containment segments with no tags or fields.
    /// Segments are trimmed and empty ones are ignored.
    pub fn from_segments<I, S>(segments: I) -> Leaf
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Leaf {
            segments: segments
                .into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            tags: TagMap::default(),
            fields: FieldMap::default(),
            timestamp: None,
        }
    }

    /// The path as text, `/` inside a segment escaped as `\/`.
    pub fn path(&self) -> String {
        join(&self.segments)
    }
}

fn join(segments: &[String]) -> String {
    let escaped: Vec<String> = segments.iter().map(|s| s.replace('/', "\\/")).collect();
    escaped.join("/")
}

/// A summed / merged sample for one node of the containment hierarchy.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateRecord {
    /// Depth of the node, 0 being the top-level container.
    pub level: usize,
    /// Path of the node, see `Leaf::path`.
    pub path: String,
    /// The accumulated sample.
    pub sample: Sample,
}

impl AggregateRecord {
    fn seed(
        level: usize,
        path: String,
        name: String,
        segments: &[String],
        leaf: &Leaf,
        namer: &Aggregator,
    ) -> AggregateRecord {
        let mut sample = Sample::new(name);
        for (i, segment) in segments.iter().enumerate().take(level + 1) {
            sample.tags.insert(namer.level_name(i), segment.to_string());
        }
        sample.tags.insert("path".to_string(), path.clone());
        sample.fields = leaf.fields.clone();
        sample.timestamp = leaf.timestamp;
        AggregateRecord {
            level: level,
            path: path,
            sample: sample,
        }
    }

    /// Fold a further contribution into this record, see `merge_field`.
    pub fn absorb(&mut self, fields: &FieldMap) {
        for &(ref key, ref value) in fields.iter() {
            merge_field(&mut self.sample.fields, key, value);
        }
    }
}

/// Merge one incoming field into an accumulator.
///
/// A field absent from the accumulator is inserted verbatim. A numeric
/// accumulator adds a numeric incoming value. Anything else keeps the
/// existing value.
pub fn merge_field(acc: &mut FieldMap, key: &str, incoming: &metric::FieldValue) {
    if let Some(existing) = acc.get_mut(key) {
        existing.merge(incoming);
        return;
    }
    acc.insert(key.to_string(), incoming.clone());
}

/// Rolls leaves up through their containment paths.
#[derive(Clone, Debug)]
pub struct Aggregator {
    prefix: String,
    levels: Vec<String>,
}

impl Default for Aggregator {
    fn default() -> Aggregator {
        Aggregator {
            prefix: ::constants::AGGREGATE_PREFIX.to_string(),
            levels: vec![
                "vcenter".to_string(),
                "datacenter".to_string(),
                "topLevelFolder".to_string(),
            ],
        }
    }
}

impl Aggregator {
    /// Create an aggregator whose records are named `<prefix>_<level>.<path>`.
    pub fn new<S>(prefix: S) -> Aggregator
    where
        S: Into<String>,
    {
        let mut agg = Aggregator::default();
        agg.prefix = prefix.into();
        agg
    }

    /// Name the hierarchy levels, top-level first. Levels deeper than the
    /// names given are called `level<N>`.
    pub fn levels(mut self, levels: Vec<String>) -> Aggregator {
        self.levels = levels;
        self
    }

    /// Name of the given level.
    pub fn level_name(&self, level: usize) -> String {
        match self.levels.get(level) {
            Some(name) => name.clone(),
            None => format!("level{}", level),
        }
    }

    /// The synthesized identifier of the record at `path`.
    pub fn identifier(&self, level: usize, segments: &[String]) -> String {
        let mut id = format!("{}_{}", self.prefix, self.level_name(level));
        for segment in segments.iter().take(level + 1) {
            id.push('.');
            id.push_str(&convert_to_alnum(segment));
        }
        id
    }

    /// Roll `leaves` up into one record per distinct path prefix.
    ///
    /// Records are returned top-level first and in path order within a
    /// level. Leaves with an empty path contribute nothing.
    pub fn aggregate(&self, leaves: &[Leaf]) -> Vec<AggregateRecord> {
        let mut ordered: Vec<&Leaf> = leaves.iter().collect();
        ordered.sort_by(|l, r| leaf_cmp(l, r));

        let mut records: BTreeMap<(usize, &[String]), AggregateRecord> = BTreeMap::new();
        for leaf in ordered {
            let segments = &leaf.segments;
            if segments.is_empty() {
                warn!("dropping leaf with empty path, tags: {:?}", leaf.tags);
                continue;
            }
            for level in 0..segments.len() {
                let key = (level, &segments[..level + 1]);
                if let Some(record) = records.get_mut(&key) {
                    record.absorb(&leaf.fields);
                    continue;
                }
                let name = self.identifier(level, segments);
                let path = join(key.1);
                let record = AggregateRecord::seed(level, path, name, segments, leaf, self);
                trace!("new aggregate record {} at level {}", record.path, level);
                records.insert(key, record);
            }
        }
        records.into_iter().map(|(_, v)| v).collect()
    }
}

fn leaf_cmp(left: &Leaf, right: &Leaf) -> Ordering {
    left.segments
        .cmp(&right.segments)
        .then_with(|| metric::cmp(&left.tags, &right.tags))
        .then_with(|| metric::cmp_fields(&left.fields, &right.fields))
        .then_with(|| left.timestamp.cmp(&right.timestamp))
}
