//! Where samples come from.
//!
//! Two kinds of collaborator live here. Acquisition sources (`Vnx`, `Xio`,
//! `Inventory`) read one management endpoint each and turn what it reports
//! into samples or leaves. The query source (`influxdb::InfluxDB`) reads
//! back history that earlier runs persisted. Neither kind does anything
//! clever; they exist to hand clean data to the core.

use chrono::DateTime;
use metric::{FieldValue, Sample, TagMap};
use serde_json;
use std::io;
use thiserror::Error;

mod command;
pub mod influxdb;
mod inventory;
mod vnx;
mod xio;

pub use self::command::{CommandFetch, Fetch};
pub use self::influxdb::InfluxDB;
pub use self::inventory::{Inventory, InventoryConfig};
pub use self::vnx::{Vnx, VnxConfig};
pub use self::xio::{Xio, XioConfig};

/// Source errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A record lacks a configured tag or field.
    #[error("could not process {field} for {record}: missing")]
    MissingField {
        /// Name of the record, for the log.
        record: String,
        /// The missing tag or field.
        field: String,
    },
    /// The endpoint could not be reached or refused to answer.
    #[error("endpoint {endpoint} unavailable: {reason}")]
    EndpointUnavailable {
        /// The endpoint.
        endpoint: String,
        /// Why.
        reason: String,
    },
    /// The connection string is not usable.
    #[error("invalid dsn {0}: {1}")]
    Dsn(String, String),
    /// HTTP transport failure.
    #[error("http error: {0}")]
    Http(#[from] ::reqwest::Error),
    /// The database reported an error for a query.
    #[error("query failed: {0}")]
    Query(String),
    /// A response or document could not be decoded.
    #[error("could not decode: {0}")]
    Decode(#[from] serde_json::Error),
    /// Local I/O failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Something that can run a query against the time-series store.
pub trait Query {
    /// Run `query`, returning one `RawSeries` per matched series.
    fn query(&mut self, query: &str) -> Result<Vec<RawSeries>, Error>;
}

/// One series of a query result: a name, identity tags and a table of rows.
///
/// Rows are in the order the store returned them, ascending by time for
/// every query capstan issues.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawSeries {
    /// Measurement name.
    pub name: String,
    /// Identity tags, present for grouped queries.
    #[serde(default)]
    pub tags: TagMap,
    /// Column names, `time` among them.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Rows of values, one per point.
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

impl RawSeries {
    /// The series key of every sample in this series.
    pub fn series_key(&self) -> String {
        Sample::new(self.name.as_str())
            .overlay_tags_from_map(&self.tags)
            .series_key()
    }

    /// Convert every row into a `Sample`.
    ///
    /// The `time` column becomes the timestamp, accepting either epoch
    /// seconds or an RFC 3339 string. Null cells are left out of the fields.
    pub fn samples(&self) -> Vec<Sample> {
        let mut samples = Vec::with_capacity(self.values.len());
        for row in &self.values {
            let mut sample = Sample::new(self.name.as_str()).overlay_tags_from_map(&self.tags);
            for (column, cell) in self.columns.iter().zip(row.iter()) {
                if column == "time" {
                    sample.timestamp = parse_time(cell);
                } else if let Some(value) = json_to_field(cell) {
                    sample.fields.insert(column.clone(), value);
                }
            }
            samples.push(sample);
        }
        samples
    }
}

fn parse_time(cell: &serde_json::Value) -> Option<i64> {
    match *cell {
        serde_json::Value::Number(ref n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(ref s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.timestamp()),
        _ => None,
    }
}

/// Convert a JSON value into a field value. Null has no field value.
pub fn json_to_field(value: &serde_json::Value) -> Option<FieldValue> {
    match *value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(FieldValue::Boolean(b)),
        serde_json::Value::Number(ref n) => match n.as_i64() {
            Some(i) => Some(FieldValue::Integer(i)),
            None => n.as_f64().map(FieldValue::Float),
        },
        serde_json::Value::String(ref s) => Some(FieldValue::Text(s.clone())),
        ref other => Some(FieldValue::Text(other.to_string())),
    }
}

/// Render a JSON value as a tag value.
pub fn json_to_tag(value: &serde_json::Value) -> Option<String> {
    match *value {
        serde_json::Value::Null => None,
        serde_json::Value::String(ref s) => Some(s.clone()),
        ref other => Some(other.to_string()),
    }
}
