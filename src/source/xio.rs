//! XtremIO clusters, as reported by `show-clusters` on an XMS.
//!
//! The report is a whitespace-delimited table. The header row starts with
//! `Cluster-Name`; every later non-blank row is one cluster.

use metric::{FieldValue, Sample};
use source::{Error, Fetch};
use util::{convert_to_alnum, human2bytes};

/// Which columns of a cluster row become tags and fields.
#[derive(Clone, Debug, PartialEq)]
pub struct XioConfig {
    /// Measurement prefix, the endpoint and cluster name are appended.
    pub measurement: String,
    /// Column names used as tags.
    pub tags: Vec<String>,
    /// Column names used as fields.
    pub fields: Vec<String>,
}

impl Default for XioConfig {
    fn default() -> XioConfig {
        XioConfig {
            measurement: "xioprop".to_string(),
            tags: vec!["Cluster-Name".to_string()],
            fields: vec![
                "Num-of-Vols".to_string(),
                "Vol-Size".to_string(),
                "UD-SSD-Space".to_string(),
                "Logical-Space-In-Use".to_string(),
                "UD-SSD-Space-In-Use".to_string(),
            ],
        }
    }
}

/// One table row, as `(column, raw cell)` pairs.
pub type Row = Vec<(String, String)>;

/// Split a report into rows keyed by the header columns.
///
/// The echoed command and anything above the header are ignored. Cells
/// beyond the header width are dropped.
pub fn parse(report: &str) -> Vec<Row> {
    let mut header: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for line in report.lines() {
        if line.trim().is_empty() || line.contains("show-clusters") {
            continue;
        }
        if line.starts_with("Cluster-Name") {
            header = Some(line.split_whitespace().map(|s| s.to_string()).collect());
            continue;
        }
        if let Some(ref columns) = header {
            let row: Row = columns
                .iter()
                .cloned()
                .zip(line.split_whitespace().map(|s| s.to_string()))
                .collect();
            rows.push(row);
        }
    }
    rows
}

/// Interpret a cell: digits are integers, sizes are bytes, anything else
/// stays text.
pub fn cell_value(raw: &str) -> FieldValue {
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(i) = raw.parse::<i64>() {
            return FieldValue::Integer(i);
        }
    }
    match human2bytes(raw) {
        Some(bytes) => FieldValue::Integer(bytes),
        None => FieldValue::Text(raw.to_string()),
    }
}

fn lookup<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
    row.iter()
        .find(|cell| cell.0 == column)
        .map(|cell| cell.1.as_str())
}

/// Collects cluster capacities from XtremIO management servers.
pub struct Xio {
    config: XioConfig,
    fetch: Box<dyn Fetch>,
}

impl Xio {
    /// Create a collector that obtains reports through `fetch`.
    pub fn new(config: XioConfig, fetch: Box<dyn Fetch>) -> Xio {
        Xio {
            config: config,
            fetch: fetch,
        }
    }

    /// Turn the report of `endpoint` into one sample per cluster.
    ///
    /// Clusters lacking a configured tag or field are logged and dropped.
    pub fn samples(&self, endpoint: &str, report: &str) -> Vec<Sample> {
        let measurement = format!("{}.{}", self.config.measurement, convert_to_alnum(endpoint));
        let mut samples = Vec::new();
        for row in parse(report) {
            match self.sample(&measurement, endpoint, &row) {
                Ok(sample) => samples.push(sample),
                Err(e) => warn!("{}", e),
            }
        }
        samples
    }

    fn sample(&self, measurement: &str, endpoint: &str, row: &Row) -> Result<Sample, Error> {
        let cluster = lookup(row, "Cluster-Name").unwrap_or("unnamed cluster");
        let missing = |field: &str| Error::MissingField {
            record: format!("{} on {}", cluster, endpoint),
            field: field.to_string(),
        };
        let mut sample = Sample::new(format!("{}.{}", measurement, convert_to_alnum(cluster)));
        for tag in &self.config.tags {
            let value = lookup(row, tag).ok_or_else(|| missing(tag))?;
            sample.tags.insert(tag.clone(), value.to_string());
        }
        for field in &self.config.fields {
            let value = lookup(row, field).ok_or_else(|| missing(field))?;
            sample.fields.insert(field.clone(), cell_value(value));
        }
        sample.tags.insert("xms".to_string(), endpoint.to_string());
        Ok(sample)
    }

    /// Fetch and parse the report of one endpoint.
    pub fn collect(&self, endpoint: &str) -> Result<Vec<Sample>, Error> {
        let report = self.fetch.fetch(endpoint)?;
        Ok(self.samples(endpoint, &report))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const REPORT: &str = "xmcli (admin)> show-clusters
Cluster-Name Index State  Conn-State Num-of-Vols Vol-Size UD-SSD-Space Logical-Space-In-Use UD-SSD-Space-In-Use Total-Writes Total-Reads
xio01        1     active connected  112         60.3T    22.9T        20.1T                7.5T                1.2P         900.1T
xio02        2     active connected  8           4T       7.5T         1G                   512M                10G          20G

";

    fn xio(config: XioConfig) -> Xio {
        let fetch = |_: &str| -> Result<String, Error> { Ok(REPORT.to_string()) };
        Xio::new(config, Box::new(fetch))
    }

    #[test]
    fn parse_table() {
        let rows = parse(REPORT);
        assert_eq!(2, rows.len());
        assert_eq!(Some("xio01"), lookup(&rows[0], "Cluster-Name"));
        assert_eq!(Some("60.3T"), lookup(&rows[0], "Vol-Size"));
        assert_eq!(Some("20G"), lookup(&rows[1], "Total-Reads"));
    }

    #[test]
    fn rows_before_header_are_ignored() {
        assert!(parse("garbage line\nmore garbage\n").is_empty());
    }

    #[test]
    fn cell_values() {
        assert_eq!(FieldValue::Integer(112), cell_value("112"));
        assert_eq!(FieldValue::Integer(4_398_046_511_104), cell_value("4T"));
        assert_eq!(FieldValue::Integer(536_870_912), cell_value("512M"));
        assert_eq!(FieldValue::from("active"), cell_value("active"));
        assert_eq!(FieldValue::from("0.5"), cell_value("0.5"));
    }

    #[test]
    fn clusters_become_samples() {
        let samples = xio(XioConfig::default()).collect("xms.example.com").unwrap();
        assert_eq!(2, samples.len());
        let c = &samples[1];
        assert_eq!("xioprop.xms_example_com.xio02", c.measurement);
        assert_eq!(Some(&"xio02".to_string()), c.tags.get("Cluster-Name"));
        assert_eq!(Some(&"xms.example.com".to_string()), c.tags.get("xms"));
        assert_eq!(Some(&FieldValue::Integer(8)), c.fields.get("Num-of-Vols"));
        assert_eq!(
            Some(&FieldValue::Integer(536_870_912)),
            c.fields.get("UD-SSD-Space-In-Use")
        );
        assert_eq!(5, c.fields.len());
    }

    #[test]
    fn missing_column_drops_cluster() {
        let mut config = XioConfig::default();
        config.fields.push("Stop-Reason".to_string());
        assert!(xio(config).collect("xms").unwrap().is_empty());
    }
}
