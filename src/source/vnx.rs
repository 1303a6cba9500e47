//! VNX storage pools, as reported by `naviseccli storagepool -list`.
//!
//! The report is a sequence of `Key: Value` lines. A `Pool Name` line opens
//! a new pool record.

use metric::{FieldValue, Sample};
use source::{Error, Fetch};
use util::{convert_to_alnum, parse_scalar};

/// Which properties of a pool become tags and fields.
#[derive(Clone, Debug, PartialEq)]
pub struct VnxConfig {
    /// Measurement prefix, the endpoint and pool name are appended.
    pub measurement: String,
    /// Normalized property names used as tags.
    pub tags: Vec<String>,
    /// Normalized property names used as fields.
    pub fields: Vec<String>,
}

impl Default for VnxConfig {
    fn default() -> VnxConfig {
        VnxConfig {
            measurement: "vnxprop".to_string(),
            tags: vec!["Pool_Name".to_string(), "Pool_ID".to_string()],
            fields: vec![
                "LUN_Count".to_string(),
                "User_Capacity__GBs_".to_string(),
                "Consumed_Capacity__GBs_".to_string(),
                "Total_Subscribed_Capacity__GBs_".to_string(),
            ],
        }
    }
}

/// One parsed pool, properties in report order.
pub type Record = Vec<(String, FieldValue)>;

/// Split a report into pool records.
pub fn parse(report: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut current: Record = Vec::new();
    for line in report.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = match line.find(':') {
            Some(idx) => (&line[..idx], &line[idx + 1..]),
            None => {
                trace!("skipping line without separator: {}", line);
                continue;
            }
        };
        let key = convert_to_alnum(key.trim());
        let value = value.trim();

        if key == "Pool_Name" && !current.is_empty() {
            records.push(current);
            current = Vec::new();
        }

        if key == "LUNs" {
            let count = value.split(',').filter(|l| !l.trim().is_empty()).count();
            set(&mut current, "LUN_Count", FieldValue::Integer(count as i64));
            set(&mut current, &key, FieldValue::Text(value.to_string()));
        } else {
            set(&mut current, &key, parse_scalar(value));
        }
    }
    if !current.is_empty() {
        records.push(current);
    }
    records
}

fn set(record: &mut Record, key: &str, value: FieldValue) {
    match record.iter_mut().find(|entry| entry.0 == key) {
        Some(entry) => entry.1 = value,
        None => record.push((key.to_string(), value)),
    }
}

fn lookup<'a>(record: &'a Record, key: &str) -> Option<&'a FieldValue> {
    record.iter().find(|entry| entry.0 == key).map(|entry| &entry.1)
}

/// Collects storage pool capacities from VNX storage processors.
pub struct Vnx {
    config: VnxConfig,
    fetch: Box<dyn Fetch>,
}

impl Vnx {
    /// Create a collector that obtains reports through `fetch`.
    pub fn new(config: VnxConfig, fetch: Box<dyn Fetch>) -> Vnx {
        Vnx {
            config: config,
            fetch: fetch,
        }
    }

    /// Turn the report of `endpoint` into one sample per pool.
    ///
    /// Pools lacking a configured tag or field are logged and dropped.
    pub fn samples(&self, endpoint: &str, report: &str) -> Vec<Sample> {
        let measurement = format!("{}.{}", self.config.measurement, convert_to_alnum(endpoint));
        let mut samples = Vec::new();
        for record in parse(report) {
            match self.sample(&measurement, endpoint, &record) {
                Ok(sample) => samples.push(sample),
                Err(e) => warn!("{}", e),
            }
        }
        samples
    }

    fn sample(&self, measurement: &str, endpoint: &str, record: &Record) -> Result<Sample, Error> {
        let pool = match lookup(record, "Pool_Name") {
            Some(name) => name.to_string(),
            None => "unnamed pool".to_string(),
        };
        let missing = |field: &str| Error::MissingField {
            record: format!("{} on {}", pool, endpoint),
            field: field.to_string(),
        };
        let mut sample = Sample::new(format!("{}.{}", measurement, convert_to_alnum(&pool)));
        for tag in &self.config.tags {
            let value = lookup(record, tag).ok_or_else(|| missing(tag))?;
            sample.tags.insert(tag.clone(), value.to_string());
        }
        for field in &self.config.fields {
            let value = lookup(record, field).ok_or_else(|| missing(field))?;
            sample.fields.insert(field.clone(), value.clone());
        }
        sample.tags.insert("vnx".to_string(), endpoint.to_string());
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

    const REPORT: &str = "Pool Name:  Pool 0
Pool ID:  0
LUNs:  12, 13, 14
User Capacity (Blocks):  9297365504
User Capacity (GBs):  4433.328
Consumed Capacity (Blocks):  6917537792
Consumed Capacity (GBs):  3298.538
Percent Full:  74.403
Total Subscribed Capacity (GBs):  3600.000

Pool Name:  Flash Pool
Pool ID:  1
LUNs:  20
User Capacity (GBs):  1000.000
Consumed Capacity (GBs):  250.500
Total Subscribed Capacity (GBs):  400.000
Raid Type:  r_5
";

    fn vnx() -> Vnx {
        let fetch = |_: &str| -> Result<String, Error> { Ok(REPORT.to_string()) };
        Vnx::new(VnxConfig::default(), Box::new(fetch))
    }

    #[test]
    fn parse_records() {
        let records = parse(REPORT);
        assert_eq!(2, records.len());
        assert_eq!(Some(&FieldValue::from("Pool_0")), lookup(&records[0], "Pool_Name"));
        assert_eq!(Some(&FieldValue::Integer(3)), lookup(&records[0], "LUN_Count"));
        assert_eq!(
            Some(&FieldValue::Integer(9_297_365_504)),
            lookup(&records[0], "User_Capacity__Blocks_")
        );
        assert_eq!(
            Some(&FieldValue::Float(4433.328)),
            lookup(&records[0], "User_Capacity__GBs_")
        );
        assert_eq!(Some(&FieldValue::Integer(1)), lookup(&records[1], "LUN_Count"));
        assert_eq!(Some(&FieldValue::from("r_5")), lookup(&records[1], "Raid_Type"));
    }

    #[test]
    fn pools_become_samples() {
        let samples = vnx().collect("spa.example.com").unwrap();
        assert_eq!(2, samples.len());
        let pool = &samples[0];
        assert_eq!("vnxprop.spa_example_com.Pool_0", pool.measurement);
        assert_eq!(Some(&"Pool_0".to_string()), pool.tags.get("Pool_Name"));
        assert_eq!(Some(&"0".to_string()), pool.tags.get("Pool_ID"));
        assert_eq!(Some(&"spa.example.com".to_string()), pool.tags.get("vnx"));
        assert_eq!(Some(3298.538), pool.numeric("Consumed_Capacity__GBs_"));
        assert_eq!(4, pool.fields.len());
        assert_eq!(None, pool.timestamp);
        assert_eq!("vnxprop.spa_example_com.Flash_Pool", samples[1].measurement);
    }

    #[test]
    fn incomplete_pool_is_dropped() {
        let mut config = VnxConfig::default();
        config.fields.push("Raid_Type".to_string());
        let fetch = |_: &str| -> Result<String, Error> { Ok(REPORT.to_string()) };
        let samples = Vnx::new(config, Box::new(fetch)).collect("spa").unwrap();
        assert_eq!(1, samples.len());
        assert_eq!("vnxprop.spa.Flash_Pool", samples[0].measurement);
    }

    #[test]
    fn empty_luns() {
        let records = parse("Pool Name: p\nLUNs:\n");
        assert_eq!(Some(&FieldValue::Integer(0)), lookup(&records[0], "LUN_Count"));
    }

    #[test]
    fn unavailable_endpoint() {
        let fetch = |e: &str| -> Result<String, Error> {
            Err(Error::EndpointUnavailable {
                endpoint: e.to_string(),
                reason: "timeout".to_string(),
            })
        };
        let vnx = Vnx::new(VnxConfig::default(), Box::new(fetch));
        assert!(vnx.collect("spb").is_err());
    }
}
