mod integration {
    mod pipeline {

        extern crate capstan;
        extern crate tempdir;

        use self::capstan::collect;
        use self::capstan::config::{ForecastConfig, ForecastSource, VsphereConfig};
        use self::capstan::forecast::{Crossing, Evaluator};
        use self::capstan::pipeline;
        use self::capstan::sink::{Console, Sink};
        use self::capstan::source::influxdb;
        use self::capstan::source::{Error, Inventory, Query, RawSeries};
        use self::tempdir::TempDir;
        use std::collections::HashMap;
        use std::fs::File;
        use std::io::Write;

        const DAY: i64 = 86_400;

        /// Serves canned `/query` response bodies.
        struct Recorded {
            bodies: HashMap<String, String>,
        }

        impl Query for Recorded {
            fn query(&mut self, query: &str) -> Result<Vec<RawSeries>, Error> {
                match self.bodies.get(query) {
                    Some(body) => influxdb::decode(body),
                    None => Ok(Vec::new()),
                }
            }
        }

        fn pool_series(pool: &str, rows: &[(i64, f64)]) -> String {
            let values: Vec<String> = rows
                .iter()
                .map(|&(t, used)| format!("[{}, {}, 2048]", t, used))
                .collect();
            format!(
                r#"{{"name": "vnxprop.spa",
                    "tags": {{"Pool_Name": "{}", "vnx": "spa"}},
                    "columns": ["time", "used", "capacity"],
                    "values": [{}]}}"#,
                pool,
                values.join(", ")
            )
        }

        fn response(series: &[String]) -> String {
            format!(
                r#"{{"results": [{{"statement_id": 0, "series": [{}]}}]}}"#,
                series.join(", ")
            )
        }

        #[test]
        fn forecast_from_stored_history() {
            let mut source = ForecastSource::new(
                "vnx",
                "/^vnxprop\\./",
                "Consumed_Capacity__GBs_",
                "User_Capacity__GBs_",
            );
            source.bytes_factor = 1_073_741_824.0;
            let config = ForecastConfig {
                range: 30,
                interval: 1,
                thresholds: vec![1.0, 0.5],
                sources: vec![source],
            };

            let mut bodies = HashMap::new();
            bodies.insert(
                influxdb::show_measurements("/^vnxprop\\./"),
                r#"{"results": [{"statement_id": 0, "series": [{
                    "name": "measurements",
                    "columns": ["name"],
                    "values": [["vnxprop.spa"]]
                }]}]}"#
                    .to_string(),
            );
            let history = influxdb::usage_history(
                "vnxprop.spa",
                "Consumed_Capacity__GBs_",
                "User_Capacity__GBs_",
                30,
                1,
            );
            // two pools share the measurement, one of them was just created
            bodies.insert(
                history,
                response(&[
                    pool_series("Pool 0", &[(0, 512.0), (DAY, 768.0), (2 * DAY, 1024.0)]),
                    pool_series("Pool 1", &[(2 * DAY, 10.0)]),
                ]),
            );
            let mut query = Recorded { bodies: bodies };

            let evaluator = Evaluator::new(config.thresholds.clone()).now(2 * DAY);
            let report = pipeline::run_forecast(&mut query, &config, &evaluator);

            assert!(report.failed_sources.is_empty());
            assert_eq!(1, report.results.len());
            let result = &report.results[0];
            assert_eq!("vnxprop.spa,Pool_Name=Pool 0,vnx=spa", result.series);
            assert_eq!(50.0, result.percent_used);
            assert_eq!(1_099_511_627_776.0, result.latest_used);
            // 256 GB a day, 1024 GB to go
            assert_eq!(Some(4), result.projections[0].crossing.days_from(2 * DAY));
            match result.projections[1].crossing {
                Crossing::At(dt) => assert_eq!(2 * DAY, dt.timestamp()),
                other => panic!("unexpected {:?}", other),
            }

            assert_eq!(1, report.skipped.len());
            assert_eq!("vnxprop.spa,Pool_Name=Pool 1,vnx=spa", report.skipped[0].0);
            assert_eq!("InsufficientData", report.skipped[0].1.kind());

            let table = pipeline::render(&report.results, &evaluator);
            assert_eq!(2, table.lines().count());
            assert!(table.starts_with(
                "Series, Capacity, Used, Remaining, Percent Used, Date Full, \
                 Days Until Full, Date 50% Full, Days Until 50% Full\n"
            ));
            assert!(table.contains("2.00 TB, 1.00 TB, 1.00 TB, 50.00%, 1970-01-07, 4 days"));
        }

        const INVENTORY: &str = r#"{
            "name": "vc1.example.com",
            "children": [
                {"name": "East", "kind": "datacenter", "children": [
                    {"name": "prod", "children": [
                        {"name": "web01", "kind": "vm", "properties": {
                            "name": "web01",
                            "config.hardware.numCPU": 2,
                            "config.hardware.memoryMB": 4096,
                            "guest.guestState": "running",
                            "summary.storage.committed": 1000
                        }},
                        {"name": "db01", "kind": "vm", "properties": {
                            "name": "db01",
                            "config.hardware.numCPU": 8,
                            "config.hardware.memoryMB": 32768,
                            "guest.guestState": "notRunning",
                            "summary.storage.committed": 5000
                        }}
                    ]}
                ]},
                {"name": "broken", "kind": "vm", "properties": {"name": "broken"}}
            ]
        }"#;

        #[test]
        fn inventory_to_rollup() {
            let dir = TempDir::new("capstan").unwrap();
            let path = dir.path().join("vc1.json");
            File::create(&path)
                .unwrap()
                .write_all(INVENTORY.as_bytes())
                .unwrap();

            let mut config = VsphereConfig::default();
            config.inventories = vec![
                path.to_string_lossy().into_owned(),
                dir.path().join("missing.json").to_string_lossy().into_owned(),
            ];
            let inventory = Inventory::new(config.inventory.clone());
            let leaves = collect::gather(&config.inventories, move |p: &str| inventory.collect(p));
            assert_eq!(2, leaves.len());

            let samples = pipeline::rollup(&leaves, &config);
            // two vms, vcenter, datacenter, top-level folder
            assert_eq!(5, samples.len());
            let folder = samples
                .iter()
                .find(|s| s.measurement == "vmagg_topLevelFolder.vc1_example_com.East.prod")
                .unwrap();
            assert_eq!(Some(6000.0), folder.numeric("summary.storage.committed"));
            assert_eq!(Some(10.0), folder.numeric("config.hardware.numCPU"));

            let mut console = Console::new("Inventory samples");
            for sample in samples {
                console.deliver(sample);
            }
            let out = console.format();
            assert!(out.contains("Measurement: vmprop.vc1_example_com\n"));
            assert!(out.contains("Measurement: vmagg_vcenter.vc1_example_com\n"));
            assert!(console.flush().is_ok());
        }

        #[test]
        fn unreadable_inventories_fail_the_job() {
            let dir = TempDir::new("capstan").unwrap();
            let mut config = VsphereConfig::default();
            config.inventories = vec![
                dir.path().join("vc1.json").to_string_lossy().into_owned(),
                dir.path().join("vc2.json").to_string_lossy().into_owned(),
            ];
            let inventory = Inventory::new(config.inventory.clone());
            let leaves = collect::gather(&config.inventories, move |p: &str| inventory.collect(p));
            assert!(leaves.is_empty());

            let samples = pipeline::rollup(&leaves, &config);
            let mut console = Console::new("Inventory samples");
            assert!(pipeline::store(&mut console, samples).is_err());
        }
    }
}
