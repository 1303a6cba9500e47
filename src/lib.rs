//! Capstan collects capacity telemetry from virtualization and storage
//! infrastructure, rolls it up through the containment hierarchy, stores it
//! in InfluxDB and later forecasts when each resource will run out of room.
//!
//! The interesting parts live in a handful of modules:
//!
//!  * `aggregate` rolls leaf samples up through every path prefix.
//!  * `series` turns query results into ordered per-entity histories.
//!  * `anchor` fabricates a zero-usage birth point for young series.
//!  * `forecast` fits a linear trend and projects threshold crossings.
//!  * `pipeline` wires the above together into a batch job.
//!
//! Everything else is plumbing: `source` reads from the outside world, `sink`
//! writes back to it and `config` decides which of those happen.
#![allow(unknown_lints)]
#![deny(trivial_numeric_casts, missing_docs, unstable_features, unused_import_braces)]
extern crate chrono;
extern crate clap;
extern crate regex;
extern crate reqwest;
extern crate serde;
extern crate thiserror;
extern crate toml;
extern crate url;

#[macro_use]
extern crate log;

#[macro_use]
extern crate serde_json;

#[macro_use]
extern crate lazy_static;

#[macro_use]
extern crate serde_derive;

#[cfg(test)]
extern crate quickcheck;

pub mod aggregate;
pub mod anchor;
pub mod collect;
pub mod config;
pub mod constants;
pub mod forecast;
pub mod metric;
pub mod pipeline;
pub mod series;
pub mod sink;
pub mod source;
pub mod time;
pub mod util;
