extern crate capstan;
extern crate chrono;
extern crate fern;

#[macro_use]
extern crate log;

use capstan::collect;
use capstan::config::{self, Args, Command};
use capstan::forecast::Evaluator;
use capstan::metric::Sample;
use capstan::pipeline;
use capstan::sink::{self, Sink};
use capstan::source::influxdb::Dsn;
use capstan::source::{CommandFetch, InfluxDB, Inventory, Vnx, Xio};
use chrono::Utc;
use std::process;

fn sink_for(args: &Args, heading: &str) -> Result<Box<dyn Sink>, String> {
    if args.debug {
        return Ok(Box::new(sink::Console::new(heading)));
    }
    let dsn = Dsn::parse(&args.influx_dsn).map_err(|e| e.to_string())?;
    Ok(Box::new(
        sink::InfluxDB::new(dsn).max_attempts(args.influx_max_attempts),
    ))
}

fn store(args: &Args, heading: &str, samples: Vec<Sample>) -> Result<(), String> {
    let mut sink = sink_for(args, heading)?;
    pipeline::store(&mut *sink, samples)
        .map(|_| ())
        .map_err(|e| e.to_string())
}

fn query_client(args: &Args) -> Result<InfluxDB, String> {
    let dsn = Dsn::parse(&args.influx_dsn).map_err(|e| e.to_string())?;
    Ok(InfluxDB::new(dsn))
}

fn vsphere(args: &Args) -> Result<(), String> {
    let inventory = Inventory::new(args.vsphere.inventory.clone());
    let leaves = collect::gather(&args.vsphere.inventories, move |path: &str| {
        inventory.collect(path)
    });
    let samples = pipeline::rollup(&leaves, &args.vsphere);
    store(args, "Inventory samples", samples)
}

fn vnx(args: &Args) -> Result<(), String> {
    let cfg = &args.vnx;
    let fetch = CommandFetch::new(cfg.command.clone(), cfg.username.clone(), cfg.password.clone());
    let vnx = Vnx::new(cfg.collector.clone(), Box::new(fetch));
    let samples = collect::gather(&cfg.endpoints, move |endpoint: &str| vnx.collect(endpoint));
    store(args, "VNX samples", samples)
}

fn xio(args: &Args) -> Result<(), String> {
    let cfg = &args.xio;
    let fetch = CommandFetch::new(cfg.command.clone(), cfg.username.clone(), cfg.password.clone());
    let xio = Xio::new(cfg.collector.clone(), Box::new(fetch));
    let samples = collect::gather(&cfg.endpoints, move |endpoint: &str| xio.collect(endpoint));
    store(args, "XtremIO samples", samples)
}

fn synth(args: &Args) -> Result<(), String> {
    let mut client = query_client(args)?;
    let anchors = pipeline::synthesize(&mut client, &args.synth).map_err(|e| e.to_string())?;
    if anchors.is_empty() {
        info!("every series already has an anchor");
        return Ok(());
    }
    store(args, "Synthesized points", anchors)
}

fn forecast(args: &Args) -> Result<(), String> {
    let mut client = query_client(args)?;
    let evaluator = Evaluator::new(args.forecast.thresholds.clone());
    let report = pipeline::run_forecast(&mut client, &args.forecast, &evaluator);
    print!("{}", pipeline::render(&report.results, &evaluator));
    if report.results.is_empty() {
        return Err(format!(
            "no series could be forecast, {} skipped, {} sources failed",
            report.skipped.len(),
            report.failed_sources.len()
        ));
    }
    Ok(())
}

fn main() {
    let args = match config::parse_args() {
        Ok(args) => args,
        Err(config::Error::Usage(e)) => e.exit(),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    };

    let mut level = match args.verbose {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    if args.debug && level < log::LevelFilter::Debug {
        level = log::LevelFilter::Debug;
    }

    let logging = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}][{}] {}",
                record.module_path().unwrap_or("capstan"),
                record.line().unwrap_or(0),
                Utc::now().to_rfc3339(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply();
    if let Err(e) = logging {
        eprintln!("could not set up logging: {}", e);
        process::exit(2);
    }

    info!("capstan - {}", args.version);

    let outcome = match args.command {
        Some(Command::Vsphere) => vsphere(&args),
        Some(Command::Vnx) => vnx(&args),
        Some(Command::Xio) => xio(&args),
        Some(Command::Synth) => synth(&args),
        Some(Command::Forecast) => forecast(&args),
        None => Err("no job given".to_string()),
    };
    if let Err(e) = outcome {
        error!("{}", e);
        process::exit(1);
    }
}
