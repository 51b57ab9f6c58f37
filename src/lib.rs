pub mod anchorage;
pub mod error;
pub mod filter;
pub mod model;
pub mod segmenter;
pub mod snapshot;
pub mod summary;
pub mod table;
pub mod timeline;

pub use anchorage::{AnchorageInterval, AnchorageMode};
pub use error::{Error, Field, Result};
pub use filter::{Criterion, RecordFilter};
pub use model::{Partition, PositionRecord, RawRecord};
pub use segmenter::{PortEvent, PortEventKind};
pub use snapshot::{Query, Report, Snapshot};
pub use summary::{FleetSummary, FleetSummaryDisplay, PortSummaryRow};
pub use table::RecordTable;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Arg, ArgAction, Command};
use log::{error, info};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Write};

#[derive(Debug)]
pub struct Config {
    paths: Vec<String>,
    partition: Partition,
    port: Option<String>,
    date: Option<NaiveDate>,
    vessel: Option<String>,
    ports: Vec<String>,
    anchorage_mode: AnchorageMode,
}

impl Config {
    /// Filter applied before the snapshot is built.
    fn load_filter(&self) -> RecordFilter {
        let mut filter = RecordFilter::all();
        if let Some(date) = self.date {
            filter = filter.with(Criterion::Date(date));
        }
        if !self.ports.is_empty() {
            let ports = self.ports.iter().cloned().collect::<BTreeSet<_>>();
            filter = filter.with(Criterion::PortIn(ports));
        }
        filter
    }

    fn query(&self) -> Query {
        let mut filter = RecordFilter::all();
        if let Some(port) = &self.port {
            filter = filter.with(Criterion::Port(port.clone()));
        }
        if let Some(vessel) = &self.vessel {
            filter = filter.with(Criterion::Vessel(vessel.clone()));
        }
        Query {
            partition: self.partition,
            filter,
        }
    }
}

pub fn get_arg() -> anyhow::Result<Config> {
    let matches = Command::new("port-watch")
        .version("0.1")
        .about("port arrivals, departures and anchorage time from AIS position reports [csv]")
        .arg(
            Arg::new("paths")
                .short('f')
                .long("file-path")
                .action(ArgAction::Append)
                .required(true)
                .help("csv file with position reports"),
        )
        .arg(
            Arg::new("category")
                .short('c')
                .long("category")
                .value_parser(["all", "cargo", "passenger"])
                .default_value("all")
                .help("vessel category to report"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("only report this port"),
        )
        .arg(
            Arg::new("date")
                .short('d')
                .long("date")
                .help("only load reports from this date [YYYY-MM-DD]"),
        )
        .arg(
            Arg::new("vessel")
                .long("vessel")
                .help("only report this vessel id"),
        )
        .arg(
            Arg::new("ports")
                .long("ports")
                .action(ArgAction::Append)
                .help("only load reports near these ports"),
        )
        .arg(
            Arg::new("anchorage-mode")
                .long("anchorage-mode")
                .value_parser(["next-sample", "contiguous-run"])
                .default_value("next-sample")
                .help("how long a zero-speed report counts as anchored"),
        )
        .get_matches();

    let paths = matches
        .get_many::<String>("paths")
        .unwrap_or_default()
        .cloned()
        .collect::<Vec<String>>();
    let ports = matches
        .get_many::<String>("ports")
        .unwrap_or_default()
        .cloned()
        .collect::<Vec<String>>();

    let partition = matches
        .get_one::<String>("category")
        .map_or(Ok(Partition::All), |c| c.parse())
        .map_err(anyhow::Error::msg)?;
    let anchorage_mode = matches
        .get_one::<String>("anchorage-mode")
        .map_or(Ok(AnchorageMode::NextSample), |m| m.parse())
        .map_err(anyhow::Error::msg)?;
    let date = matches
        .get_one::<String>("date")
        .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"))
        .transpose()
        .context("invalid --date, expected YYYY-MM-DD")?;

    Ok(Config {
        paths,
        partition,
        port: matches.get_one::<String>("port").cloned(),
        date,
        vessel: matches.get_one::<String>("vessel").cloned(),
        ports,
        anchorage_mode,
    })
}

pub fn run(config: Config) -> anyhow::Result<()> {
    info!("config is {:?}", config);

    let rows: Vec<Vec<RawRecord>> = config
        .paths
        .par_iter()
        .map(|x| process_file(x))
        .collect::<anyhow::Result<_>>()?;

    let files: Vec<(&str, usize)> = config
        .paths
        .iter()
        .map(String::as_str)
        .zip(rows.iter().map(Vec::len))
        .collect();
    let located = |e| with_location(e, &files);

    let table = RecordTable::from_raw(rows.into_iter().flatten()).map_err(located)?;
    let snapshot = Snapshot::build(&table, &config.load_filter(), config.anchorage_mode)
        .map_err(located)?;
    let report = snapshot.query(&config.query()).map_err(located)?;

    let stdout = std::io::stdout();
    write_report(&report, stdout.lock())
}

/// File and one-based data row of `row`, counted across the files in read order.
fn locate<'a>(files: &[(&'a str, usize)], mut row: usize) -> Option<(&'a str, usize)> {
    for &(path, len) in files {
        if row < len {
            return Some((path, row + 1));
        }
        row -= len;
    }
    None
}

fn with_location(err: Error, files: &[(&str, usize)]) -> anyhow::Error {
    let Error::InvalidInput { row, .. } = &err;
    match locate(files, *row) {
        Some((path, row)) => anyhow::Error::new(err).context(format!("{path}: data row {row}")),
        None => err.into(),
    }
}

/// Reads every row of an AIS csv export. Rows are validated later, together.
pub fn process_file(path: &str) -> anyhow::Result<Vec<RawRecord>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            error!("failed to open file {}: {}", path, e);
            return Err(e.into());
        }
    };

    let rows = read_records(file).with_context(|| format!("failed to read {path}"))?;
    info!("{} has {} records.", path, rows.len());
    Ok(rows)
}

pub fn read_records<R: Read>(reader: R) -> anyhow::Result<Vec<RawRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let record: RawRecord = result?;
        rows.push(record);
    }
    Ok(rows)
}

/// Writes the port table as csv followed by the fleet figures as `label,value` lines.
pub fn write_report<W: Write>(report: &Report, out: W) -> anyhow::Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(out);

    wtr.write_record(["FLAG", "PORT NAME", "ARRIVALS", "DEPARTURES"])?;
    for row in &report.port_summary {
        wtr.serialize(row)?;
    }
    for (label, value) in report.fleet_summary.display().fields() {
        wtr.write_record([label, value])?;
    }
    wtr.flush()?;
    Ok(())
}
