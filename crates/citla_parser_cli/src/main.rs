use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing::info;

use citla_parser_core::{useful_service_ids, Feed, Normalizer, ServiceWindow};

#[derive(Debug, Parser)]
#[command(name = "citla-parser")]
#[command(about = "Normalizes the exo Laurentides (CITLA) bus feed")]
struct Args {
    /// Feed directory or google_transit.zip archive.
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Output JSON file.
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Service window start (YYYY-MM-DD), defaults to today.
    #[arg(short = 'd', long = "date")]
    date: Option<NaiveDate>,

    /// Service window length in days.
    #[arg(long = "window-days", default_value_t = 62)]
    window_days: u32,

    /// Pretty-print the output JSON.
    #[arg(short = 'p', long = "pretty")]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();
    let args = Args::parse();
    let started = Instant::now();

    let feed = Feed::from_path(&args.input)
        .with_context(|| format!("loading feed from {}", args.input.display()))?;
    info!(
        routes = feed.routes.len(),
        stops = feed.stops.len(),
        trips = feed.trips.len(),
        "feed loaded"
    );

    let start = args.date.unwrap_or_else(|| Local::now().date_naive());
    let window = ServiceWindow::new(start, args.window_days);
    let useful = useful_service_ids(&feed.calendars, &feed.calendar_dates, &window);
    info!(services = useful.len(), start = %window.start, "service window");

    let network = Normalizer::citla()
        .process(&feed, Some(&useful))
        .context("normalizing feed")?;

    let output = File::create(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut writer = BufWriter::new(output);
    if args.pretty {
        serde_json::to_writer_pretty(&mut writer, &network)?;
    } else {
        serde_json::to_writer(&mut writer, &network)?;
    }

    info!(
        routes = network.routes.len(),
        stops = network.stops.len(),
        trips = network.trips.len(),
        elapsed = ?started.elapsed(),
        "network written to {}",
        args.output.display()
    );
    Ok(())
}
