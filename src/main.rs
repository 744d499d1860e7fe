mod aggregate;
mod config;
mod dates;
mod equipment;
mod error;
mod filter;
mod normalizer;
mod output;
mod parsers;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use memmap2::Mmap;
use std::collections::BTreeSet;
use std::fs::File;
use std::io;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::aggregate::Report;
use crate::filter::{FilterOptions, FilterSelection};
use crate::normalizer::FixupStats;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(value_name = "FILE")]
    file: String,

    /// csv, tsv, jsonl, or auto (from the file extension)
    #[arg(short, long, default_value = "auto")]
    format: String,

    /// Where filtered records go: stdout, json, none, or a file path
    #[arg(short, long, default_value = "stdout")]
    output: String,

    /// Aggregate report destination: stdout (tables), json, or a .json path
    #[arg(short, long)]
    report: Option<String>,

    #[arg(long = "tech", value_name = "NAME")]
    techs: Vec<String>,

    #[arg(long = "vehicle", value_name = "NAME")]
    vehicles: Vec<String>,

    #[arg(long = "transfer-type", value_name = "TYPE")]
    transfer_types: Vec<String>,

    #[arg(long = "equipment", value_name = "TOKEN")]
    equipment: Vec<String>,

    #[arg(long = "date", value_name = "YYYY-MM-DD", value_parser = parse_day)]
    dates: Vec<NaiveDate>,

    #[arg(long = "month", value_name = "YYYY-MM", value_parser = parse_month)]
    months: Vec<String>,

    /// Print the values each filter accepts and exit
    #[arg(long)]
    list_options: bool,

    /// Print rows whose submission date does not parse and exit
    #[arg(long)]
    invalid_dates: bool,

    /// Print date fix-up counters to stderr
    #[arg(long)]
    summary: bool,
}

impl Args {
    fn selection(&self) -> FilterSelection {
        fn set<T: Ord + Clone>(values: &[T]) -> BTreeSet<T> {
            values.iter().cloned().collect()
        }
        FilterSelection {
            technicians: set(&self.techs),
            source_vehicles: set(&self.vehicles),
            transfer_types: set(&self.transfer_types),
            equipment_types: set(&self.equipment),
            dates: set(&self.dates),
            months: set(&self.months),
        }
    }
}

fn parse_day(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("{s}: {e}"))
}

fn parse_month(s: &str) -> Result<String, String> {
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
        .map(dates::month_bucket)
        .map_err(|e| format!("{s}: {e}"))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("transfernorm=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let start_time = Instant::now();
    let file_size = std::fs::metadata(&args.file)
        .with_context(|| format!("reading {}", args.file))?
        .len();

    // mmap the file
    let file = File::open(&args.file)?;
    let mmap = if file_size > 0 {
        Some(unsafe { Mmap::map(&file)? })
    } else {
        None
    };
    let input = match &mmap {
        Some(m) => std::str::from_utf8(m).with_context(|| format!("{} is not UTF-8", args.file))?,
        None => "",
    };

    let format = parsers::detect_format(&args.format, &args.file);
    let raw = parsers::parse(format, input)?;
    info!(rows = raw.len(), format, "loaded dataset");

    let normalized = normalizer::normalize(raw);
    let records = &normalized.records;

    if args.list_options {
        let options = FilterOptions::from_records(records);
        return output::render_options(&mut io::stdout().lock(), &options);
    }

    if args.invalid_dates {
        let invalid = normalizer::invalid_submission_dates(records);
        return output::render_invalid_dates(&mut io::stdout().lock(), records.len(), &invalid);
    }

    let selection = args.selection();
    let view = filter::apply(records, &selection);
    info!(matched = view.len(), total = records.len(), "applied filters");

    if args.output != "none" {
        output::write(&args.output, &view)?;
    }

    if let Some(dest) = &args.report {
        output::write_report(dest, &Report::build(&view), &normalized.stats)?;
    }

    if args.summary {
        print_fixup_summary(&normalized.stats, view.len(), file_size, start_time.elapsed());
    }

    Ok(())
}

fn print_fixup_summary(
    stats: &FixupStats,
    matched: usize,
    file_size: u64,
    duration: std::time::Duration,
) {
    let file_size_kb = file_size as f64 / 1024.0;
    let pct = |n: usize| {
        if stats.total == 0 {
            0.0
        } else {
            n as f64 / stats.total as f64 * 100.0
        }
    };

    eprintln!("\n=== DATE FIX-UP SUMMARY ===");
    eprintln!("File size: {:.1} KB", file_size_kb);
    eprintln!("Total records: {}", stats.total);
    eprintln!(
        "Dates auto-fixed from '{}': {} ({:.1}%)",
        config::COL_FALLBACK_DATE,
        stats.fallback_used,
        pct(stats.fallback_used)
    );
    eprintln!(
        "Records without a usable date: {} ({:.1}%)",
        stats.unresolved,
        pct(stats.unresolved)
    );
    eprintln!("Records matching filters: {}", matched);
    eprintln!("Processing time: {:.3}s", duration.as_secs_f64());
}
