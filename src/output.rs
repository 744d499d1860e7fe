use crate::aggregate::Report;
use crate::config::{COL_SUBMISSION_DATE, Record};
use crate::filter::FilterOptions;
use crate::normalizer::FixupStats;
use anyhow::{Result, anyhow};
use csv::WriterBuilder;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const COLUMNS: [&str; 8] = [
    "row",
    "date",
    "month",
    "tech",
    "source_vehicle",
    "transfer_type",
    "inventory",
    "equipment_types",
];

pub enum Writer<'a> {
    Stdout(Box<dyn Write + 'a>),
    Json(Box<dyn Write + 'a>, bool), // bool tracks if we've written the opening bracket
    Jsonl(Box<dyn Write + 'a>),
    Delimited(csv::Writer<Box<dyn Write + 'a>>, bool), // bool tracks if we've written headers
}

fn display_fields(record: &Record) -> [String; 8] {
    [
        record.row.to_string(),
        record
            .resolved_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        record.month_bucket.clone().unwrap_or_default(),
        record.technician.clone().unwrap_or_default(),
        record.source_vehicle.clone().unwrap_or_default(),
        record.transfer_type.clone().unwrap_or_default(),
        record.inventory_description.clone().unwrap_or_default(),
        record.equipment_label(),
    ]
}

impl<'a> Writer<'a> {
    pub fn delimited(inner: Box<dyn Write + 'a>, delimiter: u8) -> Self {
        let writer = WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(inner);
        Writer::Delimited(writer, false)
    }

    pub fn write_batch(&mut self, records: &[&Record]) -> Result<()> {
        match self {
            Writer::Stdout(writer) => {
                for record in records {
                    let fields = display_fields(record);
                    writeln!(writer, "{}", fields.join(" | "))?;
                }
            }
            Writer::Json(writer, is_first) => {
                for record in records {
                    if *is_first {
                        write!(writer, "[")?;
                        *is_first = false;
                    } else {
                        write!(writer, ",")?;
                    }
                    let serialized = serde_json::to_string_pretty(record)?;
                    write!(writer, "\n{}", serialized)?;
                }
            }
            Writer::Jsonl(writer) => {
                for record in records {
                    let serialized = serde_json::to_string(record)?;
                    writeln!(writer, "{}", serialized)?;
                }
            }
            Writer::Delimited(writer, headers_written) => {
                if !*headers_written {
                    writer.write_record(COLUMNS)?;
                    *headers_written = true;
                }
                for record in records {
                    writer.write_record(display_fields(record))?;
                }
            }
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        match self {
            Writer::Json(ref mut writer, is_first) => {
                if is_first {
                    write!(writer, "[")?;
                }
                writeln!(writer, "\n]")?;
                writer.flush()?;
            }
            Writer::Delimited(ref mut writer, headers_written) => {
                if !headers_written {
                    writer.write_record(COLUMNS)?;
                }
                writer.flush()?;
            }
            Writer::Jsonl(ref mut writer) | Writer::Stdout(ref mut writer) => {
                writer.flush()?;
            }
        }
        Ok(())
    }
}

fn open(path: &str) -> Result<BufWriter<File>> {
    create_parent_dirs(path)?;
    let file = File::create(path)?;
    Ok(BufWriter::new(file))
}

pub fn create_writer(output_arg: &str) -> Result<Writer<'static>> {
    match output_arg {
        "stdout" => Ok(Writer::Stdout(Box::new(io::stdout()))),
        "json" => Ok(Writer::Json(Box::new(io::stdout()), true)), // JSON to stdout
        path if path.ends_with(".json") => Ok(Writer::Json(Box::new(open(path)?), true)),
        path if path.ends_with(".jsonl") || path.ends_with(".ndjson") => {
            Ok(Writer::Jsonl(Box::new(open(path)?)))
        }
        path if path.ends_with(".csv") => Ok(Writer::delimited(Box::new(open(path)?), b',')),
        path if path.ends_with(".tsv") => Ok(Writer::delimited(Box::new(open(path)?), b'\t')),
        path => {
            // Default to JSON file if it looks like a path
            if path.contains('/') || path.contains('\\') || path.contains('.') {
                Ok(Writer::Json(Box::new(open(path)?), true))
            } else {
                Err(anyhow!(
                    "Unknown output format: {}. Use 'stdout', 'json', or a file path",
                    output_arg
                ))
            }
        }
    }
}

fn create_parent_dirs(file_path: &str) -> Result<()> {
    if let Some(parent) = Path::new(file_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub fn write(output_arg: &str, records: &[&Record]) -> Result<()> {
    let mut writer = create_writer(output_arg)?;
    writer.write_batch(records)?;
    writer.finish()
}

fn write_json<W: Write>(out: &mut W, value: &impl serde::Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Writes the aggregate report: text tables to stdout, or JSON to stdout / a file.
pub fn write_report(dest: &str, report: &Report, stats: &FixupStats) -> Result<()> {
    #[derive(serde::Serialize)]
    struct Envelope<'a> {
        stats: &'a FixupStats,
        #[serde(flatten)]
        report: &'a Report,
    }
    let envelope = Envelope { stats, report };

    match dest {
        "stdout" => render_report(&mut io::stdout().lock(), report),
        "json" => write_json(&mut io::stdout().lock(), &envelope),
        path if path.ends_with(".json") => {
            let mut writer = open(path)?;
            write_json(&mut writer, &envelope)?;
            writer.flush()?;
            Ok(())
        }
        other => Err(anyhow!(
            "Unknown report destination: {}. Use 'stdout', 'json', or a .json path",
            other
        )),
    }
}

pub fn render_report<W: Write>(out: &mut W, report: &Report) -> Result<()> {
    writeln!(out, "== Equipment usage by tech ({} records)", report.records)?;
    for row in &report.cross_tab {
        writeln!(
            out,
            "{:<24} {:<24} {:>6}",
            label(row.technician.as_deref()),
            label(row.equipment_type.as_deref()),
            row.count
        )?;
    }

    writeln!(out, "\n== Installs per day")?;
    for day in &report.per_day {
        writeln!(out, "{} {:>6}", day.date.format("%Y-%m-%d"), day.count)?;
    }

    writeln!(out, "\n== Installs per month")?;
    for month in &report.per_month {
        writeln!(out, "{:<10} {:>6}", month.month, month.count)?;
    }

    writeln!(out, "\n== Technician summary")?;
    writeln!(
        out,
        "{:<24} {:>8} {:<12} {:<12}",
        "tech", "installs", "first", "last"
    )?;
    for tech in &report.technicians {
        let fmt = |d: Option<chrono::NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string())
        };
        writeln!(
            out,
            "{:<24} {:>8} {:<12} {:<12}",
            label(tech.technician.as_deref()),
            tech.installs,
            fmt(tech.first_install),
            fmt(tech.last_install)
        )?;
    }
    out.flush()?;
    Ok(())
}

fn label(value: Option<&str>) -> &str {
    value.unwrap_or("(unspecified)")
}

pub fn render_options<W: Write>(out: &mut W, options: &FilterOptions) -> Result<()> {
    let dates: Vec<String> = options
        .dates
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();
    let sections: [(&str, &[String]); 6] = [
        ("tech", &options.technicians),
        ("vehicle", &options.source_vehicles),
        ("transfer-type", &options.transfer_types),
        ("equipment", &options.equipment_types),
        ("date", &dates),
        ("month", &options.months),
    ];
    for (name, values) in sections {
        writeln!(out, "{} ({}):", name, values.len())?;
        for v in values {
            writeln!(out, "  {}", v)?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Rows whose submission date did not parse, preceded by the row counts.
pub fn render_invalid_dates<W: Write>(out: &mut W, total: usize, invalid: &[&Record]) -> Result<()> {
    writeln!(out, "Total rows in file: {}", total)?;
    writeln!(out, "Rows with invalid {}: {}", COL_SUBMISSION_DATE, invalid.len())?;

    let mut writer = WriterBuilder::new().delimiter(b'\t').from_writer(&mut *out);
    writer.write_record(["row", "submission_date", "fallback_date", "resolved", "tech"])?;
    for r in invalid {
        writer.write_record([
            r.row.to_string(),
            r.submission_date_raw.clone().unwrap_or_default(),
            r.fallback_date_raw.clone().unwrap_or_default(),
            r.resolved_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
            r.technician.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;
    drop(writer);
    out.flush()?;
    Ok(())
}
