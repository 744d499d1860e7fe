pub mod delimited;
pub mod jsonl;

use crate::config::RawRecord;
use crate::error::IngestError;
use std::path::Path;

pub fn parse(format: &str, input: &str) -> Result<Vec<RawRecord>, IngestError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    match format {
        "csv" => delimited::parse_delimited(input, b','),
        "tsv" => delimited::parse_delimited(input, b'\t'),
        "jsonl" | "ndjson" => jsonl::parse_jsonl(input),
        _ => Err(IngestError::UnknownFormat(format.to_string())),
    }
}

/// Resolves `auto` to a concrete format from the file extension.
pub fn detect_format<'a>(requested: &'a str, path: &str) -> &'a str {
    if requested != "auto" {
        return requested;
    }
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("tsv") | Some("tab") => "tsv",
        Some("jsonl") | Some("ndjson") => "jsonl",
        _ => "csv",
    }
}
