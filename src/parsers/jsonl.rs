use memchr::memchr_iter;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::{
    COL_FALLBACK_DATE, COL_INVENTORY_DESCRIPTION, COL_SOURCE_VEHICLE, COL_SUBMISSION_DATE,
    COL_TECHNICIAN, COL_TRANSFER_TYPE, RawRecord, cell,
};
use crate::error::IngestError;

/// Parses one JSON object per line, keyed by column name. Blank lines are skipped.
pub fn parse_jsonl(input: &str) -> Result<Vec<RawRecord>, IngestError> {
    let bytes = input.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;
    let mut line_no = 0;

    let mut ends: Vec<usize> = memchr_iter(b'\n', bytes).collect();
    if !bytes.is_empty() && ends.last().map_or(true, |&e| e + 1 < bytes.len()) {
        ends.push(bytes.len());
    }

    for end in ends {
        line_no += 1;
        let line = input[start..end].trim();
        start = end + 1;
        if line.is_empty() {
            continue;
        }
        let value: Value =
            serde_json::from_str(line).map_err(|source| IngestError::Json {
                line: line_no,
                source,
            })?;
        let Value::Object(map) = value else {
            return Err(IngestError::NotAnObject { line: line_no });
        };
        out.push(read_object(out.len() + 1, &map)?);
    }
    debug!(rows = out.len(), "parsed jsonl dataset");
    Ok(out)
}

fn read_object(row: usize, map: &Map<String, Value>) -> Result<RawRecord, IngestError> {
    let get = |name: &str| match map.get(name) {
        Some(value) => Ok(value_text(value)),
        None => Err(IngestError::MissingField {
            row,
            name: name.to_string(),
        }),
    };
    Ok(RawRecord {
        row,
        submission_date_raw: get(COL_SUBMISSION_DATE)?,
        fallback_date_raw: get(COL_FALLBACK_DATE)?,
        technician: get(COL_TECHNICIAN)?,
        source_vehicle: get(COL_SOURCE_VEHICLE)?,
        transfer_type: get(COL_TRANSFER_TYPE)?,
        inventory_description: get(COL_INVENTORY_DESCRIPTION)?,
    })
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => cell(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}
