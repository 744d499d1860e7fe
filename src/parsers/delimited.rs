use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::config::{
    COL_FALLBACK_DATE, COL_INVENTORY_DESCRIPTION, COL_SOURCE_VEHICLE, COL_SUBMISSION_DATE,
    COL_TECHNICIAN, COL_TRANSFER_TYPE, RawRecord, cell,
};
use crate::error::IngestError;

/// Positions of the schema columns within a header row.
struct ColumnIndex {
    submission_date: usize,
    fallback_date: usize,
    technician: usize,
    source_vehicle: usize,
    transfer_type: usize,
    inventory_description: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, IngestError> {
        let locate = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| IngestError::MissingColumn {
                    name: name.to_string(),
                })
        };
        Ok(ColumnIndex {
            submission_date: locate(COL_SUBMISSION_DATE)?,
            fallback_date: locate(COL_FALLBACK_DATE)?,
            technician: locate(COL_TECHNICIAN)?,
            source_vehicle: locate(COL_SOURCE_VEHICLE)?,
            transfer_type: locate(COL_TRANSFER_TYPE)?,
            inventory_description: locate(COL_INVENTORY_DESCRIPTION)?,
        })
    }

    fn read(&self, row: usize, fields: &StringRecord) -> RawRecord {
        let get = |idx: usize| fields.get(idx).and_then(cell);
        RawRecord {
            row,
            submission_date_raw: get(self.submission_date),
            fallback_date_raw: get(self.fallback_date),
            technician: get(self.technician),
            source_vehicle: get(self.source_vehicle),
            transfer_type: get(self.transfer_type),
            inventory_description: get(self.inventory_description),
        }
    }
}

/// Parses a header-led delimited table (CSV or TSV). Short rows leave trailing cells absent.
pub fn parse_delimited(input: &str, delimiter: u8) -> Result<Vec<RawRecord>, IngestError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(input.as_bytes());

    let columns = ColumnIndex::from_headers(reader.headers()?)?;

    let mut out = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let fields = result?;
        out.push(columns.read(i + 1, &fields));
    }
    debug!(rows = out.len(), "parsed delimited dataset");
    Ok(out)
}
