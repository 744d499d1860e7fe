use std::iter::Sum;
use std::ops::Add;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{DateSource, RawRecord, Record};
use crate::{dates, equipment};

/// Date fix-up counters gathered during normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FixupStats {
    pub total: usize,
    pub fallback_used: usize,
    pub unresolved: usize,
}

impl FixupStats {
    fn of(record: &Record) -> Self {
        FixupStats {
            total: 1,
            fallback_used: usize::from(record.date_source == DateSource::Fallback),
            unresolved: usize::from(record.date_source == DateSource::Unresolved),
        }
    }
}

impl Add for FixupStats {
    type Output = FixupStats;

    fn add(self, rhs: FixupStats) -> FixupStats {
        FixupStats {
            total: self.total + rhs.total,
            fallback_used: self.fallback_used + rhs.fallback_used,
            unresolved: self.unresolved + rhs.unresolved,
        }
    }
}

impl Sum for FixupStats {
    fn sum<I: Iterator<Item = FixupStats>>(iter: I) -> Self {
        iter.fold(FixupStats::default(), Add::add)
    }
}

/// The canonical record set of one upload.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub records: Vec<Record>,
    pub stats: FixupStats,
}

pub fn normalize(raw: Vec<RawRecord>) -> Normalized {
    #[cfg(feature = "parallel")]
    let records: Vec<Record> = raw.into_par_iter().map(normalize_record).collect();
    #[cfg(not(feature = "parallel"))]
    let records: Vec<Record> = raw.into_iter().map(normalize_record).collect();

    let stats: FixupStats = records.iter().map(FixupStats::of).sum();
    info!(
        total = stats.total,
        fallback_used = stats.fallback_used,
        unresolved = stats.unresolved,
        "normalized records"
    );

    Normalized { records, stats }
}

/// Records whose own submission date did not parse, blank ones included.
pub fn invalid_submission_dates(records: &[Record]) -> Vec<&Record> {
    records
        .iter()
        .filter(|r| r.date_source != DateSource::Submission)
        .collect()
}

pub fn normalize_record(raw: RawRecord) -> Record {
    let resolved = dates::resolve(
        raw.submission_date_raw.as_deref(),
        raw.fallback_date_raw.as_deref(),
    );
    match resolved.source() {
        DateSource::Fallback => debug!(row = raw.row, "submission date repaired from fallback"),
        DateSource::Unresolved => debug!(row = raw.row, "no resolvable date"),
        DateSource::Submission => {}
    }

    let resolved_date = resolved.date();
    let equipment_types = equipment::extract(raw.inventory_description.as_deref());

    Record {
        row: raw.row,
        submission_date_raw: raw.submission_date_raw,
        fallback_date_raw: raw.fallback_date_raw,
        technician: raw.technician,
        source_vehicle: raw.source_vehicle,
        transfer_type: raw.transfer_type,
        inventory_description: raw.inventory_description,
        resolved_date,
        date_source: resolved.source(),
        month_bucket: resolved_date.map(dates::month_bucket),
        equipment_types,
    }
}
