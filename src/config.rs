use chrono::NaiveDate;
use serde::Serialize;

pub const COL_SUBMISSION_DATE: &str = "Submission Date";
pub const COL_FALLBACK_DATE: &str = "Today's Date";
pub const COL_TECHNICIAN: &str = "Tech";
pub const COL_SOURCE_VEHICLE: &str = "Transfer Inventory from:";
pub const COL_TRANSFER_TYPE: &str = "Type of transfer";
pub const COL_INVENTORY_DESCRIPTION: &str = "Inventory to Transfer.";

/// One transfer event as it was read from the dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub row: usize,
    pub submission_date_raw: Option<String>,
    pub fallback_date_raw: Option<String>,
    pub technician: Option<String>,
    pub source_vehicle: Option<String>,
    pub transfer_type: Option<String>,
    pub inventory_description: Option<String>,
}

/// Which field the resolved date came from.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DateSource {
    Submission,
    Fallback,
    Unresolved,
}

/// A transfer event after date resolution and equipment extraction.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Record {
    pub row: usize,
    pub submission_date_raw: Option<String>,
    pub fallback_date_raw: Option<String>,
    pub technician: Option<String>,
    pub source_vehicle: Option<String>,
    pub transfer_type: Option<String>,
    pub inventory_description: Option<String>,
    pub resolved_date: Option<NaiveDate>,
    pub date_source: DateSource,
    pub month_bucket: Option<String>,
    pub equipment_types: Vec<String>,
}

impl Record {
    pub fn equipment_label(&self) -> String {
        self.equipment_types.join(", ")
    }
}

/// Turns a raw cell into an optional value: trimmed, with blank cells absent.
pub fn cell(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
