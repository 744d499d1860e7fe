use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::Record;

/// A filterable column of the canonical record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Technician,
    SourceVehicle,
    TransferType,
    EquipmentType,
    ResolvedDate,
    MonthBucket,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Dimension::Technician,
        Dimension::SourceVehicle,
        Dimension::TransferType,
        Dimension::EquipmentType,
        Dimension::ResolvedDate,
        Dimension::MonthBucket,
    ];
}

/// Chosen values per dimension. An empty set leaves that dimension unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub technicians: BTreeSet<String>,
    pub source_vehicles: BTreeSet<String>,
    pub transfer_types: BTreeSet<String>,
    pub equipment_types: BTreeSet<String>,
    pub dates: BTreeSet<NaiveDate>,
    pub months: BTreeSet<String>,
}

impl FilterSelection {
    pub fn is_active(&self, dim: Dimension) -> bool {
        match dim {
            Dimension::Technician => !self.technicians.is_empty(),
            Dimension::SourceVehicle => !self.source_vehicles.is_empty(),
            Dimension::TransferType => !self.transfer_types.is_empty(),
            Dimension::EquipmentType => !self.equipment_types.is_empty(),
            Dimension::ResolvedDate => !self.dates.is_empty(),
            Dimension::MonthBucket => !self.months.is_empty(),
        }
    }

    pub fn matches_dimension(&self, dim: Dimension, record: &Record) -> bool {
        match dim {
            Dimension::Technician => member(&self.technicians, record.technician.as_ref()),
            Dimension::SourceVehicle => {
                member(&self.source_vehicles, record.source_vehicle.as_ref())
            }
            Dimension::TransferType => member(&self.transfer_types, record.transfer_type.as_ref()),
            Dimension::EquipmentType => {
                self.equipment_types.is_empty()
                    || record
                        .equipment_types
                        .iter()
                        .any(|t| self.equipment_types.contains(t))
            }
            Dimension::ResolvedDate => member(&self.dates, record.resolved_date.as_ref()),
            Dimension::MonthBucket => member(&self.months, record.month_bucket.as_ref()),
        }
    }
}

fn member<T: Ord>(chosen: &BTreeSet<T>, value: Option<&T>) -> bool {
    chosen.is_empty() || value.is_some_and(|v| chosen.contains(v))
}

/// Records matching every active dimension, in their original order.
pub fn apply<'a>(records: &'a [Record], selection: &FilterSelection) -> Vec<&'a Record> {
    Dimension::ALL
        .iter()
        .fold(records.iter().collect::<Vec<_>>(), |view, &dim| {
            apply_dimension(view, selection, dim)
        })
}

/// Narrows an existing view by a single dimension.
pub fn apply_dimension<'a>(
    view: Vec<&'a Record>,
    selection: &FilterSelection,
    dim: Dimension,
) -> Vec<&'a Record> {
    if !selection.is_active(dim) {
        return view;
    }
    view.into_iter()
        .filter(|r| selection.matches_dimension(dim, r))
        .collect()
}

/// Distinct, non-missing values per dimension, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub technicians: Vec<String>,
    pub source_vehicles: Vec<String>,
    pub transfer_types: Vec<String>,
    pub equipment_types: Vec<String>,
    pub dates: Vec<NaiveDate>,
    pub months: Vec<String>,
}

impl FilterOptions {
    pub fn from_records(records: &[Record]) -> Self {
        fn distinct<'a, T, I>(values: I) -> Vec<T>
        where
            T: Ord + Clone + 'a,
            I: Iterator<Item = &'a T>,
        {
            values.collect::<BTreeSet<_>>().into_iter().cloned().collect()
        }

        FilterOptions {
            technicians: distinct(records.iter().filter_map(|r| r.technician.as_ref())),
            source_vehicles: distinct(records.iter().filter_map(|r| r.source_vehicle.as_ref())),
            transfer_types: distinct(records.iter().filter_map(|r| r.transfer_type.as_ref())),
            equipment_types: distinct(records.iter().flat_map(|r| r.equipment_types.iter())),
            dates: distinct(records.iter().filter_map(|r| r.resolved_date.as_ref())),
            months: distinct(records.iter().filter_map(|r| r.month_bucket.as_ref())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawRecord;
    use crate::normalizer::normalize;

    fn fixture() -> Vec<Record> {
        let rows = [
            ("2024-01-05", "Ann", "Van 1", "Install", "ONT HG8245"),
            ("2024-01-06", "Bob", "Van 2", "Return", "no equipment here"),
            ("2024-02-10", "Ann", "Van 2", "Install", "ONT G6, ONT HG8245"),
            ("", "", "Van 1", "Install", "ONT G6"),
        ];
        let raw = rows
            .iter()
            .enumerate()
            .map(|(i, (date, tech, van, kind, desc))| RawRecord {
                row: i + 1,
                submission_date_raw: crate::config::cell(date),
                technician: crate::config::cell(tech),
                source_vehicle: crate::config::cell(van),
                transfer_type: crate::config::cell(kind),
                inventory_description: crate::config::cell(desc),
                ..Default::default()
            })
            .collect();
        normalize(raw).records
    }

    fn rows(view: &[&Record]) -> Vec<usize> {
        view.iter().map(|r| r.row).collect()
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn empty_selection_returns_everything() {
        let records = fixture();
        let view = apply(&records, &FilterSelection::default());
        assert_eq!(rows(&view), vec![1, 2, 3, 4]);
    }

    #[test]
    fn inactive_dimension_keeps_absent_values() {
        let records = fixture();
        let sel = FilterSelection {
            source_vehicles: set(&["Van 1"]),
            ..Default::default()
        };
        assert_eq!(rows(&apply(&records, &sel)), vec![1, 4]);
    }

    #[test]
    fn active_dimension_drops_absent_values() {
        let records = fixture();
        let sel = FilterSelection {
            technicians: set(&["Ann", "Bob"]),
            ..Default::default()
        };
        assert_eq!(rows(&apply(&records, &sel)), vec![1, 2, 3]);
    }

    #[test]
    fn equipment_matches_any_token() {
        let records = fixture();
        let sel = FilterSelection {
            equipment_types: set(&["G6"]),
            ..Default::default()
        };
        assert_eq!(rows(&apply(&records, &sel)), vec![3, 4]);
    }

    #[test]
    fn dimensions_are_conjunctive() {
        let records = fixture();
        let sel = FilterSelection {
            technicians: set(&["Ann"]),
            months: set(&["2024-02"]),
            ..Default::default()
        };
        assert_eq!(rows(&apply(&records, &sel)), vec![3]);

        let sel = FilterSelection {
            dates: [NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()].into(),
            transfer_types: set(&["Install"]),
            ..Default::default()
        };
        assert!(apply(&records, &sel).is_empty());
    }

    #[test]
    fn dimension_order_does_not_matter() {
        let records = fixture();
        let sel = FilterSelection {
            technicians: set(&["Ann"]),
            source_vehicles: set(&["Van 2"]),
            equipment_types: set(&["HG8245"]),
            ..Default::default()
        };
        let all = apply(&records, &sel);

        let start: Vec<&Record> = records.iter().collect();
        let forward = Dimension::ALL
            .iter()
            .fold(start.clone(), |v, &d| apply_dimension(v, &sel, d));
        let backward = Dimension::ALL
            .iter()
            .rev()
            .fold(start, |v, &d| apply_dimension(v, &sel, d));
        assert_eq!(rows(&all), vec![3]);
        assert_eq!(rows(&forward), rows(&all));
        assert_eq!(rows(&backward), rows(&all));
    }

    #[test]
    fn filtering_leaves_canonical_set_untouched() {
        let records = fixture();
        let before = records.clone();
        let sel = FilterSelection {
            technicians: set(&["Bob"]),
            ..Default::default()
        };
        let _ = apply(&records, &sel);
        assert_eq!(records, before);
    }

    #[test]
    fn options_are_distinct_and_sorted() {
        let records = fixture();
        let opts = FilterOptions::from_records(&records);
        assert_eq!(opts.technicians, vec!["Ann", "Bob"]);
        assert_eq!(opts.source_vehicles, vec!["Van 1", "Van 2"]);
        assert_eq!(opts.transfer_types, vec!["Install", "Return"]);
        assert_eq!(opts.equipment_types, vec!["G6", "HG8245"]);
        assert_eq!(opts.months, vec!["2024-01", "2024-02"]);
        assert_eq!(opts.dates.len(), 3);
    }
}
