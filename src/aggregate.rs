use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::Record;

/// Cross-tab key. `None` on either side is the unspecified bucket.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct CrossKey {
    pub technician: Option<String>,
    pub equipment_type: Option<String>,
}

pub type CrossTab = BTreeMap<CrossKey, usize>;

/// Counts per (technician, equipment type). A record with several tokens counts once per token.
pub fn cross_tab(records: &[&Record]) -> CrossTab {
    let mut tab = CrossTab::new();
    for r in records {
        if r.equipment_types.is_empty() {
            let key = CrossKey {
                technician: r.technician.clone(),
                equipment_type: None,
            };
            *tab.entry(key).or_insert(0) += 1;
            continue;
        }
        for token in &r.equipment_types {
            let key = CrossKey {
                technician: r.technician.clone(),
                equipment_type: Some(token.clone()),
            };
            *tab.entry(key).or_insert(0) += 1;
        }
    }
    tab
}

/// Records per resolved day; undated records are left out.
pub fn per_day(records: &[&Record]) -> BTreeMap<NaiveDate, usize> {
    let mut counts = BTreeMap::new();
    for date in records.iter().filter_map(|r| r.resolved_date) {
        *counts.entry(date).or_insert(0) += 1;
    }
    counts
}

/// Records per `YYYY-MM` bucket; undated records are left out.
pub fn per_month(records: &[&Record]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for month in records.iter().filter_map(|r| r.month_bucket.as_ref()) {
        *counts.entry(month.clone()).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TechnicianSummary {
    pub technician: Option<String>,
    pub installs: usize,
    pub first_install: Option<NaiveDate>,
    pub last_install: Option<NaiveDate>,
}

/// Per technician: records carrying equipment, and the date span of all their records.
/// Sorted by installs descending, then name; the unspecified technician sorts last among ties.
pub fn technician_summary(records: &[&Record]) -> Vec<TechnicianSummary> {
    let mut by_tech: BTreeMap<Option<&String>, TechnicianSummary> = BTreeMap::new();
    for r in records {
        let entry = by_tech
            .entry(r.technician.as_ref())
            .or_insert_with(|| TechnicianSummary {
                technician: r.technician.clone(),
                installs: 0,
                first_install: None,
                last_install: None,
            });
        if !r.equipment_types.is_empty() {
            entry.installs += 1;
        }
        if let Some(date) = r.resolved_date {
            entry.first_install = Some(entry.first_install.map_or(date, |d| d.min(date)));
            entry.last_install = Some(entry.last_install.map_or(date, |d| d.max(date)));
        }
    }

    let mut out: Vec<TechnicianSummary> = by_tech.into_values().collect();
    out.sort_by(|a, b| {
        b.installs
            .cmp(&a.installs)
            .then_with(|| a.technician.is_none().cmp(&b.technician.is_none()))
            .then_with(|| a.technician.cmp(&b.technician))
    });
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossTabRow {
    pub technician: Option<String>,
    pub equipment_type: Option<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub month: String,
    pub count: usize,
}

/// All aggregate tables for one filtered view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub records: usize,
    pub cross_tab: Vec<CrossTabRow>,
    pub per_day: Vec<DayCount>,
    pub per_month: Vec<MonthCount>,
    pub technicians: Vec<TechnicianSummary>,
}

impl Report {
    pub fn build(records: &[&Record]) -> Self {
        Report {
            records: records.len(),
            cross_tab: cross_tab(records)
                .into_iter()
                .map(|(k, count)| CrossTabRow {
                    technician: k.technician,
                    equipment_type: k.equipment_type,
                    count,
                })
                .collect(),
            per_day: per_day(records)
                .into_iter()
                .map(|(date, count)| DayCount { date, count })
                .collect(),
            per_month: per_month(records)
                .into_iter()
                .map(|(month, count)| MonthCount { month, count })
                .collect(),
            technicians: technician_summary(records),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{self, FilterSelection};
    use crate::normalizer::normalize;
    use crate::parsers;

    const SCENARIO: &str = "Submission Date,Today's Date,Tech,Transfer Inventory from:,Type of transfer,Inventory to Transfer.
2024-01-05,,Ann,Van 1,Install,ONT HG8245
,2024-01-06,Bob,Van 2,Install,no equipment here
bad,bad,Ann,Van 1,Install,\"ONT G6, ONT HG8245\"
";

    fn key(tech: Option<&str>, equipment: Option<&str>) -> CrossKey {
        CrossKey {
            technician: tech.map(str::to_string),
            equipment_type: equipment.map(str::to_string),
        }
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn end_to_end_scenario() {
        let raw = parsers::parse("csv", SCENARIO).unwrap();
        let n = normalize(raw);
        let r = &n.records;

        assert_eq!(r[0].resolved_date, Some(ymd(2024, 1, 5)));
        assert_eq!(r[1].resolved_date, Some(ymd(2024, 1, 6)));
        assert_eq!(r[2].resolved_date, None);
        assert_eq!(n.stats.fallback_used, 1);
        assert_eq!(n.stats.unresolved, 1);
        assert_eq!(n.stats.total, 3);

        assert_eq!(r[0].equipment_types, vec!["HG8245"]);
        assert!(r[1].equipment_types.is_empty());
        assert_eq!(r[2].equipment_types, vec!["G6", "HG8245"]);

        let view = filter::apply(r, &FilterSelection::default());
        let months = per_month(&view);
        assert_eq!(months.len(), 1);
        assert_eq!(months["2024-01"], 2);

        let tab = cross_tab(&view);
        let per_equipment = |name: &str| -> usize {
            tab.iter()
                .filter(|(k, _)| k.equipment_type.as_deref() == Some(name))
                .map(|(_, c)| c)
                .sum()
        };
        assert_eq!(per_equipment("HG8245"), 2);
        assert_eq!(per_equipment("G6"), 1);
        assert_eq!(tab[&key(Some("Ann"), Some("HG8245"))], 2);
        assert_eq!(tab[&key(Some("Bob"), None)], 1);
    }

    #[test]
    fn cross_tab_fans_out_per_token() {
        let raw = parsers::parse("csv", SCENARIO).unwrap();
        let records = normalize(raw).records;
        let view: Vec<&Record> = records.iter().collect();
        let tab = cross_tab(&view);

        let pairs: usize = view.iter().map(|r| r.equipment_types.len().max(1)).sum();
        assert_eq!(tab.values().sum::<usize>(), pairs);
        assert!(pairs > view.len());
    }

    #[test]
    fn missing_technician_lands_in_unspecified_bucket() {
        let input = "Submission Date,Today's Date,Tech,Transfer Inventory from:,Type of transfer,Inventory to Transfer.
2024-03-01,,,Van 1,Install,ONT G6
2024-03-02,,,Van 1,Install,
";
        let records = normalize(parsers::parse("csv", input).unwrap()).records;
        let view: Vec<&Record> = records.iter().collect();
        let tab = cross_tab(&view);
        assert_eq!(tab[&key(None, Some("G6"))], 1);
        assert_eq!(tab[&key(None, None)], 1);
    }

    #[test]
    fn per_day_is_chronological_and_skips_undated() {
        let raw = parsers::parse("csv", SCENARIO).unwrap();
        let records = normalize(raw).records;
        let view: Vec<&Record> = records.iter().rev().collect();
        let days: Vec<(NaiveDate, usize)> = per_day(&view).into_iter().collect();
        assert_eq!(days, vec![(ymd(2024, 1, 5), 1), (ymd(2024, 1, 6), 1)]);
    }

    #[test]
    fn technician_summary_ordering() {
        let input = "Submission Date,Today's Date,Tech,Transfer Inventory from:,Type of transfer,Inventory to Transfer.
2024-01-10,,Cid,Van 1,Install,ONT G6
2024-01-02,,Cid,Van 1,Install,ONT G6
2024-01-20,,Cid,Van 1,Return,nothing
2024-01-03,,Bob,Van 2,Install,ONT HG8245
2024-01-04,,Ann,Van 2,Install,ONT HG8245
bad,,Ann,Van 2,Install,
2024-01-05,,,Van 2,Install,ONT HG8245
";
        let records = normalize(parsers::parse("csv", input).unwrap()).records;
        let view: Vec<&Record> = records.iter().collect();
        let summary = technician_summary(&view);

        let order: Vec<Option<&str>> = summary.iter().map(|s| s.technician.as_deref()).collect();
        assert_eq!(order, vec![Some("Cid"), Some("Ann"), Some("Bob"), None]);

        assert_eq!(summary[0].installs, 2);
        assert_eq!(summary[0].first_install, Some(ymd(2024, 1, 2)));
        assert_eq!(summary[0].last_install, Some(ymd(2024, 1, 20)));
        assert_eq!(summary[1].installs, 1);
        assert_eq!(summary[1].first_install, Some(ymd(2024, 1, 4)));
        assert_eq!(summary[1].last_install, Some(ymd(2024, 1, 4)));
    }

    #[test]
    fn empty_view_gives_empty_tables() {
        let report = Report::build(&[]);
        assert_eq!(report, Report::default());
    }

    #[test]
    fn report_follows_the_filtered_view() {
        let records = normalize(parsers::parse("csv", SCENARIO).unwrap()).records;
        let selection = FilterSelection {
            technicians: ["Bob".to_string()].into(),
            ..Default::default()
        };
        let view = filter::apply(&records, &selection);
        let report = Report::build(&view);
        assert_eq!(report.records, 1);
        assert_eq!(
            report.per_month,
            vec![MonthCount {
                month: "2024-01".to_string(),
                count: 1
            }]
        );
        assert_eq!(report.technicians[0].installs, 0);
        assert_eq!(report.cross_tab.len(), 1);
        assert_eq!(report.cross_tab[0].equipment_type, None);
    }
}
