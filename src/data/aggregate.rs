use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::model::{Record, Timestamped};

/// Number of rows captured on one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// Group rows by the date part of their timestamp and count them.
///
/// The series is sparse: dates with no rows are absent, never zero-filled,
/// and dates are strictly increasing.  Undated rows are skipped, so on a
/// date-filtered subset the counts sum to the subset size.
pub fn count_by_date<'a, T, I>(rows: I) -> Vec<DateCount>
where
    T: Timestamped + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for date in rows.into_iter().filter_map(|row| row.date()) {
        *counts.entry(date).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(date, count)| DateCount { date, count })
        .collect()
}

/// One sparse date series per canonical camera make.
pub fn count_by_date_and_make<'a, I>(rows: I) -> BTreeMap<String, Vec<DateCount>>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut by_make: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
    for row in rows {
        by_make.entry(row.camera_make.as_str()).or_default().push(row);
    }
    by_make
        .into_iter()
        .map(|(make, rows)| (make.to_string(), count_by_date(rows)))
        .collect()
}

/// Sum of the counts in a series.
pub fn total(series: &[DateCount]) -> usize {
    series.iter().map(|dc| dc.count).sum()
}
