use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::model::{ImageTable, Timestamped};
use crate::error::FilterError;

// ---------------------------------------------------------------------------
// Threshold filter
// ---------------------------------------------------------------------------

/// Return positions of images whose score for `category` is at least
/// `threshold`, in table order.
///
/// Fails when the category is not part of the table schema or the threshold
/// lies outside `[0, 1]`; neither is turned into an empty result.
pub fn filter_by_category(
    table: &ImageTable,
    category: &str,
    threshold: f64,
) -> Result<Vec<usize>, FilterError> {
    let idx = table
        .category_index(category)
        .ok_or_else(|| FilterError::UnknownCategory(category.to_string()))?;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(FilterError::ThresholdOutOfRange(threshold));
    }

    Ok(table
        .records()
        .iter()
        .enumerate()
        .filter(|(_, rec)| rec.score(idx) >= threshold)
        .map(|(i, _)| i)
        .collect())
}

// ---------------------------------------------------------------------------
// Date range / camera filter
// ---------------------------------------------------------------------------

/// Return positions of dated rows with `start <= date <= end`.
/// An inverted range selects nothing.
pub fn filter_by_date<T: Timestamped>(records: &[T], start: NaiveDate, end: NaiveDate) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, rec)| in_range(rec.date(), start, end))
        .map(|(i, _)| i)
        .collect()
}

/// Date range filter with optional camera constraints.
///
/// * Rows without a timestamp never match.
/// * An empty `camera_makes` / `camera_models` set means "no constraint".
/// * A row without a camera model fails a non-empty model constraint.
pub fn filter_by_date_and_camera(
    table: &ImageTable,
    start: NaiveDate,
    end: NaiveDate,
    camera_makes: &BTreeSet<String>,
    camera_models: &BTreeSet<String>,
) -> Vec<usize> {
    table
        .records()
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            if !in_range(rec.date(), start, end) {
                return false;
            }
            if !camera_makes.is_empty() && !camera_makes.contains(&rec.camera_make) {
                return false;
            }
            if !camera_models.is_empty() {
                match &rec.camera_model {
                    Some(model) => camera_models.contains(model),
                    None => false,
                }
            } else {
                true
            }
        })
        .map(|(i, _)| i)
        .collect()
}

fn in_range(date: Option<NaiveDate>, start: NaiveDate, end: NaiveDate) -> bool {
    matches!(date, Some(d) if start <= d && d <= end)
}

// ---------------------------------------------------------------------------
// Choice helpers for the filter widgets
// ---------------------------------------------------------------------------

/// Canonical camera makes present among dated images.
pub fn camera_make_options(table: &ImageTable) -> BTreeSet<String> {
    table
        .records()
        .iter()
        .filter(|rec| rec.timestamp.is_some())
        .map(|rec| rec.camera_make.clone())
        .collect()
}

/// Camera models present in `rows`.  Called with the make-filtered subset so
/// the model choices follow the selected makes.
pub fn camera_model_options(table: &ImageTable, rows: &[usize]) -> BTreeSet<String> {
    rows.iter()
        .filter_map(|&i| table.records()[i].camera_model.clone())
        .collect()
}

/// Earliest and latest calendar date among dated rows.
pub fn date_bounds<T: Timestamped>(records: &[T]) -> Option<(NaiveDate, NaiveDate)> {
    records.iter().filter_map(|rec| rec.date()).fold(None, |acc, d| match acc {
        None => Some((d, d)),
        Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::data::model::{Record, VideoRecord};

    fn ts(s: &str) -> Option<NaiveDateTime> {
        Some(NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap())
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn image(name: &str, eye: f64) -> Record {
        Record {
            file_name: name.to_string(),
            source_url: format!("https://example.org/{name}"),
            timestamp: None,
            camera_make: "Other".to_string(),
            camera_model: None,
            scores: vec![eye],
        }
    }

    fn dated(name: &str, when: &str, make: &str, model: Option<&str>) -> Record {
        Record {
            timestamp: ts(when),
            camera_make: make.to_string(),
            camera_model: model.map(str::to_string),
            ..image(name, 0.0)
        }
    }

    fn eye_table(scores: &[f64]) -> ImageTable {
        let records = scores
            .iter()
            .enumerate()
            .map(|(i, &s)| image(&format!("img_{i}.jpg"), s))
            .collect();
        ImageTable::new(vec!["eye".to_string()], records).unwrap()
    }

    fn camera_table() -> ImageTable {
        let records = vec![
            dated("a.jpg", "2011-05-01 08:00:00", "Canon", Some("EOS")),
            image("undated.jpg", 0.0),
            dated("b.jpg", "2011-05-02 23:59:59", "Sony", Some("DSC")),
            dated("c.jpg", "2011-05-03 00:00:00", "Canon", None),
            dated("d.jpg", "2011-05-04 12:00:00", "Other", Some("X1")),
        ];
        ImageTable::new(vec!["eye".to_string()], records).unwrap()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn threshold_is_inclusive_and_keeps_order() {
        let table = eye_table(&[0.1, 0.5, 0.8, 0.81, 1.0]);
        let rows = filter_by_category(&table, "eye", 0.8).unwrap();
        assert_eq!(rows, vec![2, 3, 4]);
        let names: Vec<_> = table.select(&rows).iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, ["img_2.jpg", "img_3.jpg", "img_4.jpg"]);
    }

    #[test]
    fn raising_threshold_never_adds_rows() {
        let table = eye_table(&[0.0, 0.05, 0.33, 0.5, 0.5, 0.77, 0.99, 1.0]);
        let mut previous = filter_by_category(&table, "eye", 0.0).unwrap();
        assert_eq!(previous.len(), table.len());
        for step in 1..=100 {
            let t = step as f64 / 100.0;
            let rows = filter_by_category(&table, "eye", t).unwrap();
            assert!(rows.iter().all(|r| previous.contains(r)), "t = {t}");
            for (i, rec) in table.records().iter().enumerate() {
                assert_eq!(rows.contains(&i), rec.score(0) >= t);
            }
            previous = rows;
        }
    }

    #[test]
    fn unknown_category_is_an_error() {
        let table = eye_table(&[0.9]);
        assert_eq!(
            filter_by_category(&table, "mask", 0.5),
            Err(FilterError::UnknownCategory("mask".to_string()))
        );
    }

    #[test]
    fn threshold_outside_unit_interval_is_rejected() {
        let table = eye_table(&[0.9]);
        assert_eq!(
            filter_by_category(&table, "eye", 1.01),
            Err(FilterError::ThresholdOutOfRange(1.01))
        );
        assert!(filter_by_category(&table, "eye", -0.1).is_err());
        assert!(filter_by_category(&table, "eye", f64::NAN).is_err());
    }

    #[test]
    fn date_range_is_inclusive_and_skips_undated() {
        let table = camera_table();
        let none = BTreeSet::new();
        let rows = filter_by_date_and_camera(&table, date("2011-05-02"), date("2011-05-03"), &none, &none);
        assert_eq!(rows, vec![2, 3]);

        let all = filter_by_date_and_camera(&table, date("2000-01-01"), date("2020-01-01"), &none, &none);
        assert_eq!(all, vec![0, 2, 3, 4]);
        for &i in &all {
            assert!(table.records()[i].timestamp.is_some());
        }
    }

    #[test]
    fn inverted_range_is_empty() {
        let table = camera_table();
        let none = BTreeSet::new();
        let rows = filter_by_date_and_camera(&table, date("2011-05-04"), date("2011-05-01"), &none, &none);
        assert!(rows.is_empty());
        assert!(filter_by_date(table.records(), date("2011-05-04"), date("2011-05-01")).is_empty());
    }

    #[test]
    fn camera_makes_and_models_narrow_the_result() {
        let table = camera_table();
        let (start, end) = (date("2011-01-01"), date("2011-12-31"));

        let canon = filter_by_date_and_camera(&table, start, end, &set(&["Canon"]), &BTreeSet::new());
        assert_eq!(canon, vec![0, 3]);
        assert_eq!(camera_model_options(&table, &canon), set(&["EOS"]));

        let eos = filter_by_date_and_camera(&table, start, end, &set(&["Canon"]), &set(&["EOS"]));
        assert_eq!(eos, vec![0]);

        let mixed = filter_by_date_and_camera(&table, start, end, &set(&["Canon", "Sony"]), &BTreeSet::new());
        assert_eq!(mixed, vec![0, 2, 3]);
    }

    #[test]
    fn option_helpers_reflect_dated_rows() {
        let table = camera_table();
        assert_eq!(camera_make_options(&table), set(&["Canon", "Other", "Sony"]));
        assert_eq!(
            date_bounds(table.records()),
            Some((date("2011-05-01"), date("2011-05-04")))
        );
        assert_eq!(date_bounds::<Record>(&[]), None);
    }

    #[test]
    fn video_rows_share_the_date_filter() {
        let videos = vec![
            VideoRecord {
                file_name: "v1.mp4".into(),
                source_url: "https://example.org/v1.mp4".into(),
                timestamp: ts("2009-01-01 00:00:00"),
            },
            VideoRecord {
                file_name: "v2.mp4".into(),
                source_url: "https://example.org/v2.mp4".into(),
                timestamp: None,
            },
        ];
        assert_eq!(filter_by_date(&videos, date("2009-01-01"), date("2009-01-01")), vec![0]);
    }
}
