use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::DatasetError;

// ---------------------------------------------------------------------------
// Camera make canonicalisation
// ---------------------------------------------------------------------------

/// Label for camera makes that are missing or not in [`CAMERA_MAKES`].
pub const OTHER_MAKE: &str = "Other";

/// Lowercased manufacturer variant → canonical label.
pub const CAMERA_MAKES: &[(&str, &str)] = &[
    ("canon", "Canon"),
    ("olympus", "Olympus"),
    ("nokia", "Nokia"),
    ("sony", "Sony"),
    ("nikon", "Nikon"),
    ("fujifilm", "Fujifilm"),
    ("casio", "Casio"),
    ("hewlett-packard", "HP"),
    ("hp", "HP"),
    ("samsung", "Samsung"),
    ("konica", "Konica"),
    ("panasonic", "Panasonic"),
    ("pentax", "Pentax"),
];

/// Map a free-text EXIF make to its canonical label.
///
/// Matching is on the whole lowercased value; anything unmapped (including a
/// missing make) becomes [`OTHER_MAKE`].
pub fn normalize_camera_make(raw: Option<&str>) -> &'static str {
    let Some(raw) = raw else {
        return OTHER_MAKE;
    };
    let key = raw.trim().to_lowercase();
    CAMERA_MAKES
        .iter()
        .find(|(variant, _)| *variant == key)
        .map(|(_, label)| *label)
        .unwrap_or(OTHER_MAKE)
}

// ---------------------------------------------------------------------------
// Timestamped – shared view over image and video rows
// ---------------------------------------------------------------------------

/// Anything with an optional capture time.  Date filters and aggregation work
/// over this so the image and video tables share one implementation.
pub trait Timestamped {
    fn timestamp(&self) -> Option<NaiveDateTime>;

    /// Calendar date of the timestamp, time of day discarded.
    fn date(&self) -> Option<NaiveDate> {
        self.timestamp().map(|ts| ts.date())
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the image table
// ---------------------------------------------------------------------------

/// A single classified image.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub file_name: String,
    pub source_url: String,
    pub timestamp: Option<NaiveDateTime>,
    /// Canonical label, never empty (see [`normalize_camera_make`]).
    pub camera_make: String,
    pub camera_model: Option<String>,
    /// Scores aligned with [`ImageTable::categories`].
    pub scores: Vec<f64>,
}

impl Record {
    /// Score at a category position obtained from [`ImageTable::category_index`].
    pub fn score(&self, category_idx: usize) -> f64 {
        self.scores[category_idx]
    }

    /// Name → score view of this record's scores.
    pub fn category_scores<'a>(&'a self, table: &'a ImageTable) -> BTreeMap<&'a str, f64> {
        table
            .categories
            .iter()
            .map(String::as_str)
            .zip(self.scores.iter().copied())
            .collect()
    }
}

impl Timestamped for Record {
    fn timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamp
    }
}

// ---------------------------------------------------------------------------
// VideoRecord – one row of the video table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct VideoRecord {
    pub file_name: String,
    pub source_url: String,
    pub timestamp: Option<NaiveDateTime>,
}

impl Timestamped for VideoRecord {
    fn timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamp
    }
}

// ---------------------------------------------------------------------------
// ImageTable – the complete loaded image dataset
// ---------------------------------------------------------------------------

/// The loaded image table.  Immutable after construction; filters borrow it
/// and return row positions into [`ImageTable::records`].
#[derive(Debug, Clone)]
pub struct ImageTable {
    /// Category names in file column order.
    categories: Vec<String>,
    records: Vec<Record>,
}

impl ImageTable {
    /// Build a table, checking that every record carries one valid score per
    /// category.
    pub fn new(categories: Vec<String>, records: Vec<Record>) -> Result<Self, DatasetError> {
        for (row, rec) in records.iter().enumerate() {
            if rec.scores.len() != categories.len() {
                return Err(DatasetError::SchemaMismatch {
                    row,
                    expected: categories.len(),
                    found: rec.scores.len(),
                });
            }
            for (category, &score) in categories.iter().zip(&rec.scores) {
                if !(0.0..=1.0).contains(&score) {
                    return Err(DatasetError::InvalidScore {
                        row,
                        category: category.clone(),
                        value: score.to_string(),
                    });
                }
            }
        }
        Ok(Self {
            categories,
            records,
        })
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Category names sorted alphabetically, as offered in the category picker.
    pub fn sorted_categories(&self) -> Vec<String> {
        let mut sorted = self.categories.clone();
        sorted.sort();
        sorted
    }

    /// Position of `category` in the schema.
    pub fn category_index(&self, category: &str) -> Option<usize> {
        self.categories.iter().position(|c| c == category)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Resolve row positions (as returned by the filters) to records.
    pub fn select<'a>(&'a self, rows: &[usize]) -> Vec<&'a Record> {
        rows.iter().map(|&i| &self.records[i]).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// VideoTable
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct VideoTable {
    records: Vec<VideoRecord>,
}

impl VideoTable {
    pub fn new(records: Vec<VideoRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[VideoRecord] {
        &self.records
    }

    pub fn select<'a>(&'a self, rows: &[usize]) -> Vec<&'a VideoRecord> {
        rows.iter().map(|&i| &self.records[i]).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
