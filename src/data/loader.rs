use std::fs::File;
use std::path::Path;

use arrow::array::{Array, AsArray};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use chrono::NaiveDateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{normalize_camera_make, ImageTable, Record, VideoRecord, VideoTable};
use crate::error::DatasetError;

// ---------------------------------------------------------------------------
// Schema constants
// ---------------------------------------------------------------------------

pub const COL_FILE_NAME: &str = "new_file_name";
pub const COL_URL: &str = "full_url";
pub const COL_TIMESTAMP: &str = "timestamp";
pub const COL_CAMERA_MAKE: &str = "camera_make";
pub const COL_CAMERA_MODEL: &str = "camera_model";

/// Columns before this position hold per-file metadata; every column from
/// here on is a category score.
pub const CATEGORY_COLUMN_OFFSET: usize = 15;

/// Prefix of the index columns pandas appends when writing a frame with a
/// non-default index.  Never a category.
pub const PANDAS_INDEX_PREFIX: &str = "__index_level_";

/// EXIF-style capture time used by the image table.
pub const IMAGE_TIMESTAMP_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Capture time format used by the video table.
pub const VIDEO_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the classified image table.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`            – header row, one row per image
/// * `.parquet` / `.pq` – same columns, any scalar types
///
/// Rows whose timestamp does not parse are kept with no timestamp.
pub fn load_image_table(path: &Path) -> Result<ImageTable, DatasetError> {
    let raw = read_raw(path)?;
    let table = image_table_from_raw(raw)?;
    log::info!(
        "Loaded {} images with {} categories from {}",
        table.len(),
        table.categories().len(),
        path.display()
    );
    Ok(table)
}

/// Load the video table (`new_file_name`, `full_url`, `timestamp`).
pub fn load_video_table(path: &Path) -> Result<VideoTable, DatasetError> {
    let raw = read_raw(path)?;
    let table = video_table_from_raw(raw)?;
    log::info!("Loaded {} videos from {}", table.len(), path.display());
    Ok(table)
}

// ---------------------------------------------------------------------------
// RawTable – untyped cells, shared by the CSV and Parquet readers
// ---------------------------------------------------------------------------

/// Header names plus text cells; `None` marks an empty / null cell.
struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    fn column(&self, name: &str) -> Result<usize, DatasetError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
    }
}

fn read_raw(path: &Path) -> Result<RawTable, DatasetError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => read_csv(path),
        "parquet" | "pq" => read_parquet(path),
        other => Err(DatasetError::UnsupportedFormat(other.to_string())),
    }
}

fn open(path: &Path) -> Result<File, DatasetError> {
    File::open(path).map_err(|source| DatasetError::Io {
        path: path.display().to_string(),
        source,
    })
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<RawTable, DatasetError> {
    let mut reader = csv::Reader::from_reader(open(path)?);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(
            record
                .iter()
                .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                .collect(),
        );
    }

    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Every column is cast to UTF-8 so both formats share one row builder.
/// Works with files written by Pandas (`df.to_parquet()`) and Polars; pandas
/// index columns are skipped when the categories are picked out.
fn read_parquet(path: &Path) -> Result<RawTable, DatasetError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(open(path)?)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        let columns = batch
            .columns()
            .iter()
            .map(|col| cast(col, &DataType::Utf8))
            .collect::<Result<Vec<_>, _>>()?;

        for row in 0..batch.num_rows() {
            rows.push(
                columns
                    .iter()
                    .map(|col| {
                        if col.is_null(row) {
                            return None;
                        }
                        let text = col.as_string::<i32>().value(row);
                        (!text.is_empty()).then(|| text.to_string())
                    })
                    .collect(),
            );
        }
    }

    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// Typed row builders
// ---------------------------------------------------------------------------

fn image_table_from_raw(raw: RawTable) -> Result<ImageTable, DatasetError> {
    let name_idx = raw.column(COL_FILE_NAME)?;
    let url_idx = raw.column(COL_URL)?;
    let ts_idx = raw.column(COL_TIMESTAMP)?;
    let make_idx = raw.column(COL_CAMERA_MAKE)?;
    let model_idx = raw.column(COL_CAMERA_MODEL)?;

    let category_cols: Vec<usize> = (CATEGORY_COLUMN_OFFSET..raw.headers.len())
        .filter(|&i| !raw.headers[i].starts_with(PANDAS_INDEX_PREFIX))
        .collect();
    if category_cols.is_empty() {
        return Err(DatasetError::NoCategories(CATEGORY_COLUMN_OFFSET));
    }
    let categories: Vec<String> = category_cols
        .iter()
        .map(|&i| raw.headers[i].clone())
        .collect();

    let mut unparsed = 0usize;
    let mut records = Vec::with_capacity(raw.rows.len());

    for (row_no, row) in raw.rows.iter().enumerate() {
        let raw_ts = cell(row, ts_idx);
        let timestamp = parse_timestamp(raw_ts, IMAGE_TIMESTAMP_FORMAT);
        if raw_ts.is_some() && timestamp.is_none() {
            unparsed += 1;
        }

        let scores = category_cols
            .iter()
            .zip(&categories)
            .map(|(&col, category)| parse_score(cell(row, col), row_no, category))
            .collect::<Result<Vec<_>, _>>()?;

        records.push(Record {
            file_name: cell(row, name_idx).unwrap_or_default().to_string(),
            source_url: cell(row, url_idx).unwrap_or_default().to_string(),
            timestamp,
            camera_make: normalize_camera_make(cell(row, make_idx)).to_string(),
            camera_model: cell(row, model_idx).map(str::to_string),
            scores,
        });
    }

    if unparsed > 0 {
        log::warn!("{unparsed} image timestamps did not match {IMAGE_TIMESTAMP_FORMAT}");
    }

    ImageTable::new(categories, records)
}

fn video_table_from_raw(raw: RawTable) -> Result<VideoTable, DatasetError> {
    let name_idx = raw.column(COL_FILE_NAME)?;
    let url_idx = raw.column(COL_URL)?;
    let ts_idx = raw.column(COL_TIMESTAMP)?;

    let mut unparsed = 0usize;
    let records: Vec<VideoRecord> = raw
        .rows
        .iter()
        .map(|row| {
            let raw_ts = cell(row, ts_idx);
            let timestamp = parse_timestamp(raw_ts, VIDEO_TIMESTAMP_FORMAT);
            if raw_ts.is_some() && timestamp.is_none() {
                unparsed += 1;
            }
            VideoRecord {
                file_name: cell(row, name_idx).unwrap_or_default().to_string(),
                source_url: cell(row, url_idx).unwrap_or_default().to_string(),
                timestamp,
            }
        })
        .collect();

    if unparsed > 0 {
        log::warn!("{unparsed} video timestamps did not match {VIDEO_TIMESTAMP_FORMAT}");
    }

    Ok(VideoTable::new(records))
}

fn cell(row: &[Option<String>], idx: usize) -> Option<&str> {
    row.get(idx).and_then(|c| c.as_deref())
}

/// Parse a timestamp in the fixed `format`; anything else is "absent".
pub fn parse_timestamp(raw: Option<&str>, format: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw?.trim(), format).ok()
}

fn parse_score(raw: Option<&str>, row: usize, category: &str) -> Result<f64, DatasetError> {
    let invalid = || DatasetError::InvalidScore {
        row,
        category: category.to_string(),
        value: raw.unwrap_or_default().to_string(),
    };
    let value: f64 = raw.ok_or_else(invalid)?.trim().parse().map_err(|_| invalid())?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(invalid())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::tempdir;

    use super::*;
    use crate::data::model::OTHER_MAKE;

    /// Header with the five known metadata columns, ten filler columns and
    /// the given categories.
    fn image_header(categories: &[&str]) -> String {
        let mut cols = vec![
            COL_FILE_NAME.to_string(),
            COL_URL.to_string(),
            COL_TIMESTAMP.to_string(),
            COL_CAMERA_MAKE.to_string(),
            COL_CAMERA_MODEL.to_string(),
        ];
        cols.extend((5..CATEGORY_COLUMN_OFFSET).map(|i| format!("meta_{i}")));
        cols.extend(categories.iter().map(|c| c.to_string()));
        cols.join(",")
    }

    fn image_row(name: &str, ts: &str, make: &str, model: &str, scores: &[&str]) -> String {
        let mut cells = vec![
            name.to_string(),
            format!("https://example.org/{name}"),
            ts.to_string(),
            make.to_string(),
            model.to_string(),
        ];
        cells.extend((5..CATEGORY_COLUMN_OFFSET).map(|_| String::new()));
        cells.extend(scores.iter().map(|s| s.to_string()));
        cells.join(",")
    }

    fn write_file(dir: &Path, name: &str, lines: &[String]) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
        path
    }

    #[test]
    fn loads_csv_and_normalizes_fields() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "df.csv",
            &[
                image_header(&["eye", "mask"]),
                image_row("a.jpg", "2011:05:01 10:15:00", "CANON", "EOS 400D", &["0.9", "0.1"]),
                image_row("b.jpg", "not a date", "Acme", "", &["0.2", "0.3"]),
                image_row("c.jpg", "", "", "", &["1", "0"]),
            ],
        );

        let table = load_image_table(&path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.categories(), ["eye", "mask"]);

        let recs = table.records();
        assert_eq!(recs[0].camera_make, "Canon");
        assert_eq!(recs[0].camera_model.as_deref(), Some("EOS 400D"));
        assert_eq!(
            recs[0].timestamp.unwrap().format("%Y-%m-%d %H:%M").to_string(),
            "2011-05-01 10:15"
        );
        // Unparsable and empty timestamps are kept as absent.
        assert_eq!(recs[1].timestamp, None);
        assert_eq!(recs[1].camera_make, OTHER_MAKE);
        assert_eq!(recs[1].camera_model, None);
        assert_eq!(recs[2].timestamp, None);
        assert_eq!(recs[2].camera_make, OTHER_MAKE);
        assert_eq!(recs[2].scores, vec![1.0, 0.0]);
    }

    #[test]
    fn pandas_index_columns_are_not_categories() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "df.csv",
            &[
                image_header(&["eye", "__index_level_0__", "mask"]),
                image_row("a.jpg", "", "", "", &["0.9", "17", "0.1"]),
            ],
        );

        let table = load_image_table(&path).unwrap();
        assert_eq!(table.categories(), ["eye", "mask"]);
        assert_eq!(table.records()[0].scores, vec![0.9, 0.1]);

        let only_index = write_file(
            dir.path(),
            "index_only.csv",
            &[image_header(&["__index_level_0__"])],
        );
        let err = load_image_table(&only_index).unwrap_err();
        assert!(matches!(err, DatasetError::NoCategories(CATEGORY_COLUMN_OFFSET)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_image_table(Path::new("/nonexistent/df.csv")).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = load_image_table(Path::new("table.xlsx")).unwrap_err();
        assert!(matches!(err, DatasetError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    #[test]
    fn missing_required_column_is_reported() {
        let dir = tempdir().unwrap();
        let header = image_header(&["eye"]).replace(COL_URL, "url");
        let path = write_file(dir.path(), "df.csv", &[header]);
        let err = load_image_table(&path).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn(c) if c == COL_URL));
    }

    #[test]
    fn table_without_category_columns_is_rejected() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "df.csv", &[image_header(&[])]);
        let err = load_image_table(&path).unwrap_err();
        assert!(matches!(err, DatasetError::NoCategories(_)));
    }

    #[test]
    fn out_of_range_score_is_rejected_not_clamped() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "df.csv",
            &[
                image_header(&["eye"]),
                image_row("a.jpg", "", "", "", &["0.5"]),
                image_row("b.jpg", "", "", "", &["1.5"]),
            ],
        );
        let err = load_image_table(&path).unwrap_err();
        match err {
            DatasetError::InvalidScore { row, category, value } => {
                assert_eq!(row, 1);
                assert_eq!(category, "eye");
                assert_eq!(value, "1.5");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_score_cell_is_rejected() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "df.csv",
            &[image_header(&["eye"]), image_row("a.jpg", "", "", "", &[""])],
        );
        assert!(matches!(
            load_image_table(&path).unwrap_err(),
            DatasetError::InvalidScore { .. }
        ));
    }

    #[test]
    fn loads_video_csv_with_dashed_timestamps() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "video_data.csv",
            &[
                "new_file_name,full_url,timestamp".to_string(),
                "v1.mp4,https://example.org/v1.mp4,2010-03-04 05:06:07".to_string(),
                "v2.mp4,https://example.org/v2.mp4,2010:03:04 05:06:07".to_string(),
            ],
        );
        let table = load_video_table(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.records()[0].timestamp.is_some());
        assert!(table.records()[1].timestamp.is_none());
    }

    #[test]
    fn loads_parquet_image_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("df.parquet");

        let mut fields = vec![
            Field::new(COL_FILE_NAME, DataType::Utf8, false),
            Field::new(COL_URL, DataType::Utf8, false),
            Field::new(COL_TIMESTAMP, DataType::Utf8, true),
            Field::new(COL_CAMERA_MAKE, DataType::Utf8, true),
            Field::new(COL_CAMERA_MODEL, DataType::Utf8, true),
        ];
        let mut columns: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(vec!["a.jpg", "b.jpg"])),
            Arc::new(StringArray::from(vec![
                "https://example.org/a.jpg",
                "https://example.org/b.jpg",
            ])),
            Arc::new(StringArray::from(vec![Some("2011:05:01 10:00:00"), None])),
            Arc::new(StringArray::from(vec![Some("nikon"), None])),
            Arc::new(StringArray::from(vec![Some("D70"), None])),
        ];
        for i in 5..CATEGORY_COLUMN_OFFSET {
            fields.push(Field::new(format!("meta_{i}"), DataType::Utf8, true));
            columns.push(Arc::new(StringArray::from(vec![None::<&str>, None])));
        }
        fields.push(Field::new("eye", DataType::Float64, false));
        columns.push(Arc::new(Float64Array::from(vec![0.81, 0.125])));
        // Trailing index column as written by pandas for a non-range index.
        fields.push(Field::new("__index_level_0__", DataType::Int64, true));
        columns.push(Arc::new(Int64Array::from(vec![7, 42])));

        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
        let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_image_table(&path).unwrap();
        assert_eq!(table.categories(), ["eye"]);
        let recs = table.records();
        assert_eq!(recs[0].camera_make, "Nikon");
        assert_eq!(recs[0].scores, vec![0.81]);
        assert_eq!(recs[1].scores, vec![0.125]);
        assert!(recs[0].timestamp.is_some());
        assert_eq!(recs[1].timestamp, None);
        assert_eq!(recs[1].camera_model, None);
    }
}
