//! Write a small synthetic dataset under `data/`: the image table as CSV and
//! Parquet, and the video table as CSV.  Asset URLs point at picsum.photos so
//! the gallery has something to fetch.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use parquet::arrow::ArrowWriter;

const METADATA_COLUMNS: [&str; 15] = [
    "new_file_name",
    "full_url",
    "timestamp",
    "camera_make",
    "camera_model",
    "original_file_name",
    "folder",
    "extension",
    "file_size",
    "width",
    "height",
    "mode",
    "software",
    "orientation",
    "flash",
];

const CATEGORIES: [&str; 6] = ["disaster", "eye", "flag", "mask", "statue", "weapon"];

const CAMERAS: [(&str, &[&str]); 6] = [
    ("Canon", &["Canon PowerShot A470", "Canon EOS 400D"]),
    ("SONY", &["DSC-W120", "DSC-H10"]),
    ("NIKON CORPORATION", &["COOLPIX S210"]),
    ("Samsung Techwin", &["Digimax S600"]),
    ("Nokia", &["N95"]),
    ("Acme Optics", &["X1"]),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Skewed towards 0 so high scores stay rare, like real CLIP output.
    fn score(&mut self) -> f64 {
        let v = self.next_f64().powi(3);
        (v * 1000.0).round() / 1000.0
    }
}

/// One generated image row.
struct ImageRow {
    file_name: String,
    url: String,
    timestamp: Option<String>,
    make: Option<String>,
    model: Option<String>,
    scores: Vec<f64>,
}

fn capture_time(rng: &mut SimpleRng, origin: NaiveDateTime, days: i64) -> NaiveDateTime {
    origin
        + Duration::days(rng.below(days as usize) as i64)
        + Duration::seconds(rng.below(86_400) as i64)
}

fn generate_images(rng: &mut SimpleRng, n: usize) -> anyhow::Result<Vec<ImageRow>> {
    let origin = NaiveDate::from_ymd_opt(2009, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid origin date")?;

    let rows = (0..n)
        .map(|i| {
            // Roughly a third of the images carry no EXIF data at all.
            let dated = rng.below(3) != 0;
            let (timestamp, make, model) = if dated {
                let ts = capture_time(rng, origin, 800);
                let (make, models) = CAMERAS[rng.below(CAMERAS.len())];
                let model = (rng.below(5) != 0).then(|| models[rng.below(models.len())].to_string());
                (
                    Some(ts.format("%Y:%m:%d %H:%M:%S").to_string()),
                    Some(make.to_string()),
                    model,
                )
            } else {
                (None, None, None)
            };
            ImageRow {
                file_name: format!("image_{i:05}.jpg"),
                url: format!("https://picsum.photos/seed/compound{i}/480/320.jpg"),
                timestamp,
                make,
                model,
                scores: CATEGORIES.iter().map(|_| rng.score()).collect(),
            }
        })
        .collect();
    Ok(rows)
}

fn image_header() -> Vec<String> {
    METADATA_COLUMNS
        .iter()
        .chain(CATEGORIES.iter())
        .map(|s| s.to_string())
        .collect()
}

/// Metadata cells after the five the explorer reads.
fn filler(row: &ImageRow) -> [String; 10] {
    [
        row.file_name.to_uppercase(),
        "images".to_string(),
        "jpg".to_string(),
        "102400".to_string(),
        "480".to_string(),
        "320".to_string(),
        "RGB".to_string(),
        String::new(),
        "1".to_string(),
        "0".to_string(),
    ]
}

fn write_image_csv(path: &Path, rows: &[ImageRow]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(image_header())?;
    for row in rows {
        let mut cells = vec![
            row.file_name.clone(),
            row.url.clone(),
            row.timestamp.clone().unwrap_or_default(),
            row.make.clone().unwrap_or_default(),
            row.model.clone().unwrap_or_default(),
        ];
        cells.extend(filler(row));
        cells.extend(row.scores.iter().map(|s| s.to_string()));
        writer.write_record(&cells)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_image_parquet(path: &Path, rows: &[ImageRow]) -> anyhow::Result<()> {
    let header = image_header();
    let mut fields = Vec::with_capacity(header.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(header.len());

    let text = |f: &dyn Fn(&ImageRow) -> Option<String>| -> ArrayRef {
        Arc::new(rows.iter().map(f).collect::<StringArray>())
    };
    let metadata: Vec<ArrayRef> = vec![
        text(&|r: &ImageRow| Some(r.file_name.clone())),
        text(&|r: &ImageRow| Some(r.url.clone())),
        text(&|r: &ImageRow| r.timestamp.clone()),
        text(&|r: &ImageRow| r.make.clone()),
        text(&|r: &ImageRow| r.model.clone()),
    ];
    for (name, column) in METADATA_COLUMNS.iter().zip(metadata) {
        fields.push(Field::new(*name, DataType::Utf8, true));
        columns.push(column);
    }
    for (offset, name) in METADATA_COLUMNS[5..].iter().enumerate() {
        fields.push(Field::new(*name, DataType::Utf8, true));
        columns.push(text(&|r: &ImageRow| Some(filler(r)[offset].clone())));
    }
    for (idx, name) in CATEGORIES.iter().enumerate() {
        fields.push(Field::new(*name, DataType::Float64, false));
        columns.push(Arc::new(Float64Array::from_iter_values(
            rows.iter().map(|r| r.scores[idx]),
        )));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns)?;
    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn write_video_csv(path: &Path, rng: &mut SimpleRng, n: usize) -> anyhow::Result<()> {
    let origin = NaiveDate::from_ymd_opt(2010, 6, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .context("invalid origin date")?;

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["new_file_name", "full_url", "timestamp"])?;
    for i in 0..n {
        let ts = (rng.below(6) != 0)
            .then(|| capture_time(rng, origin, 300).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        writer.write_record([
            format!("video_{i:04}.mp4"),
            format!("https://download.samplelib.com/mp4/sample-{}s.mp4", 5 + 5 * (i % 4)),
            ts,
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let mut rng = SimpleRng::new(42);
    let out = Path::new("data");
    fs::create_dir_all(out).context("creating data directory")?;

    let images = generate_images(&mut rng, 600)?;
    write_image_csv(&out.join("df.csv"), &images)?;
    write_image_parquet(&out.join("df.parquet"), &images)?;
    write_video_csv(&out.join("video_data.csv"), &mut rng, 40)?;

    println!(
        "Wrote {} images ({} categories) and 40 videos to {}",
        images.len(),
        CATEGORIES.len(),
        out.display()
    );
    Ok(())
}
