//! Browse classified image and video metadata from the Abbottabad compound
//! release: load the tables, filter by category score or by date and camera,
//! count captures per day and fetch the matching assets.

pub mod config;
pub mod data;
pub mod error;
pub mod fetch;

pub use data::aggregate::{count_by_date, count_by_date_and_make, DateCount};
pub use data::filter::{filter_by_category, filter_by_date, filter_by_date_and_camera};
pub use data::loader::{load_image_table, load_video_table};
pub use data::model::{normalize_camera_make, ImageTable, Record, Timestamped, VideoRecord, VideoTable};
pub use error::{ConfigError, DatasetError, FetchCause, FetchFailure, FilterError};
pub use fetch::{Asset, AssetFetcher, AssetKind};
