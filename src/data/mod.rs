/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///   df.csv / df.parquet      video_data.csv
///        │                        │
///        ▼                        ▼
///   ┌──────────┐
///   │  loader   │  parse file → ImageTable / VideoTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  threshold or date/camera predicate → row positions
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  rows → sparse date → count series
///   └───────────┘
/// ```
pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
