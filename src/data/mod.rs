/// Data layer: survey records, loading, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet / .xlsx
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → SurveyDataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ SurveyDataset │  Vec<SurveyRecord>, baseline index, filter options
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  selection → visible row indices + page size
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
