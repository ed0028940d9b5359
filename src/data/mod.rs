/// Data layer: core types, loading, cleaning, ordering and export.
///
/// Architecture:
/// ```text
///  .csv / .xlsx / .xls
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ cleaner   │  normalize names, trim text, coerce numbers
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐   ┌──────────┐   ┌──────────┐
///   │  filter   │ → │  sorter   │ → │  ranker   │  each returns a new Dataset
///   └──────────┘   └──────────┘   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ exporter  │  Dataset → .xlsx / .csv
///   └──────────┘
/// ```

pub mod cleaner;
pub mod exporter;
pub mod filter;
pub mod loader;
pub mod model;
pub mod ranker;
pub mod sorter;
