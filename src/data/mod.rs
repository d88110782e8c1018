/// Data layer: core types, loading, typing and filtering.
///
/// Architecture:
/// ```text
///  .csv / .xlsx / .xls bytes
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse bytes → Dataset (sheet picked by the operator)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ classify  │  column → numeric | datetime | categorical | text
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  per-column predicates → filtered copy
///   └──────────┘
/// ```

pub mod classify;
pub mod dates;
pub mod filter;
pub mod loader;
pub mod model;
