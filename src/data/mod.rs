/// Data layer: table model, ingestion, smoothing and export.
///
/// Architecture:
/// ```text
///  .xlsx / .csv bytes
///        │
///        ▼
///   ┌───────────┐
///   │  loader   │  decode sheet, canonical rename → WideTable
///   └───────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ pipeline  │  pairing + smoother per (Temperature, CTE) pair
///   └───────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌───────────┐   ┌───────────┐
///   │  export   │   │  figure   │  raw vs smoothed series for plots
///   └───────────┘   └───────────┘
///  two-row header
///  .xlsx / .csv
/// ```

pub mod error;
pub mod export;
pub mod figure;
pub mod interpolation;
pub mod loader;
pub mod model;
pub mod pairing;
pub mod pipeline;
pub mod smoother;
