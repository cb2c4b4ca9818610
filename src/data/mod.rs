/// Data layer: core types, CSV extraction, and loading strategies.
///
/// Architecture:
/// ```text
///  *_Fluorescence_AS3.csv / *_Absorption_AS0.csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  latin-1 CSV → ColumnTable, wavelength/intensity pairs
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ strategy  │  per-type load / validate / metadata → Measurement
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  session  │  Measurements grouped by aging step and type
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod session;
pub mod strategy;
