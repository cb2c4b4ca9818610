//! Olive-oil spectroscopy: spectral data model, CSV spectrum loading and
//! quality scoring.

pub mod config;
pub mod data;
pub mod error;
pub mod quality;

pub use config::LoaderConfig;
pub use data::model::{AgingStep, Measurement, SpectralData, SpectroscopyType, Spectrum};
pub use data::session::ExperimentSession;
pub use data::strategy::{LoadingStrategy, StrategyKind, StrategyRegistry};
pub use error::SpectraError;
pub use quality::{QualityGrade, QualityMetrics, QualityThreshold};
