use thiserror::Error;

use crate::data::model::SpectroscopyType;

/// Failures surfaced by the domain model and the loading strategies.
#[derive(Debug, Error, PartialEq)]
pub enum SpectraError {
    #[error("{wavelengths} wavelengths but {intensities} intensities; lengths must match")]
    LengthMismatch { wavelengths: usize, intensities: usize },

    #[error("spectral data cannot be empty")]
    EmptySpectralData,

    #[error("measurement must contain at least one spectrum")]
    EmptyMeasurement,

    #[error("spectrum '{name}' is {found}, measurement is {expected}")]
    MixedSpectroscopyType {
        name: String,
        expected: SpectroscopyType,
        found: SpectroscopyType,
    },

    #[error("unsupported spectroscopy type: {0}")]
    UnsupportedSpectroscopyType(String),

    #[error("column pair starting at {column} out of bounds ({columns} columns)")]
    ColumnOutOfBounds { column: usize, columns: usize },

    #[error("column '{header}', row {row}: '{value}' is not a number")]
    InvalidNumber {
        header: String,
        row: usize,
        value: String,
    },

    #[error("cannot normalize: intensity spread is zero")]
    ZeroSpread,
}

pub type Result<T> = std::result::Result<T, SpectraError>;
