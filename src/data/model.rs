use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpectraError};

// ---------------------------------------------------------------------------
// MetadataValue – a single metadata cell
// ---------------------------------------------------------------------------

/// A metadata value read off a file name or stamped at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    /// ISO-8601 date string kept as text.
    Date(String),
}

impl MetadataValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) | MetadataValue::Date(s) => Some(s),
            MetadataValue::Integer(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetadataValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

/// Metadata attached to measurements, keyed by field name.
pub type Metadata = BTreeMap<String, MetadataValue>;

// ---------------------------------------------------------------------------
// SpectroscopyType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectroscopyType {
    Fluorescence,
    Absorption,
    Raman,
}

impl SpectroscopyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fluorescence => "fluorescence",
            Self::Absorption => "absorption",
            Self::Raman => "raman",
        }
    }
}

impl fmt::Display for SpectroscopyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpectroscopyType {
    type Err = SpectraError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fluorescence" => Ok(Self::Fluorescence),
            "absorption" => Ok(Self::Absorption),
            "raman" => Ok(Self::Raman),
            other => Err(SpectraError::UnsupportedSpectroscopyType(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// SpectralData – one wavelength/intensity scan
// ---------------------------------------------------------------------------

/// Intensity normalization applied by [`SpectralData::normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
    /// `(x - min) / (max - min)`
    MinMax,
    /// `(x - mean) / std` with the population standard deviation.
    ZScore,
}

/// Paired wavelength/intensity arrays from a single scan.
///
/// Both arrays always have the same, non-zero length; the only way to build
/// one is [`SpectralData::new`], which enforces that.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralData {
    wavelengths: Vec<f64>,
    intensities: Vec<f64>,
    spectroscopy_type: SpectroscopyType,
    excitation_wavelength: Option<f64>,
    emission_wavelength: Option<f64>,
    measurement_conditions: Option<Metadata>,
}

impl SpectralData {
    pub fn new(
        wavelengths: Vec<f64>,
        intensities: Vec<f64>,
        spectroscopy_type: SpectroscopyType,
    ) -> Result<Self> {
        if wavelengths.len() != intensities.len() {
            return Err(SpectraError::LengthMismatch {
                wavelengths: wavelengths.len(),
                intensities: intensities.len(),
            });
        }
        if wavelengths.is_empty() {
            return Err(SpectraError::EmptySpectralData);
        }
        Ok(Self {
            wavelengths,
            intensities,
            spectroscopy_type,
            excitation_wavelength: None,
            emission_wavelength: None,
            measurement_conditions: None,
        })
    }

    pub fn with_excitation(mut self, nm: f64) -> Self {
        self.excitation_wavelength = Some(nm);
        self
    }

    pub fn with_emission(mut self, nm: f64) -> Self {
        self.emission_wavelength = Some(nm);
        self
    }

    pub fn with_conditions(mut self, conditions: Metadata) -> Self {
        self.measurement_conditions = Some(conditions);
        self
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn intensities(&self) -> &[f64] {
        &self.intensities
    }

    pub fn spectroscopy_type(&self) -> SpectroscopyType {
        self.spectroscopy_type
    }

    pub fn excitation_wavelength(&self) -> Option<f64> {
        self.excitation_wavelength
    }

    pub fn emission_wavelength(&self) -> Option<f64> {
        self.emission_wavelength
    }

    pub fn measurement_conditions(&self) -> Option<&Metadata> {
        self.measurement_conditions.as_ref()
    }

    /// `(min, max)` of the wavelength axis.
    pub fn wavelength_range(&self) -> (f64, f64) {
        min_max(&self.wavelengths)
    }

    /// `(min, max)` of the intensities.
    pub fn intensity_range(&self) -> (f64, f64) {
        min_max(&self.intensities)
    }

    pub fn data_points(&self) -> usize {
        self.wavelengths.len()
    }

    /// Return a copy with normalized intensities. Fails when every intensity
    /// is the same, since the result would be undefined.
    pub fn normalize(&self, method: Normalization) -> Result<Self> {
        let intensities = match method {
            Normalization::MinMax => {
                let (min, max) = self.intensity_range();
                let spread = max - min;
                if spread == 0.0 {
                    return Err(SpectraError::ZeroSpread);
                }
                self.intensities.iter().map(|v| (v - min) / spread).collect()
            }
            Normalization::ZScore => {
                let n = self.intensities.len() as f64;
                let mean = self.intensities.iter().sum::<f64>() / n;
                let variance = self
                    .intensities
                    .iter()
                    .map(|v| (v - mean).powi(2))
                    .sum::<f64>()
                    / n;
                let std = variance.sqrt();
                if std == 0.0 {
                    return Err(SpectraError::ZeroSpread);
                }
                self.intensities.iter().map(|v| (v - mean) / std).collect()
            }
        };
        Ok(Self {
            intensities,
            ..self.clone()
        })
    }
}

fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

// ---------------------------------------------------------------------------
// Spectrum – a named scan within a measurement
// ---------------------------------------------------------------------------

/// A single spectrum measurement with its identifying metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub spectral_data: SpectralData,
    pub measurement_name: String,
    /// Aging step value (0–9).
    pub aging_step: Option<u8>,
    pub sample_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Spectrum {
    pub fn new(spectral_data: SpectralData, measurement_name: impl Into<String>) -> Self {
        Self {
            spectral_data,
            measurement_name: measurement_name.into(),
            aging_step: None,
            sample_id: None,
            timestamp: None,
        }
    }

    pub fn wavelengths(&self) -> &[f64] {
        self.spectral_data.wavelengths()
    }

    pub fn intensities(&self) -> &[f64] {
        self.spectral_data.intensities()
    }

    pub fn spectroscopy_type(&self) -> SpectroscopyType {
        self.spectral_data.spectroscopy_type()
    }
}

// ---------------------------------------------------------------------------
// AgingStep
// ---------------------------------------------------------------------------

/// Discrete time-point of an oil-aging experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum AgingStep {
    #[default]
    Step0,
    Step1,
    Step2,
    Step3,
    Step4,
    Step5,
    Step6,
    Step7,
    Step8,
    Step9,
}

impl AgingStep {
    pub const ALL: [AgingStep; 10] = [
        Self::Step0,
        Self::Step1,
        Self::Step2,
        Self::Step3,
        Self::Step4,
        Self::Step5,
        Self::Step6,
        Self::Step7,
        Self::Step8,
        Self::Step9,
    ];

    pub fn value(&self) -> u8 {
        *self as u8
    }

    pub fn from_value(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }
}

impl fmt::Display for AgingStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AS{}", self.value())
    }
}

// ---------------------------------------------------------------------------
// Measurement – all spectra read from one file
// ---------------------------------------------------------------------------

/// A measurement session: one or more spectra of a single spectroscopy type.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    measurement_id: String,
    aging_step: AgingStep,
    spectroscopy_type: SpectroscopyType,
    spectra: Vec<Spectrum>,
    metadata: Option<Metadata>,
    timestamp: Option<DateTime<Utc>>,
}

impl Measurement {
    pub fn new(
        measurement_id: impl Into<String>,
        aging_step: AgingStep,
        spectroscopy_type: SpectroscopyType,
        spectra: Vec<Spectrum>,
    ) -> Result<Self> {
        if spectra.is_empty() {
            return Err(SpectraError::EmptyMeasurement);
        }
        if let Some(odd) = spectra
            .iter()
            .find(|s| s.spectroscopy_type() != spectroscopy_type)
        {
            return Err(SpectraError::MixedSpectroscopyType {
                name: odd.measurement_name.clone(),
                expected: spectroscopy_type,
                found: odd.spectroscopy_type(),
            });
        }
        Ok(Self {
            measurement_id: measurement_id.into(),
            aging_step,
            spectroscopy_type,
            spectra,
            metadata: None,
            timestamp: None,
        })
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn measurement_id(&self) -> &str {
        &self.measurement_id
    }

    pub fn aging_step(&self) -> AgingStep {
        self.aging_step
    }

    pub fn spectroscopy_type(&self) -> SpectroscopyType {
        self.spectroscopy_type
    }

    pub fn spectra(&self) -> &[Spectrum] {
        &self.spectra
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn spectrum_count(&self) -> usize {
        self.spectra.len()
    }

    pub fn spectrum_by_name(&self, name: &str) -> Option<&Spectrum> {
        self.spectra.iter().find(|s| s.measurement_name == name)
    }

    /// Spectra recorded at exactly this excitation wavelength.
    pub fn spectra_by_excitation(&self, excitation_nm: f64) -> Vec<&Spectrum> {
        self.spectra
            .iter()
            .filter(|s| s.spectral_data.excitation_wavelength() == Some(excitation_nm))
            .collect()
    }
}
