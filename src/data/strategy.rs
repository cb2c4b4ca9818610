use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};

use super::loader::{self, ColumnTable};
use super::model::{
    Measurement, Metadata, MetadataValue, SpectralData, SpectroscopyType, Spectrum,
};
use crate::config::{LoaderConfig, WavelengthWindow};
use crate::error::{Result, SpectraError};

// ---------------------------------------------------------------------------
// StrategyKind – the loading behaviours that exist
// ---------------------------------------------------------------------------

/// How a file is read and checked. Each variant selects one row of the
/// behaviour table below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Fluorescence,
    Absorption,
}

impl StrategyKind {
    fn window(self, config: &LoaderConfig) -> WavelengthWindow {
        match self {
            Self::Fluorescence => config.fluorescence_window,
            Self::Absorption => config.absorption_window,
        }
    }

    fn reads_excitation(self) -> bool {
        matches!(self, Self::Fluorescence)
    }

    fn describes_file_name(self) -> bool {
        matches!(self, Self::Fluorescence)
    }
}

// ---------------------------------------------------------------------------
// LoadingStrategy – a kind bound to a spectroscopy type and configuration
// ---------------------------------------------------------------------------

/// Loads one spectroscopy file into [`SpectralData`] records and wraps them
/// into a [`Measurement`].
#[derive(Debug, Clone, Copy)]
pub struct LoadingStrategy<'a> {
    kind: StrategyKind,
    spectroscopy_type: SpectroscopyType,
    config: &'a LoaderConfig,
}

impl<'a> LoadingStrategy<'a> {
    pub fn new(
        kind: StrategyKind,
        spectroscopy_type: SpectroscopyType,
        config: &'a LoaderConfig,
    ) -> Self {
        Self {
            kind,
            spectroscopy_type,
            config,
        }
    }

    pub fn kind(&self) -> StrategyKind {
        self.kind
    }

    pub fn spectroscopy_type(&self) -> SpectroscopyType {
        self.spectroscopy_type
    }

    /// Read every wavelength/intensity column pair of `path`.
    ///
    /// A pair that fails to parse is logged and skipped. A file that cannot
    /// be read at all is logged and yields no data.
    pub fn load_data(&self, path: &Path) -> Vec<SpectralData> {
        match ColumnTable::from_path(path) {
            Ok(table) => self.load_table(&table),
            Err(e) => {
                error!(
                    "Error loading {} file {}: {e:#}",
                    self.spectroscopy_type,
                    path.display()
                );
                Vec::new()
            }
        }
    }

    /// Same as [`load_data`](Self::load_data) on an already-read table.
    pub fn load_table(&self, table: &ColumnTable) -> Vec<SpectralData> {
        let mut out = Vec::new();

        for col in table.pair_starts() {
            let (wavelengths, intensities) = match table.extract_pair(col) {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("Error extracting spectrum from columns {}-{}: {e}", col, col + 1);
                    continue;
                }
            };
            if wavelengths.is_empty() {
                debug!("Columns {}-{} hold no complete rows", col, col + 1);
                continue;
            }

            let data = match SpectralData::new(wavelengths, intensities, self.spectroscopy_type) {
                Ok(data) => data,
                Err(e) => {
                    warn!("Error extracting spectrum from columns {}-{}: {e}", col, col + 1);
                    continue;
                }
            };

            let data = if self.kind.reads_excitation() {
                data.with_excitation(loader::excitation_from_header(
                    &table.headers()[col],
                    &self.config.excitation_marker,
                    self.config.default_excitation_nm,
                ))
            } else {
                data
            };
            out.push(data);
        }

        out
    }

    /// Describe the file the data came from.
    pub fn extract_metadata(&self, path: &Path) -> Metadata {
        self.metadata_at(path, Utc::now())
    }

    fn metadata_at(&self, path: &Path, now: DateTime<Utc>) -> Metadata {
        let file_name = loader::file_name(path);
        let mut meta = Metadata::new();
        meta.insert(
            "file_path".into(),
            MetadataValue::String(path.display().to_string()),
        );
        meta.insert("file_name".into(), MetadataValue::String(file_name.clone()));
        meta.insert(
            "spectroscopy_type".into(),
            MetadataValue::String(self.spectroscopy_type.as_str().to_string()),
        );
        meta.insert("timestamp".into(), MetadataValue::Date(now.to_rfc3339()));

        if self.kind.describes_file_name() {
            let aging_step = loader::aging_step_from_file_name(&file_name);
            meta.insert(
                "aging_step".into(),
                MetadataValue::Integer(aging_step.value().into()),
            );
            // <date>_<time>_<sample code>_...
            let parts: Vec<&str> = file_name.split('_').collect();
            if parts.len() >= 3 {
                for (key, part) in ["date", "time", "sample_code"].into_iter().zip(parts) {
                    meta.insert(key.into(), MetadataValue::String(part.to_string()));
                }
            }
        }

        meta
    }

    /// Log advisory warnings for out-of-window ranges and bad intensities.
    /// Only an empty list is invalid.
    pub fn validate_data(&self, data: &[SpectralData]) -> bool {
        if data.is_empty() {
            return false;
        }

        let window = self.kind.window(self.config);
        let label = self.spectroscopy_type.as_str();
        for spectrum in data {
            let range = spectrum.wavelength_range();
            if !window.contains(range) {
                warn!(
                    "Wavelength range ({}, {}) outside expected {label} range ({}, {})",
                    range.0, range.1, window.min, window.max
                );
            }
            if spectrum.intensities().iter().any(|v| *v < 0.0) {
                warn!("Negative intensities found in {label} data");
            }
            if spectrum.intensities().iter().any(|v| v.is_nan()) {
                warn!("NaN values found in {label} data");
            }
        }

        true
    }

    /// Load, validate and assemble a [`Measurement`] from one file.
    pub fn create_measurement(&self, path: &Path) -> Result<Measurement> {
        let data = self.load_data(path);
        if !self.validate_data(&data) {
            return Err(SpectraError::EmptyMeasurement);
        }

        let now = Utc::now();
        let metadata = self.metadata_at(path, now);
        let aging_step = loader::aging_step_from_path(path);
        let sample_id = loader::sample_id(path);

        let spectra = data
            .into_iter()
            .enumerate()
            .map(|(i, spectral_data)| Spectrum {
                spectral_data,
                measurement_name: format!("spectrum_{i}"),
                aging_step: Some(aging_step.value()),
                sample_id: Some(sample_id.clone()),
                timestamp: Some(now),
            })
            .collect();

        let measurement =
            Measurement::new(sample_id, aging_step, self.spectroscopy_type, spectra)?
                .with_metadata(metadata)
                .with_timestamp(now);
        info!(
            "Loaded {} {} spectra from {} ({aging_step})",
            measurement.spectrum_count(),
            self.spectroscopy_type,
            path.display()
        );
        Ok(measurement)
    }
}

// ---------------------------------------------------------------------------
// StrategyRegistry – type → strategy lookup
// ---------------------------------------------------------------------------

/// Maps spectroscopy types to loading strategies. Built once from a
/// [`LoaderConfig`] and handed to whoever loads files.
#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    config: LoaderConfig,
    strategies: BTreeMap<SpectroscopyType, StrategyKind>,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

impl StrategyRegistry {
    /// Registry with fluorescence and absorption registered.
    pub fn new(config: LoaderConfig) -> Self {
        let strategies = BTreeMap::from([
            (SpectroscopyType::Fluorescence, StrategyKind::Fluorescence),
            (SpectroscopyType::Absorption, StrategyKind::Absorption),
        ]);
        Self { config, strategies }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Route `spectroscopy_type` to `kind`, replacing any earlier entry.
    pub fn register(&mut self, spectroscopy_type: SpectroscopyType, kind: StrategyKind) {
        self.strategies.insert(spectroscopy_type, kind);
    }

    pub fn create_strategy(
        &self,
        spectroscopy_type: SpectroscopyType,
    ) -> Result<LoadingStrategy<'_>> {
        let kind = self.strategies.get(&spectroscopy_type).copied().ok_or_else(|| {
            SpectraError::UnsupportedSpectroscopyType(spectroscopy_type.to_string())
        })?;
        Ok(LoadingStrategy::new(kind, spectroscopy_type, &self.config))
    }

    /// Pick a strategy from `Fluorescence` / `Absorption` in the path,
    /// defaulting to fluorescence.
    pub fn strategy_for_path(&self, path: &Path) -> Result<LoadingStrategy<'_>> {
        let text = path.to_string_lossy();
        let spectroscopy_type = if text.contains("Fluorescence") {
            SpectroscopyType::Fluorescence
        } else if text.contains("Absorption") {
            SpectroscopyType::Absorption
        } else {
            debug!("No spectroscopy type in {}, assuming fluorescence", path.display());
            SpectroscopyType::Fluorescence
        };
        self.create_strategy(spectroscopy_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::AgingStep;
    use std::path::PathBuf;

    fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    const FLUORESCENCE_CSV: &str = "\
N0_EX_300.00,N0_I,N1_EX_350.00,N1_I,N2_EX_400.00,N2_I
310,1.5,360,2.5,410,x
320,1.7,370,2.7,420,3.0
330,NaN,380,2.9,,
";

    #[test]
    fn test_fluorescence_load_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "20230101_1200_OO7_AS2_Fluorescence.csv",
            FLUORESCENCE_CSV.as_bytes(),
        );
        let registry = StrategyRegistry::default();
        let strategy = registry.create_strategy(SpectroscopyType::Fluorescence).unwrap();

        let data = strategy.load_data(&path);
        // Third pair holds text and is skipped.
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].wavelengths(), &[310.0, 320.0]);
        assert_eq!(data[0].excitation_wavelength(), Some(300.0));
        assert_eq!(data[1].data_points(), 3);
        assert_eq!(data[1].excitation_wavelength(), Some(350.0));
        assert!(data
            .iter()
            .all(|d| d.spectroscopy_type() == SpectroscopyType::Fluorescence));
    }

    #[test]
    fn test_absorption_skips_excitation() {
        let registry = StrategyRegistry::default();
        let strategy = registry.create_strategy(SpectroscopyType::Absorption).unwrap();
        let csv = "S_EX_350,A\n232,0.4\n270,0.1\n";
        let table = ColumnTable::from_reader(csv.as_bytes()).unwrap();

        let data = strategy.load_table(&table);
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].excitation_wavelength(), None);
        assert_eq!(data[0].spectroscopy_type(), SpectroscopyType::Absorption);
    }

    #[test]
    fn test_excitation_default_from_config() {
        let config = LoaderConfig {
            default_excitation_nm: 280.0,
            ..LoaderConfig::default()
        };
        let registry = StrategyRegistry::new(config);
        let strategy = registry.create_strategy(SpectroscopyType::Fluorescence).unwrap();
        let table = ColumnTable::from_reader("wavelength,I\n300,1\n".as_bytes()).unwrap();

        assert_eq!(strategy.load_table(&table)[0].excitation_wavelength(), Some(280.0));
    }

    #[test]
    fn test_unreadable_file_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let registry = StrategyRegistry::default();
        let strategy = registry.create_strategy(SpectroscopyType::Fluorescence).unwrap();
        assert!(strategy.load_data(&dir.path().join("missing.csv")).is_empty());
    }

    #[test]
    fn test_validate_data_is_advisory() {
        let registry = StrategyRegistry::default();
        let strategy = registry.create_strategy(SpectroscopyType::Fluorescence).unwrap();
        let odd = SpectralData::new(
            vec![150.0, 1200.0],
            vec![-1.0, f64::NAN],
            SpectroscopyType::Fluorescence,
        )
        .unwrap();

        assert!(strategy.validate_data(&[odd]));
        assert!(!strategy.validate_data(&[]));
    }

    #[test]
    fn test_fluorescence_metadata() {
        let registry = StrategyRegistry::default();
        let strategy = registry.create_strategy(SpectroscopyType::Fluorescence).unwrap();
        let meta = strategy.extract_metadata(Path::new("run/20230101_1200_OO7_AS4.csv"));

        assert_eq!(meta["file_name"].as_str(), Some("20230101_1200_OO7_AS4.csv"));
        assert_eq!(meta["spectroscopy_type"].as_str(), Some("fluorescence"));
        assert_eq!(meta["aging_step"], MetadataValue::Integer(4));
        assert_eq!(meta["date"].as_str(), Some("20230101"));
        assert_eq!(meta["time"].as_str(), Some("1200"));
        assert_eq!(meta["sample_code"].as_str(), Some("OO7"));
        assert!(DateTime::parse_from_rfc3339(meta["timestamp"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_absorption_metadata_is_minimal() {
        let registry = StrategyRegistry::default();
        let strategy = registry.create_strategy(SpectroscopyType::Absorption).unwrap();
        let meta = strategy.extract_metadata(Path::new("20230101_1200_OO7_AS4.csv"));

        let keys: Vec<&str> = meta.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["file_name", "file_path", "spectroscopy_type", "timestamp"]);
    }

    #[test]
    fn test_create_measurement() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "20230101_1200_OO7_AS2.csv", FLUORESCENCE_CSV.as_bytes());
        let registry = StrategyRegistry::default();

        let m = registry
            .strategy_for_path(&path)
            .unwrap()
            .create_measurement(&path)
            .unwrap();

        assert_eq!(m.measurement_id(), "20230101_1200_OO7_AS2");
        assert_eq!(m.aging_step(), AgingStep::Step2);
        assert_eq!(m.spectroscopy_type(), SpectroscopyType::Fluorescence);
        assert_eq!(m.spectrum_count(), 2);
        let first = m.spectrum_by_name("spectrum_0").unwrap();
        assert_eq!(first.aging_step, Some(2));
        assert_eq!(first.sample_id.as_deref(), Some("20230101_1200_OO7_AS2"));
        assert_eq!(first.timestamp, m.timestamp());
        assert_eq!(m.spectra_by_excitation(350.0).len(), 1);
        assert!(m.metadata().unwrap().contains_key("sample_code"));
    }

    #[test]
    fn test_create_measurement_without_spectra_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "empty_Absorption.csv", b"w,a\n,\n");
        let registry = StrategyRegistry::default();
        let strategy = registry.strategy_for_path(&path).unwrap();

        assert_eq!(strategy.kind(), StrategyKind::Absorption);
        assert_eq!(
            strategy.create_measurement(&path).unwrap_err(),
            SpectraError::EmptyMeasurement
        );
    }

    #[test]
    fn test_strategy_for_path() {
        let registry = StrategyRegistry::default();
        let pick = |p: &str| registry.strategy_for_path(Path::new(p)).unwrap().kind();

        assert_eq!(pick("data/Fluorescence/a.csv"), StrategyKind::Fluorescence);
        assert_eq!(pick("data/Absorption/a.csv"), StrategyKind::Absorption);
        assert_eq!(pick("data/other/a.csv"), StrategyKind::Fluorescence);
    }

    #[test]
    fn test_unregistered_type_fails() {
        let mut registry = StrategyRegistry::default();
        assert_eq!(
            registry.create_strategy(SpectroscopyType::Raman).unwrap_err(),
            SpectraError::UnsupportedSpectroscopyType("raman".into())
        );

        registry.register(SpectroscopyType::Raman, StrategyKind::Fluorescence);
        let strategy = registry.create_strategy(SpectroscopyType::Raman).unwrap();
        assert_eq!(strategy.kind(), StrategyKind::Fluorescence);
        assert_eq!(strategy.spectroscopy_type(), SpectroscopyType::Raman);
    }

    #[test]
    fn test_registered_type_labels_measurement() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "20230101_1200_OO7_AS1.csv", FLUORESCENCE_CSV.as_bytes());
        let mut registry = StrategyRegistry::default();
        registry.register(SpectroscopyType::Raman, StrategyKind::Fluorescence);

        let m = registry
            .create_strategy(SpectroscopyType::Raman)
            .unwrap()
            .create_measurement(&path)
            .unwrap();

        assert_eq!(m.spectroscopy_type(), SpectroscopyType::Raman);
        assert!(m
            .spectra()
            .iter()
            .all(|s| s.spectroscopy_type() == SpectroscopyType::Raman));
        let meta = m.metadata().unwrap();
        assert_eq!(meta["spectroscopy_type"].as_str(), Some("raman"));
        // Fluorescence behaviour still applies: excitation and file-name fields.
        assert_eq!(meta["aging_step"].as_i64(), Some(1));
        assert_eq!(m.spectra_by_excitation(300.0).len(), 1);
    }
}
