use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{error, info};

use hyrcania::{ExperimentSession, LoaderConfig, StrategyRegistry};

fn main() -> Result<()> {
    env_logger::init();

    let config = match std::env::var_os("HYRCANIA_CONFIG") {
        Some(path) => LoaderConfig::from_json_file(Path::new(&path))
            .context("loading HYRCANIA_CONFIG")?,
        None => LoaderConfig::default(),
    };
    let registry = StrategyRegistry::new(config);

    let mut measurements = Vec::new();
    for path in std::env::args_os().skip(1).map(PathBuf::from) {
        let strategy = registry.strategy_for_path(&path)?;
        match strategy.create_measurement(&path) {
            Ok(m) => measurements.push(m),
            Err(e) => error!("{}: {e}", path.display()),
        }
    }

    let session = ExperimentSession::new("cli", measurements);
    for m in &session.measurements {
        let excitations: Vec<String> = m
            .spectra()
            .iter()
            .filter_map(|s| s.spectral_data.excitation_wavelength())
            .map(|nm| format!("{nm:.0}"))
            .collect();
        info!(
            "{}: {} {} spectra, {}, excitation [{}]",
            m.measurement_id(),
            m.spectrum_count(),
            m.spectroscopy_type(),
            m.aging_step(),
            excitations.join(", ")
        );
    }
    info!("{} measurement(s) loaded", session.measurement_count());

    Ok(())
}
