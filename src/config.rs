use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Inclusive wavelength window (nm) a spectrum is expected to fall within.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WavelengthWindow {
    pub min: f64,
    pub max: f64,
}

impl WavelengthWindow {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether the `(min, max)` range of a spectrum lies inside the window.
    pub fn contains(&self, range: (f64, f64)) -> bool {
        range.0 >= self.min && range.1 <= self.max
    }
}

/// Settings shared by the loading strategies.
///
/// Every field has a default, so a JSON file only needs to name the
/// values it overrides:
///
/// ```json
/// { "default_excitation_nm": 280.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Marker in a fluorescence wavelength header preceding the excitation
    /// wavelength, e.g. `N0_EX_350.00`.
    pub excitation_marker: String,
    /// Excitation wavelength used when the header carries none.
    pub default_excitation_nm: f64,
    pub fluorescence_window: WavelengthWindow,
    pub absorption_window: WavelengthWindow,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            excitation_marker: "EX_".to_string(),
            default_excitation_nm: 300.0,
            fluorescence_window: WavelengthWindow::new(200.0, 1000.0),
            absorption_window: WavelengthWindow::new(100.0, 1000.0),
        }
    }
}

impl LoaderConfig {
    /// Read a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).context("parsing loader config JSON")
    }
}
