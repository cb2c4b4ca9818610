use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

use super::model::AgingStep;
use crate::error::SpectraError;

/// Cell spellings read as a missing value, as pandas does by default.
const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ---------------------------------------------------------------------------
// ColumnTable – a wide CSV held column by column
// ---------------------------------------------------------------------------

/// Raw cells of a wide spectral CSV, stored column-major.
///
/// Layout: a header row, then data rows whose columns come in adjacent
/// wavelength/intensity pairs:
///
/// ```text
/// N0_EX_300.00,N0_I,N1_EX_350.00,N1_I
/// 310.0,12.5,360.0,8.1
/// 311.0,12.9,361.0,8.4
/// ```
///
/// `None` marks a missing cell (blank, a missing marker, or absent in a
/// short row).
#[derive(Debug, Clone, Default)]
pub struct ColumnTable {
    headers: Vec<String>,
    columns: Vec<Vec<Option<String>>>,
}

impl ColumnTable {
    /// Read a latin-1 encoded CSV file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening CSV {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("reading CSV {}", path.display()))
    }

    pub fn from_reader<R: Read>(rdr: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(rdr);

        let headers: Vec<String> = reader
            .byte_headers()
            .context("reading CSV headers")?
            .iter()
            .map(decode_latin1)
            .collect();

        let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

        for (row_no, result) in reader.byte_records().enumerate() {
            let record = result.with_context(|| format!("CSV row {row_no}"))?;
            for (col_idx, column) in columns.iter_mut().enumerate() {
                let cell = record
                    .get(col_idx)
                    .map(decode_latin1)
                    .filter(|s| !MISSING_MARKERS.contains(&s.as_str()));
                column.push(cell);
            }
        }

        Ok(Self { headers, columns })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Start indices of every complete wavelength/intensity pair.
    pub fn pair_starts(&self) -> impl Iterator<Item = usize> {
        (0..self.column_count().saturating_sub(1)).step_by(2)
    }

    /// Extract column `col` as wavelengths and `col + 1` as intensities.
    ///
    /// Rows where either cell is missing are dropped. Any remaining cell that
    /// is not a number fails the whole pair.
    pub fn extract_pair(&self, col: usize) -> crate::error::Result<(Vec<f64>, Vec<f64>)> {
        if col + 1 >= self.column_count() {
            return Err(SpectraError::ColumnOutOfBounds {
                column: col,
                columns: self.column_count(),
            });
        }

        let x_col = &self.columns[col];
        let y_col = &self.columns[col + 1];
        let mut wavelengths = Vec::with_capacity(x_col.len());
        let mut intensities = Vec::with_capacity(y_col.len());

        for (row, (x, y)) in x_col.iter().zip(y_col).enumerate() {
            let (Some(x), Some(y)) = (x, y) else {
                continue;
            };
            wavelengths.push(parse_cell(x, &self.headers[col], row)?);
            intensities.push(parse_cell(y, &self.headers[col + 1], row)?);
        }

        Ok((wavelengths, intensities))
    }
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn parse_cell(cell: &str, header: &str, row: usize) -> crate::error::Result<f64> {
    cell.parse::<f64>().map_err(|_| SpectraError::InvalidNumber {
        header: header.to_string(),
        row,
        value: cell.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Header and file-name tokens
// ---------------------------------------------------------------------------

/// Excitation wavelength encoded in a fluorescence header such as
/// `N0_EX_350.00`. Falls back to `default_nm` when the marker is missing or
/// the text after it is not a number.
pub fn excitation_from_header(header: &str, marker: &str, default_nm: f64) -> f64 {
    if marker.is_empty() {
        return default_nm;
    }
    header
        .split(marker)
        .nth(1)
        .and_then(|tail| tail.trim().parse::<f64>().ok())
        .unwrap_or(default_nm)
}

/// Aging step from an `AS<digit>` token in the file name. Tokens are tried
/// from `AS0` upwards; no token means step 0.
pub fn aging_step_from_file_name(file_name: &str) -> AgingStep {
    AgingStep::ALL
        .into_iter()
        .find(|step| file_name.contains(&step.to_string()))
        .unwrap_or_default()
}

pub fn aging_step_from_path(path: &Path) -> AgingStep {
    aging_step_from_file_name(&file_name(path))
}

/// Sample id: the file name without its extension.
pub fn sample_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
