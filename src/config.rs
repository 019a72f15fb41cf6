use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::export::ExportFormat;
use crate::data::smoother::{DEFAULT_MIN_POINTS, DEFAULT_SPIKE_THRESHOLD};

/// Environment variable naming a JSON configuration file.
pub const CONFIG_ENV: &str = "CTE_DESPIKE_CONFIG";

// ---------------------------------------------------------------------------
// Configuration sections
// ---------------------------------------------------------------------------

/// Smoothing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Series with this many present values or fewer are not smoothed.
    pub min_points: usize,
    /// Spike limit in noise-scale units; `null` disables spike rejection.
    pub spike_threshold: Option<f64>,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            min_points: DEFAULT_MIN_POINTS,
            spike_threshold: Some(DEFAULT_SPIKE_THRESHOLD),
        }
    }
}

/// Layout of uploaded raw-data workbooks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub sheet_name: String,
    /// Directive rows above the header row.
    pub skip_rows: usize,
    /// Heating-rate label for each (Temperature, CTE) block, left to right.
    pub rate_labels: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            sheet_name: "Rawdata".to_string(),
            skip_rows: 1,
            rate_labels: ["1K/min", "3K/min", "6K/min", "10K/min"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Processed-file output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub sheet_name: String,
    /// Download file name without extension.
    pub file_stem: String,
    pub format: ExportFormat,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            sheet_name: "Processed Data".to_string(),
            file_stem: "processed_data".to_string(),
            format: ExportFormat::Xlsx,
        }
    }
}

impl ExportConfig {
    pub fn file_name(&self, format: ExportFormat) -> String {
        format!("{}.{}", self.file_stem, format.extension())
    }
}

// ---------------------------------------------------------------------------
// DespikeConfig
// ---------------------------------------------------------------------------

/// Complete application configuration. Every field has a default, so a JSON
/// file only needs the values it changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DespikeConfig {
    pub smoothing: SmoothingConfig,
    pub ingest: IngestConfig,
    pub export: ExportConfig,
}

impl DespikeConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: DespikeConfig = serde_json::from_str(text).context("parsing configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Load the file named by [`CONFIG_ENV`], falling back to defaults.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV) else {
            return Self::default();
        };
        match Self::load(Path::new(&path)) {
            Ok(config) => {
                log::info!("Loaded configuration from {}", Path::new(&path).display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring configuration: {e:#}");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(t) = self.smoothing.spike_threshold {
            if !(t.is_finite() && t > 0.0) {
                bail!("smoothing.spike_threshold must be a positive number, got {t}");
            }
        }
        if self.ingest.sheet_name.trim().is_empty() {
            bail!("ingest.sheet_name must not be empty");
        }
        if self.export.sheet_name.trim().is_empty() {
            bail!("export.sheet_name must not be empty");
        }
        if self.export.file_stem.trim().is_empty() {
            bail!("export.file_stem must not be empty");
        }
        Ok(())
    }
}
