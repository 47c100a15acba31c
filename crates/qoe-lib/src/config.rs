use crate::error::{QoeError, Result};
use crate::io::text::MalformedPolicy;
use crate::metrics::QoeReference;
use crate::signal::SessionMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Image encodings the renderers know how to write.
pub const SUPPORTED_IMAGE_FORMATS: &[&str] = &["png", "svg"];

/// Run configuration. Every key is optional in the TOML form; missing keys
/// fall back to the values used by the streaming client's export layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QoeConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub resolution_file: String,
    pub buffering_file: String,
    pub session_mode: SessionMode,
    pub streaming_seconds: usize,
    /// Rungs drawn as reference bands on the resolution chart.
    pub quality_rungs: Vec<f64>,
    /// Rungs drawn as reference bands on the resolution-change chart.
    pub change_rungs: Vec<f64>,
    /// Good / Better / Best thresholds on the QoE chart.
    pub qoe_bands: Vec<f64>,
    pub normalization_max: f64,
    pub file_prefix: String,
    pub player_name: String,
    pub image_format: String,
    pub image_width: u32,
    pub image_height: u32,
    pub malformed: MalformedPolicy,
}

impl Default for QoeConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("Statistics"),
            output_dir: PathBuf::from("Graphs"),
            resolution_file: "resolution_data.csv".into(),
            buffering_file: "buffering_data.csv".into(),
            session_mode: SessionMode::Live,
            streaming_seconds: 60,
            quality_rungs: vec![8.0, 16.0, 32.0],
            change_rungs: vec![8.0, 16.0, 24.0, 32.0],
            qoe_bands: vec![60.0, 80.0, 100.0],
            normalization_max: 32.0,
            file_prefix: "oboe".into(),
            player_name: "Oboe".into(),
            image_format: "png".into(),
            image_width: 800,
            image_height: 480,
            malformed: MalformedPolicy::Fail,
        }
    }
}

impl QoeConfig {
    pub fn resolution_path(&self) -> PathBuf {
        self.input_dir.join(&self.resolution_file)
    }

    pub fn buffering_path(&self) -> PathBuf {
        self.input_dir.join(&self.buffering_file)
    }

    pub fn reference(&self) -> QoeReference {
        QoeReference {
            normalization_max: self.normalization_max,
        }
    }

    /// Reject settings that would make the run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.input_dir.as_os_str().is_empty() {
            return Err(QoeError::Configuration("input_dir is not set".into()));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(QoeError::Configuration("output_dir is not set".into()));
        }
        if self.resolution_file.trim().is_empty() || self.buffering_file.trim().is_empty() {
            return Err(QoeError::Configuration("input file names must not be empty".into()));
        }
        if self.streaming_seconds == 0 {
            return Err(QoeError::Configuration(
                "streaming_seconds must be greater than zero".into(),
            ));
        }
        if !(self.normalization_max.is_finite() && self.normalization_max > 0.0) {
            return Err(QoeError::Configuration(format!(
                "normalization_max must be positive, got {}",
                self.normalization_max
            )));
        }
        if self.qoe_bands.len() > 3 {
            return Err(QoeError::Configuration(format!(
                "at most 3 QoE bands are labeled, got {}",
                self.qoe_bands.len()
            )));
        }
        if !SUPPORTED_IMAGE_FORMATS.contains(&self.image_format.as_str()) {
            return Err(QoeError::Configuration(format!(
                "unsupported image format '{}' (expected one of {:?})",
                self.image_format, SUPPORTED_IMAGE_FORMATS
            )));
        }
        if self.image_width == 0 || self.image_height == 0 {
            return Err(QoeError::Configuration("image size must be non-zero".into()));
        }
        Ok(())
    }
}

/// Parse a TOML configuration.
pub fn parse_config(text: &str) -> Result<QoeConfig> {
    toml::from_str(text).map_err(|e| QoeError::Configuration(e.to_string()))
}

/// Read a TOML configuration file.
pub fn read_config(path: &Path) -> Result<QoeConfig> {
    let contents = fs::read_to_string(path).map_err(|e| QoeError::io(path, e))?;
    parse_config(&contents).map_err(|e| match e {
        QoeError::Configuration(msg) => {
            QoeError::Configuration(format!("parsing {}: {}", path.display(), msg))
        }
        other => other,
    })
}
