use serde::{Deserialize, Serialize};

/// Basic typed time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Uniform sampling frequency in Hz
    pub fs: f64,
    /// Samples
    pub data: Vec<f64>,
}

impl TimeSeries {
    /// One sample per elapsed second of streaming.
    pub fn per_second(data: Vec<f64>) -> Self {
        Self { fs: 1.0, data }
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    pub fn duration(&self) -> f64 {
        self.data.len() as f64 / self.fs
    }
    /// Elapsed time of sample `index` in seconds.
    pub fn time_at(&self, index: usize) -> f64 {
        index as f64 / self.fs.max(f64::MIN_POSITIVE)
    }
}

/// Whether the session streamed a live broadcast or a pre-recorded asset.
/// Only affects titles and artifact names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    #[default]
    Live,
    Recorded,
}

impl SessionMode {
    /// Lowercase tag used in file names.
    pub fn tag(&self) -> &'static str {
        match self {
            SessionMode::Live => "live",
            SessionMode::Recorded => "recorded",
        }
    }
    /// Capitalized form used in chart titles.
    pub fn display_name(&self) -> &'static str {
        match self {
            SessionMode::Live => "Live",
            SessionMode::Recorded => "Recorded",
        }
    }
}

impl std::fmt::Display for SessionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}
