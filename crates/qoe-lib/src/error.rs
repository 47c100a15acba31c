use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by loading, deriving or rendering a session.
#[derive(Debug, Error)]
pub enum QoeError {
    #[error("{}: line {line} is not numeric: '{value}'", path.display())]
    DataFormat {
        path: PathBuf,
        line: usize,
        value: String,
    },
    #[error("{}: no numeric samples found", path.display())]
    EmptySeries { path: PathBuf },
    #[error("unable to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("{series} series has {found} samples, expected {expected}")]
    LengthMismatch {
        series: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("rendering {chart} chart to {} failed: {message}", path.display())]
    Render {
        chart: &'static str,
        path: PathBuf,
        message: String,
    },
}

impl QoeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        QoeError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = QoeError> = std::result::Result<T, E>;
