//! Error types for forecast runs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    /// Pre-flight validation failed; the run never started
    #[error("invalid configuration: {}", .0.join("; "))]
    Configuration(Vec<String>),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ForecastError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ForecastError::Io {
            path: path.into(),
            source,
        }
    }

    /// Validation messages, if this is a configuration error
    pub fn messages(&self) -> &[String] {
        match self {
            ForecastError::Configuration(messages) => messages,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, ForecastError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_joins_messages() {
        let err = ForecastError::Configuration(vec![
            "durations must not be empty".to_string(),
            "spread must be within [0, 100]".to_string(),
        ]);

        assert_eq!(
            err.to_string(),
            "invalid configuration: durations must not be empty; spread must be within [0, 100]"
        );
        assert_eq!(err.messages().len(), 2);
    }

    #[test]
    fn test_io_error_has_no_messages() {
        let err = ForecastError::io(
            "missing.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        );
        assert!(err.messages().is_empty());
        assert!(err.to_string().contains("missing.json"));
    }
}
