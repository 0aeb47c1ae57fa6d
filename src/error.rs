//! Unified error hierarchy for TriPace
//!
//! Only input validation is an error in the analytics core. Metrics that
//! cannot be computed for lack of data come back as `None` or empty
//! collections, and lookups that miss return `None`.

use std::path::PathBuf;
use thiserror::Error;

use crate::export::ExportError;
use crate::thresholds::ThresholdError;

/// Top-level error type for all TriPace operations
#[derive(Debug, Error)]
pub enum TriPaceError {
    /// Heart-rate threshold validation errors, surfaced verbatim
    #[error(transparent)]
    Threshold(#[from] ThresholdError),

    /// A configuration section holds values the calculators cannot use
    #[error("Invalid [{section}] section: {reason}")]
    Configuration { section: &'static str, reason: String },

    /// Record file could not be read
    #[error("Input file error at {path}: {reason}")]
    Input { path: PathBuf, reason: String },

    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// JSON (de)serialisation errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for TriPace operations
pub type Result<T> = std::result::Result<T, TriPaceError>;

impl TriPaceError {
    /// Wrap a section's own validation error
    pub fn configuration(section: &'static str, err: impl std::fmt::Display) -> Self {
        TriPaceError::Configuration {
            section,
            reason: err.to_string(),
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            TriPaceError::Threshold(err) => err.to_string(),
            TriPaceError::Input { path, .. } => {
                format!("Could not read records from {}", path.display())
            }
            TriPaceError::Configuration { section, reason } => {
                format!(
                    "Configuration problem in [{}]: {}. Check your config file.",
                    section, reason
                )
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pmc::PmcError;

    #[test]
    fn test_threshold_errors_are_surfaced_verbatim() {
        let inner = ThresholdError::MaxNotAboveResting { max: 50, resting: 60 };
        let expected = inner.to_string();
        let err: TriPaceError = inner.into();

        assert_eq!(err.to_string(), expected);
        assert_eq!(err.user_message(), expected);
    }

    #[test]
    fn test_input_error_message() {
        let err = TriPaceError::Input {
            path: PathBuf::from("workouts.json"),
            reason: "missing".to_string(),
        };
        assert!(err.user_message().contains("workouts.json"));
    }

    #[test]
    fn test_configuration_error_names_section() {
        let inner =
            PmcError::ConfigurationError("time constants must be at least one day".to_string());
        let err = TriPaceError::configuration("pmc", inner);

        assert!(err.to_string().starts_with("Invalid [pmc] section"));
        assert!(err.user_message().contains("time constants must be at least one day"));
    }
}
