//! Error types for the review ETL pipeline.
//!
//! Every stage fails fast: there is no row-level recovery, so each variant
//! describes why a whole run was aborted. Errors are serializable so the CLI
//! can emit them as JSON alongside the run summary.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the pipeline.
#[derive(Error, Debug)]
pub enum EtlError {
    /// Configuration file missing, unparseable, or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The dataset store could not provide a local copy of a dataset.
    #[error("Failed to fetch dataset '{dataset_id}': {reason}")]
    DatasetFetch { dataset_id: String, reason: String },

    /// No valid fill value exists for a column.
    #[error("Failed to impute missing values in column '{column}': {reason}")]
    Imputation { column: String, reason: String },

    /// The join could not be performed.
    #[error("Join failed: {0}")]
    Join(String),

    /// An expected column is absent or has an unsupported layout.
    #[error("Schema error: {0}")]
    Schema(String),

    /// A column holds cells of the wrong semantic kind for an operation.
    #[error("Column '{column}' expected {expected} cells, found {found}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error annotated with the stage it happened in.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EtlError>,
    },
}

impl EtlError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        EtlError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable machine-readable code for the error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::DatasetFetch { .. } => "DATASET_FETCH_ERROR",
            Self::Imputation { .. } => "IMPUTATION_ERROR",
            Self::Join(_) => "JOIN_ERROR",
            Self::Schema(_) => "SCHEMA_ERROR",
            Self::TypeMismatch { .. } => "TYPE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Innermost error, with all stage context stripped.
    pub fn root(&self) -> &EtlError {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for EtlError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("EtlError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, EtlError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| EtlError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(EtlError::Join("x".to_string()).error_code(), "JOIN_ERROR");
        assert_eq!(
            EtlError::Imputation {
                column: "price".to_string(),
                reason: "all values missing".to_string(),
            }
            .error_code(),
            "IMPUTATION_ERROR"
        );
    }

    #[test]
    fn test_error_serialization() {
        let error = EtlError::Schema("column 'title' not found".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("SCHEMA_ERROR"));
        assert!(json.contains("title"));
    }

    #[test]
    fn test_with_context_preserves_code_and_root() {
        let error = EtlError::Join("key 'asin' missing".to_string()).with_context("Merging Dataset");
        assert!(error.to_string().starts_with("Merging Dataset: "));
        assert_eq!(error.error_code(), "JOIN_ERROR");
        assert!(matches!(error.root(), EtlError::Join(_)));
    }

    #[test]
    fn test_result_ext_wraps_polars_errors() {
        let result: std::result::Result<(), polars::error::PolarsError> = Err(
            polars::error::PolarsError::ColumnNotFound("asin".into()),
        );
        let err = result.context("Loading items").unwrap_err();
        assert_eq!(err.error_code(), "POLARS_ERROR");
        assert!(err.to_string().contains("Loading items"));
    }
}
