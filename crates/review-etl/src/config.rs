//! Configuration types for the review ETL pipeline.
//!
//! Configuration is a flat YAML mapping read once per run. The four dataset
//! keys are required; everything else has a default matching the standard
//! items/reviews layout.

use crate::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

/// Order in which the imputer removes rows and fills missing values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImputationOrder {
    /// Fill by mode/mean over every row, drop residual nulls, then drop duplicates
    #[default]
    FillThenDrop,
    /// Drop duplicates and every row with a null before filling (fill becomes a no-op)
    DropThenFill,
}

fn default_join_key() -> String {
    "asin".to_string()
}

fn default_dropped_column() -> Option<String> {
    Some("helpfulVotes".to_string())
}

fn default_items_text_columns() -> Vec<String> {
    vec!["title".to_string()]
}

fn default_reviews_text_columns() -> Vec<String> {
    vec!["title".to_string(), "body".to_string()]
}

fn default_output_path() -> PathBuf {
    PathBuf::from("memory_optimized_file.csv")
}

/// Configuration for a pipeline run.
///
/// Use [`PipelineConfig::from_yaml_file`] to load it from disk or
/// [`PipelineConfig::builder()`] to assemble one in code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Dataset identifier holding the items file.
    pub items_data_file_id: String,

    /// Dataset identifier holding the reviews file.
    pub reviews_data_file_id: String,

    /// File name of the items table inside its dataset directory.
    pub items_data_file: String,

    /// File name of the reviews table inside its dataset directory.
    pub reviews_data_file: String,

    /// Column both tables are joined on.
    /// Default: "asin"
    #[serde(default = "default_join_key")]
    pub join_key: String,

    /// Column removed from the merged table, if present.
    /// Default: "helpfulVotes"
    #[serde(default = "default_dropped_column")]
    pub dropped_column: Option<String>,

    /// Free-text columns of the items table to normalize.
    /// Default: ["title"]
    #[serde(default = "default_items_text_columns")]
    pub items_text_columns: Vec<String>,

    /// Free-text columns of the reviews table to normalize.
    /// Default: ["title", "body"]
    #[serde(default = "default_reviews_text_columns")]
    pub reviews_text_columns: Vec<String>,

    /// Row removal / fill ordering used by the imputer.
    /// Default: FillThenDrop
    #[serde(default)]
    pub imputation_order: ImputationOrder,

    /// Where the final CSV artifact is written.
    /// Default: "memory_optimized_file.csv"
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Parse and validate a configuration from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(content)
            .map_err(|e| EtlError::Config(format!("Error parsing YAML: {}", e)))?;
        config
            .validate()
            .map_err(|e| EtlError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Read, parse and validate a YAML configuration file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> std::result::Result<(), ConfigValidationError> {
        let required = [
            ("items_data_file_id", &self.items_data_file_id),
            ("reviews_data_file_id", &self.reviews_data_file_id),
            ("items_data_file", &self.items_data_file),
            ("reviews_data_file", &self.reviews_data_file),
            ("join_key", &self.join_key),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigValidationError::EmptyValue(field.to_string()));
            }
        }

        if self.dropped_column.as_deref() == Some(self.join_key.as_str()) {
            return Err(ConfigValidationError::DroppedJoinKey(self.join_key.clone()));
        }

        if self.output_path.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyValue("output_path".to_string()));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing or empty value for '{0}'")]
    EmptyValue(String),

    #[error("Cannot drop the join key column '{0}'")]
    DroppedJoinKey(String),
}

impl From<ConfigValidationError> for EtlError {
    fn from(e: ConfigValidationError) -> Self {
        EtlError::Config(e.to_string())
    }
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    items_data_file_id: Option<String>,
    reviews_data_file_id: Option<String>,
    items_data_file: Option<String>,
    reviews_data_file: Option<String>,
    join_key: Option<String>,
    dropped_column: Option<Option<String>>,
    items_text_columns: Option<Vec<String>>,
    reviews_text_columns: Option<Vec<String>>,
    imputation_order: Option<ImputationOrder>,
    output_path: Option<PathBuf>,
}

impl PipelineConfigBuilder {
    /// Set the dataset id and file name of the items table.
    pub fn items(mut self, dataset_id: impl Into<String>, file: impl Into<String>) -> Self {
        self.items_data_file_id = Some(dataset_id.into());
        self.items_data_file = Some(file.into());
        self
    }

    /// Set the dataset id and file name of the reviews table.
    pub fn reviews(mut self, dataset_id: impl Into<String>, file: impl Into<String>) -> Self {
        self.reviews_data_file_id = Some(dataset_id.into());
        self.reviews_data_file = Some(file.into());
        self
    }

    pub fn join_key(mut self, key: impl Into<String>) -> Self {
        self.join_key = Some(key.into());
        self
    }

    /// Set the column dropped after merging; `None` keeps every column.
    pub fn dropped_column(mut self, column: Option<String>) -> Self {
        self.dropped_column = Some(column);
        self
    }

    pub fn items_text_columns(mut self, columns: Vec<String>) -> Self {
        self.items_text_columns = Some(columns);
        self
    }

    pub fn reviews_text_columns(mut self, columns: Vec<String>) -> Self {
        self.reviews_text_columns = Some(columns);
        self
    }

    pub fn imputation_order(mut self, order: ImputationOrder) -> Self {
        self.imputation_order = Some(order);
        self
    }

    pub fn output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> std::result::Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            items_data_file_id: self.items_data_file_id.unwrap_or_default(),
            reviews_data_file_id: self.reviews_data_file_id.unwrap_or_default(),
            items_data_file: self.items_data_file.unwrap_or_default(),
            reviews_data_file: self.reviews_data_file.unwrap_or_default(),
            join_key: self.join_key.unwrap_or_else(default_join_key),
            dropped_column: self.dropped_column.unwrap_or_else(default_dropped_column),
            items_text_columns: self
                .items_text_columns
                .unwrap_or_else(default_items_text_columns),
            reviews_text_columns: self
                .reviews_text_columns
                .unwrap_or_else(default_reviews_text_columns),
            imputation_order: self.imputation_order.unwrap_or_default(),
            output_path: self.output_path.unwrap_or_else(default_output_path),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL_YAML: &str = r#"
items_data_file_id: "d1f0"
reviews_data_file_id: "e2a1"
items_data_file: "items.csv"
reviews_data_file: "reviews.csv"
"#;

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let config = PipelineConfig::from_yaml_str(MINIMAL_YAML).unwrap();

        assert_eq!(config.items_data_file_id, "d1f0");
        assert_eq!(config.reviews_data_file, "reviews.csv");
        assert_eq!(config.join_key, "asin");
        assert_eq!(config.dropped_column.as_deref(), Some("helpfulVotes"));
        assert_eq!(config.items_text_columns, vec!["title"]);
        assert_eq!(config.reviews_text_columns, vec!["title", "body"]);
        assert_eq!(config.imputation_order, ImputationOrder::FillThenDrop);
        assert_eq!(config.output_path, PathBuf::from("memory_optimized_file.csv"));
    }

    #[test]
    fn test_yaml_overrides() {
        let yaml = format!(
            "{}join_key: sku\ndropped_column: null\nimputation_order: drop_then_fill\noutput_path: out/merged.csv\n",
            MINIMAL_YAML
        );
        let config = PipelineConfig::from_yaml_str(&yaml).unwrap();

        assert_eq!(config.join_key, "sku");
        assert_eq!(config.dropped_column, None);
        assert_eq!(config.imputation_order, ImputationOrder::DropThenFill);
        assert_eq!(config.output_path, PathBuf::from("out/merged.csv"));
    }

    #[test]
    fn test_missing_required_key_is_config_error() {
        let yaml = "items_data_file_id: d1\nitems_data_file: items.csv\n";
        let err = PipelineConfig::from_yaml_str(yaml).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_malformed_yaml_is_config_error() {
        let err = PipelineConfig::from_yaml_str("items_data_file_id: [unclosed").unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        assert!(err.to_string().contains("Error parsing YAML"));
    }

    #[test]
    fn test_empty_value_rejected() {
        let yaml = MINIMAL_YAML.replace("\"items.csv\"", "\"  \"");
        let err = PipelineConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(err.to_string().contains("items_data_file"));
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = PipelineConfig::from_yaml_file("/definitely/not/here/config.yml").unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL_YAML.as_bytes()).unwrap();

        let config = PipelineConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.items_data_file, "items.csv");
    }

    #[test]
    fn test_builder() {
        let config = PipelineConfig::builder()
            .items("d1", "items.csv")
            .reviews("d2", "reviews.csv")
            .imputation_order(ImputationOrder::DropThenFill)
            .build()
            .unwrap();

        assert_eq!(config.items_data_file_id, "d1");
        assert_eq!(config.reviews_data_file_id, "d2");
        assert_eq!(config.imputation_order, ImputationOrder::DropThenFill);
    }

    #[test]
    fn test_builder_requires_dataset_keys() {
        let result = PipelineConfig::builder().items("d1", "items.csv").build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::EmptyValue(field) if field == "reviews_data_file_id"
        ));
    }

    #[test]
    fn test_dropping_join_key_rejected() {
        let result = PipelineConfig::builder()
            .items("d1", "items.csv")
            .reviews("d2", "reviews.csv")
            .dropped_column(Some("asin".to_string()))
            .build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::DroppedJoinKey(_)
        ));
    }
}
