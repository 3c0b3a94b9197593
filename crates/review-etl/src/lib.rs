//! Review ETL Library
//!
//! Batch cleaning and merging of product item and review tables, built on Polars.
//!
//! # Overview
//!
//! A run takes two tables, `items` and `reviews`, and produces one merged,
//! memory-optimized CSV file:
//!
//! - **Imputation**: exact duplicate removal, mode fill for text columns,
//!   mean fill for numeric columns, residual null removal
//! - **Text Cleaning**: catalog codes, non-letters and single-letter words
//!   stripped from free-text columns
//! - **Merging**: inner join on the product key
//! - **Memory Optimization**: numeric columns narrowed to the smallest type
//!   that holds their values
//! - **Progress Reporting**: one update before each stage
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use review_etl::{LocalDatasetStore, Pipeline, PipelineConfig};
//! use std::sync::Arc;
//!
//! let config = PipelineConfig::from_yaml_file("config.yml")?;
//!
//! let summary = Pipeline::builder()
//!     .config(config)
//!     .dataset_store(Arc::new(LocalDatasetStore::new("datasets")))
//!     .build()?
//!     .run()?;
//!
//! println!("Wrote {} rows", summary.rows_after);
//! ```
//!
//! # Working on tables directly
//!
//! Every stage takes a [`Table`] by value and returns a new one:
//!
//! ```rust,ignore
//! use review_etl::{Imputer, Merger, MemoryOptimizer, Table, TextNormalizer};
//!
//! let items = Imputer::default().impute(Table::from_frame(items_df)?)?;
//! let items = TextNormalizer.normalize_text(items, "title")?;
//! let merged = Merger::new(Some("helpfulVotes".into())).merge(items, reviews, "asin")?;
//! let optimized = MemoryOptimizer.optimize(merged)?;
//! ```

pub mod cleaner;
pub mod config;
pub mod dataset;
pub mod error;
pub mod imputers;
pub mod pipeline;
pub mod table;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::TextNormalizer;
pub use config::{ConfigValidationError, ImputationOrder, PipelineConfig, PipelineConfigBuilder};
pub use dataset::{DatasetStore, LocalDatasetStore, read_csv, write_csv};
pub use error::{EtlError, Result as EtlResult, ResultExt};
pub use imputers::{Imputer, StatisticalImputer};
pub use pipeline::{
    ClosureProgressReporter, LoggingProgressReporter, MemoryOptimizer, Merger, Pipeline,
    PipelineBuilder, PipelineStage, ProgressReporter, ProgressUpdate,
};
pub use table::{ColumnKind, Table};
pub use types::{ColumnNarrowing, RunSummary, StageSummary};
