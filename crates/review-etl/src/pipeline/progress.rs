//! Progress reporting for the review pipeline.
//!
//! The pipeline emits a [`ProgressUpdate`] before each stage. Updates are
//! notifications only; nothing the reporter does affects the data.
//!
//! # Example
//!
//! ```rust,ignore
//! use review_etl::{Pipeline, LocalDatasetStore};
//! use std::sync::Arc;
//!
//! let summary = Pipeline::builder()
//!     .config(config)
//!     .dataset_store(Arc::new(LocalDatasetStore::new("datasets")))
//!     .on_progress(|update| {
//!         println!("[{:?}] {}", update.stage, update.message);
//!     })
//!     .build()?
//!     .run()?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of the review pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Fetching and reading the two input tables
    LoadingData,
    /// Removing duplicates and filling missing values
    Imputation,
    /// Normalizing free-text columns
    TextCleaning,
    /// Joining items with reviews
    Merging,
    /// Narrowing numeric storage
    MemoryOptimization,
    /// Writing the output artifact
    Writing,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl PipelineStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::LoadingData => "Loading Data",
            Self::Imputation => "Data Imputation",
            Self::TextCleaning => "Data Cleaning",
            Self::Merging => "Merging Dataset",
            Self::MemoryOptimization => "Optimizing Memory",
            Self::Writing => "Writing Output",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Returns the typical weight of this stage in the overall pipeline (0.0 - 1.0).
    ///
    /// Weights of the working stages sum to 1.0.
    pub fn weight(&self) -> f32 {
        match self {
            Self::LoadingData => 0.15,
            Self::Imputation => 0.25,
            Self::TextCleaning => 0.20,
            Self::Merging => 0.15,
            Self::MemoryOptimization => 0.15,
            Self::Writing => 0.10,
            Self::Complete => 0.0,
            Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::LoadingData => 0.0,
            Self::Imputation => 0.15,
            Self::TextCleaning => 0.40,
            Self::Merging => 0.60,
            Self::MemoryOptimization => 0.75,
            Self::Writing => 0.90,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// A progress notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Current pipeline stage
    pub stage: PipelineStage,

    /// Optional sub-stage description (e.g., "Table: items")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Human-readable message describing current activity
    pub message: String,
}

impl ProgressUpdate {
    /// Creates a new progress update for a stage without sub-stage info.
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress.clamp(0.0, 1.0));
        Self {
            stage,
            sub_stage: None,
            progress: progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    /// Creates a new progress update with sub-stage information.
    pub fn with_sub_stage(
        stage: PipelineStage,
        sub_stage: impl Into<String>,
        stage_progress: f32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            sub_stage: Some(sub_stage.into()),
            ..Self::new(stage, stage_progress, message)
        }
    }

    /// Creates a completion progress update.
    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(PipelineStage::Complete, 1.0, message)
    }

    /// Creates a failed progress update for an error raised during `during`.
    pub fn failed(during: PipelineStage, message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Failed,
            sub_stage: Some(during.display_name().to_string()),
            progress: during.base_progress(),
            message: message.into(),
        }
    }
}

/// Receives progress updates from the pipeline.
///
/// Implementations must be `Send + Sync` so a pipeline can run on a worker
/// thread while its reporter forwards updates elsewhere.
pub trait ProgressReporter: Send + Sync {
    /// Called before each stage and once at the end of a run.
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    /// Creates a new closure-based progress reporter.
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

/// Reporter that forwards every update to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingProgressReporter;

impl ProgressReporter for LoggingProgressReporter {
    fn report(&self, update: ProgressUpdate) {
        match update.stage {
            PipelineStage::Failed => tracing::error!("{}", update.message),
            _ => tracing::info!("{}", update.message),
        }
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
static_assertions::assert_impl_all!(LoggingProgressReporter: ProgressReporter);
