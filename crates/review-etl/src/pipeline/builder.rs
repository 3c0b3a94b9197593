//! Main pipeline module.
//!
//! This module provides the [`Pipeline`] struct and its builder. A pipeline
//! loads the items and reviews tables, imputes both, normalizes their text
//! columns, merges them, narrows numeric storage and writes the result.

use crate::cleaner::TextNormalizer;
use crate::config::PipelineConfig;
use crate::dataset::{DatasetStore, write_csv};
use crate::error::{EtlError, Result, ResultExt};
use crate::imputers::Imputer;
use crate::pipeline::merger::Merger;
use crate::pipeline::optimizer::MemoryOptimizer;
use crate::pipeline::progress::{
    ClosureProgressReporter, LoggingProgressReporter, PipelineStage, ProgressReporter,
    ProgressUpdate,
};
use crate::table::Table;
use crate::types::RunSummary;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// The review ETL pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use review_etl::{LocalDatasetStore, Pipeline, PipelineConfig};
/// use std::sync::Arc;
///
/// let config = PipelineConfig::from_yaml_file("config.yml")?;
///
/// let summary = Pipeline::builder()
///     .config(config)
///     .dataset_store(Arc::new(LocalDatasetStore::new("datasets")))
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .run()?;
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    dataset_store: Option<Arc<dyn DatasetStore>>,
    progress_reporter: Arc<dyn ProgressReporter>,
    imputer: Imputer,
    normalizer: TextNormalizer,
    merger: Merger,
    optimizer: MemoryOptimizer,
}

static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load both tables from the dataset store, process them and write the output.
    ///
    /// # Errors
    ///
    /// Fails if no dataset store was configured, or with the first stage
    /// error, annotated with the stage's name.
    pub fn run(&self) -> Result<RunSummary> {
        let start_time = Instant::now();
        let started_at = Utc::now();
        info!("Starting review pipeline...");

        let result = self.run_internal().map(|mut summary| {
            summary.started_at = Some(started_at);
            summary.duration_ms = start_time.elapsed().as_millis() as u64;
            summary
        });

        match result {
            Ok(summary) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Pipeline completed in {}ms",
                    summary.duration_ms
                )));
                Ok(summary)
            }
            Err(e) => {
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Run every in-memory stage on an already loaded pair of tables.
    ///
    /// No files are read or written. The summary carries stage shapes,
    /// memory figures and narrowings but no output path or timing.
    pub fn process(&self, items: Table, reviews: Table) -> Result<(Table, RunSummary)> {
        let mut summary = RunSummary::new();
        summary.items_rows = items.height();
        summary.reviews_rows = reviews.height();

        // Imputation
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Imputation,
            0.0,
            "Data Imputation...",
        ));
        let items = self.stage(PipelineStage::Imputation, || {
            self.imputer.impute(items).context("items")
        })?;
        let reviews = self.stage(PipelineStage::Imputation, || {
            self.imputer.impute(reviews).context("reviews")
        })?;
        summary.record_stage("imputation:items", items.height(), items.width());
        summary.record_stage("imputation:reviews", reviews.height(), reviews.width());

        // Text cleaning
        let items = self.clean_text(items, "items", &self.config.items_text_columns, 0.0)?;
        let reviews = self.clean_text(reviews, "reviews", &self.config.reviews_text_columns, 0.5)?;

        // Merging
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Merging,
            0.0,
            "Merging Dataset...",
        ));
        let merged = self.stage(PipelineStage::Merging, || {
            self.merger.merge(items, reviews, &self.config.join_key)
        })?;
        summary.record_stage("merging", merged.height(), merged.width());

        // Memory optimization
        self.report_progress(ProgressUpdate::new(
            PipelineStage::MemoryOptimization,
            0.0,
            "Optimizing memory occupied by data...",
        ));
        summary.memory_before_bytes = merged.estimated_size();
        let (optimized, narrowings) = self.stage(PipelineStage::MemoryOptimization, || {
            self.optimizer.optimize_with_report(merged)
        })?;
        summary.memory_after_bytes = optimized.estimated_size();
        summary.narrowings = narrowings;
        summary.record_stage("memory_optimization", optimized.height(), optimized.width());

        summary.rows_after = optimized.height();
        summary.columns_after = optimized.width();
        Ok((optimized, summary))
    }

    fn run_internal(&self) -> Result<RunSummary> {
        let store = self.dataset_store.as_ref().ok_or_else(|| {
            EtlError::Config("no dataset store configured".to_string())
        })?;
        let config = &self.config;

        self.report_progress(ProgressUpdate::with_sub_stage(
            PipelineStage::LoadingData,
            "Table: items",
            0.0,
            format!("Loading {}...", config.items_data_file),
        ));
        let items = self.stage(PipelineStage::LoadingData, || {
            store.load_table(&config.items_data_file_id, &config.items_data_file)
        })?;

        self.report_progress(ProgressUpdate::with_sub_stage(
            PipelineStage::LoadingData,
            "Table: reviews",
            0.5,
            format!("Loading {}...", config.reviews_data_file),
        ));
        let reviews = self.stage(PipelineStage::LoadingData, || {
            store.load_table(&config.reviews_data_file_id, &config.reviews_data_file)
        })?;

        let (table, mut summary) = self.process(items, reviews)?;

        self.report_progress(ProgressUpdate::new(
            PipelineStage::Writing,
            0.0,
            format!("Writing {}...", config.output_path.display()),
        ));
        self.stage(PipelineStage::Writing, || {
            write_csv(&table, &config.output_path)
        })?;
        summary.output_path = Some(config.output_path.clone());

        Ok(summary)
    }

    fn clean_text(
        &self,
        mut table: Table,
        table_name: &str,
        columns: &[String],
        stage_progress: f32,
    ) -> Result<Table> {
        self.report_progress(ProgressUpdate::with_sub_stage(
            PipelineStage::TextCleaning,
            format!("Table: {}", table_name),
            stage_progress,
            "Data Cleaning...",
        ));
        for column in columns {
            table = self.stage(PipelineStage::TextCleaning, || {
                self.normalizer
                    .normalize_text(table, column)
                    .context(table_name)
            })?;
            debug!("Cleaned {}.{}", table_name, column);
        }
        Ok(table)
    }

    /// Run one stage, tagging its error with the stage name and reporting the failure.
    fn stage<T>(&self, stage: PipelineStage, f: impl FnOnce() -> Result<T>) -> Result<T> {
        f().map_err(|e| {
            let e = e.with_context(stage.display_name());
            self.report_progress(ProgressUpdate::failed(stage, e.to_string()));
            e
        })
    }

    /// Forward a progress update to the configured reporter.
    fn report_progress(&self, update: ProgressUpdate) {
        self.progress_reporter.report(update);
    }
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started. A configuration is required;
/// without a progress reporter, updates go to the log.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    dataset_store: Option<Arc<dyn DatasetStore>>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the store that provides local copies of the input datasets.
    ///
    /// Only [`Pipeline::run`] needs one; [`Pipeline::process`] works on
    /// tables the caller already holds.
    pub fn dataset_store(mut self, store: Arc<dyn DatasetStore>) -> Self {
        self.dataset_store = Some(store);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let pipeline = Pipeline::builder()
    ///     .config(config)
    ///     .on_progress(|update| {
    ///         println!("{:?}: {}", update.stage, update.message);
    ///     })
    ///     .build()?;
    /// ```
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if no configuration was given or it is invalid.
    pub fn build(self) -> Result<Pipeline> {
        let config = self
            .config
            .ok_or_else(|| EtlError::Config("no pipeline configuration provided".to_string()))?;
        config.validate()?;

        Ok(Pipeline {
            imputer: Imputer::new(config.imputation_order),
            normalizer: TextNormalizer,
            merger: Merger::new(config.dropped_column.clone()),
            optimizer: MemoryOptimizer,
            config,
            dataset_store: self.dataset_store,
            progress_reporter: self
                .progress_reporter
                .unwrap_or_else(|| Arc::new(LoggingProgressReporter)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImputationOrder;
    use polars::prelude::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use std::sync::Mutex;

    fn config() -> PipelineConfig {
        PipelineConfig::builder()
            .items("items-ds", "items.csv")
            .reviews("reviews-ds", "reviews.csv")
            .build()
            .unwrap()
    }

    fn items() -> Table {
        Table::from_frame(
            df![
                "asin" => ["A1", "A2", "A2"],
                "title" => [Some("Good-Product X1Y2"), Some("Phone case"), Some("Phone case")],
                "price" => [Some(10.0), None, None],
            ]
            .unwrap(),
        )
        .unwrap()
    }

    fn reviews() -> Table {
        Table::from_frame(
            df![
                "asin" => ["A1", "A1", "A3"],
                "title" => ["Great!", "Bad", "Meh"],
                "body" => ["Works 100% fine", "Broke in a day", "ok"],
                "rating" => [Some(5i64), None, Some(3)],
                "helpfulVotes" => [1i64, 2, 3],
            ]
            .unwrap(),
        )
        .unwrap()
    }

    struct FailingStore;

    impl DatasetStore for FailingStore {
        fn local_copy(&self, dataset_id: &str) -> Result<PathBuf> {
            Err(EtlError::DatasetFetch {
                dataset_id: dataset_id.to_string(),
                reason: "offline".to_string(),
            })
        }
    }

    #[test]
    fn test_builder_requires_config() {
        let err = Pipeline::builder().build().err().unwrap();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_builder_applies_config() {
        let config = PipelineConfig::builder()
            .items("i", "items.csv")
            .reviews("r", "reviews.csv")
            .imputation_order(ImputationOrder::DropThenFill)
            .build()
            .unwrap();

        let pipeline = Pipeline::builder().config(config).build().unwrap();
        assert_eq!(pipeline.imputer.order(), ImputationOrder::DropThenFill);
        assert_eq!(pipeline.config().join_key, "asin");
    }

    #[test]
    fn test_process_end_to_end() {
        let pipeline = Pipeline::builder().config(config()).build().unwrap();

        let (table, summary) = pipeline.process(items(), reviews()).unwrap();

        assert_eq!(table.height(), 2);
        assert!(!table.has_column("helpfulVotes"));
        assert!(table.has_column("title_x"));
        assert!(table.has_column("title_y"));
        assert_eq!(table.null_count(), 0);

        let item_titles: Vec<Option<&str>> = table
            .frame()
            .column("title_x")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(item_titles, vec![Some("Good Product"), Some("Good Product")]);

        assert_eq!(
            table.frame().column("rating").unwrap().dtype(),
            &DataType::Int8
        );
        assert_eq!(summary.items_rows, 3);
        assert_eq!(summary.rows_after, 2);
        assert_eq!(summary.stages.len(), 4);
        assert!(summary.memory_after_bytes <= summary.memory_before_bytes);
        assert!(summary.output_path.is_none());
    }

    #[test]
    fn test_progress_messages_in_order() {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = messages.clone();

        let pipeline = Pipeline::builder()
            .config(config())
            .on_progress(move |update| sink.lock().unwrap().push(update.message))
            .build()
            .unwrap();
        pipeline.process(items(), reviews()).unwrap();

        let messages = messages.lock().unwrap();
        assert_eq!(
            *messages,
            vec![
                "Data Imputation...",
                "Data Cleaning...",
                "Data Cleaning...",
                "Merging Dataset...",
                "Optimizing memory occupied by data...",
            ]
        );
    }

    #[test]
    fn test_stage_errors_carry_stage_name() {
        let config = PipelineConfig::builder()
            .items("i", "items.csv")
            .reviews("r", "reviews.csv")
            .items_text_columns(vec!["description".to_string()])
            .build()
            .unwrap();

        let stages = Arc::new(Mutex::new(Vec::new()));
        let sink = stages.clone();
        let pipeline = Pipeline::builder()
            .config(config)
            .on_progress(move |update| sink.lock().unwrap().push(update.stage))
            .build()
            .unwrap();

        let err = pipeline.process(items(), reviews()).unwrap_err();
        assert_eq!(err.error_code(), "SCHEMA_ERROR");
        assert!(err.to_string().starts_with("Data Cleaning: items:"));
        assert_eq!(stages.lock().unwrap().last(), Some(&PipelineStage::Failed));
    }

    #[test]
    fn test_run_without_store_is_config_error() {
        let pipeline = Pipeline::builder().config(config()).build().unwrap();
        let err = pipeline.run().unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_run_reports_fetch_failure() {
        let failures = Arc::new(Mutex::new(Vec::new()));
        let sink = failures.clone();

        let pipeline = Pipeline::builder()
            .config(config())
            .dataset_store(Arc::new(FailingStore))
            .on_progress(move |update| {
                if update.stage == PipelineStage::Failed {
                    sink.lock().unwrap().push(update);
                }
            })
            .build()
            .unwrap();

        let err = pipeline.run().unwrap_err();
        assert!(matches!(err.root(), EtlError::DatasetFetch { .. }));
        assert!(err.to_string().starts_with("Loading Data:"));

        let failures = failures.lock().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].sub_stage.as_deref(), Some("Loading Data"));
    }
}
