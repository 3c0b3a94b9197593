use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Run Summary Types
// ============================================================================

/// Human-readable summary of one pipeline run.
///
/// Serialized as JSON by the CLI's `--json` mode.
///
/// # Example
///
/// ```rust,ignore
/// use review_etl::RunSummary;
///
/// let summary: RunSummary = pipeline.run()?;
/// println!("Wrote {} rows in {}ms", summary.rows_after, summary.duration_ms);
/// println!("Memory: {} -> {} bytes", summary.memory_before_bytes, summary.memory_after_bytes);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// When the run started.
    pub started_at: Option<DateTime<Utc>>,
    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    /// Rows in the loaded items table.
    pub items_rows: usize,
    /// Rows in the loaded reviews table.
    pub reviews_rows: usize,
    /// Rows in the final table.
    pub rows_after: usize,
    /// Columns in the final table.
    pub columns_after: usize,

    /// Shape after each stage, in execution order.
    pub stages: Vec<StageSummary>,

    /// Estimated size of the merged table before memory optimization.
    pub memory_before_bytes: usize,
    /// Estimated size of the final table.
    pub memory_after_bytes: usize,
    /// Columns whose storage was narrowed.
    pub narrowings: Vec<ColumnNarrowing>,

    /// Where the output artifact was written, if it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the shape of a table after a stage.
    pub fn record_stage(&mut self, stage: impl Into<String>, rows: usize, columns: usize) {
        self.stages.push(StageSummary {
            stage: stage.into(),
            rows,
            columns,
        });
    }

    /// Bytes saved by memory optimization.
    pub fn memory_saved_bytes(&self) -> usize {
        self.memory_before_bytes.saturating_sub(self.memory_after_bytes)
    }

    /// Percentage of memory saved by optimization.
    pub fn memory_saved_percentage(&self) -> f32 {
        if self.memory_before_bytes == 0 {
            0.0
        } else {
            (self.memory_saved_bytes() as f32 / self.memory_before_bytes as f32) * 100.0
        }
    }
}

/// Table shape after one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSummary {
    pub stage: String,
    pub rows: usize,
    pub columns: usize,
}

/// A column whose storage type was narrowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnNarrowing {
    pub column: String,
    /// Storage type before narrowing, e.g. `i64`.
    pub from: String,
    /// Storage type after narrowing, e.g. `i8`.
    pub to: String,
}

impl ColumnNarrowing {
    pub fn new(column: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            from: from.into(),
            to: to.into(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
