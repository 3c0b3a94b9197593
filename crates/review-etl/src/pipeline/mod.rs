//! Pipeline module.
//!
//! This module provides the pipeline driver, the merge and memory
//! optimization stages, and progress reporting.

mod builder;
pub mod merger;
pub mod optimizer;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder};
pub use merger::Merger;
pub use optimizer::MemoryOptimizer;
pub use progress::{
    ClosureProgressReporter, LoggingProgressReporter, PipelineStage, ProgressReporter,
    ProgressUpdate,
};
