//! Statistical fill values: mode for categorical columns, mean for numeric ones.

use crate::error::{EtlError, Result};
use crate::utils::{fill_numeric_nulls, fill_string_nulls, string_mode};
use polars::prelude::*;
use tracing::debug;

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill a categorical column with its most frequent value.
    pub fn apply_mode(df: &mut DataFrame, col_name: &str) -> Result<()> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        if series.null_count() == 0 {
            return Ok(());
        }

        let mode_val = string_mode(&series).ok_or_else(|| no_fill_value(col_name))?;
        let filled = fill_string_nulls(&series, &mode_val)?;
        df.replace(col_name, filled)?;

        debug!("Filled '{}' with mode: '{}'", col_name, mode_val);
        Ok(())
    }

    /// Fill an integer column with the rounded mean of its non-null values.
    pub fn apply_integer_mean(df: &mut DataFrame, col_name: &str) -> Result<()> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        if series.null_count() == 0 {
            return Ok(());
        }

        let mean_val = series.mean().ok_or_else(|| no_fill_value(col_name))?;
        let fill_value = mean_val.round();
        let filled = fill_numeric_nulls(&series, fill_value)?;
        df.replace(col_name, filled)?;

        debug!(
            "Filled '{}' with mean: {:.2} (stored as {})",
            col_name, mean_val, fill_value
        );
        Ok(())
    }

    /// Fill a float column with the mean of its non-null values.
    pub fn apply_float_mean(df: &mut DataFrame, col_name: &str) -> Result<()> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        if series.null_count() == 0 {
            return Ok(());
        }

        let mean_val = series.mean().ok_or_else(|| no_fill_value(col_name))?;
        let filled = fill_numeric_nulls(&series, mean_val)?;
        df.replace(col_name, filled)?;

        debug!("Filled '{}' with mean: {:.2}", col_name, mean_val);
        Ok(())
    }
}

fn no_fill_value(col_name: &str) -> EtlError {
    EtlError::Imputation {
        column: col_name.to_string(),
        reason: "no non-missing values to derive a fill value from".to_string(),
    }
}
