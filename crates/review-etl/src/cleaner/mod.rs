//! Text cleaning for free-text columns.
//!
//! [`TextNormalizer`] rewrites one designated column of a table, stripping
//! catalog codes, non-letter characters and single-letter words. All other
//! columns pass through untouched.

mod sanitizers;

use crate::error::{EtlError, Result};
use crate::table::{ColumnKind, Table};
use polars::prelude::*;
use tracing::debug;

/// Normalizes free-text columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    /// Normalize a single text value.
    pub fn normalize(value: &str) -> String {
        sanitizers::normalize_text_value(value)
    }

    /// Normalize every cell of `column`.
    ///
    /// The column must exist, be categorical, and hold no missing values.
    pub fn normalize_text(&self, table: Table, column: &str) -> Result<Table> {
        match table.kind(column) {
            None => {
                return Err(EtlError::Schema(format!(
                    "text column '{}' not found",
                    column
                )));
            }
            Some(ColumnKind::Categorical) => {}
            Some(other) => {
                return Err(EtlError::TypeMismatch {
                    column: column.to_string(),
                    expected: "string".to_string(),
                    found: other.to_string(),
                });
            }
        }

        let mut df = table.frame().clone();
        let series = df.column(column)?.as_materialized_series();
        if series.null_count() > 0 {
            return Err(EtlError::TypeMismatch {
                column: column.to_string(),
                expected: "string".to_string(),
                found: format!("{} missing", series.null_count()),
            });
        }

        let cleaned: Vec<String> = series
            .str()?
            .into_iter()
            .map(|v| v.map(Self::normalize).unwrap_or_default())
            .collect();
        let cleaned = Series::new(series.name().clone(), cleaned);
        df.replace(column, cleaned)?;

        debug!("Normalized text column '{}' ({} rows)", column, df.height());
        Ok(table.replace_frame(df))
    }
}
