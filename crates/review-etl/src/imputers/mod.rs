//! Imputation module for handling duplicates and missing values.
//!
//! [`Imputer`] applies the table-level policy (per-column fill, residual
//! null removal, duplicate removal) in the configured [`ImputationOrder`].
//! [`StatisticalImputer`] provides the per-column mode and mean fills.

mod statistical;

pub use statistical::StatisticalImputer;

use crate::config::ImputationOrder;
use crate::error::{EtlError, Result};
use crate::table::{ColumnKind, Table};
use crate::utils::rows_with_nulls;
use polars::prelude::*;
use tracing::{debug, info};

/// Removes duplicates and fills or drops missing values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Imputer {
    order: ImputationOrder,
}

impl Imputer {
    pub fn new(order: ImputationOrder) -> Self {
        Self { order }
    }

    pub fn order(&self) -> ImputationOrder {
        self.order
    }

    /// Impute a table, returning a table with no missing values.
    ///
    /// A zero-row table passes through unchanged. A column with every cell
    /// missing has no fill value and fails with [`EtlError::Imputation`].
    pub fn impute(&self, table: Table) -> Result<Table> {
        if table.height() == 0 {
            debug!("Empty table, nothing to impute");
            return Ok(table);
        }

        Self::check_fillable(&table)?;

        let rows_before = table.height();
        let (df, kinds) = table.into_parts();

        let df = match self.order {
            // statistics see every loaded row, duplicates included
            ImputationOrder::FillThenDrop => {
                let df = fill_columns(df, &kinds)?;
                drop_null_rows(df)?
            }
            ImputationOrder::DropThenFill => {
                let df = drop_duplicates(df)?;
                let df = drop_null_rows(df)?;
                fill_columns(df, &kinds)?
            }
        };
        let df = drop_duplicates(df)?;

        info!(
            "Imputation complete: {} -> {} rows",
            rows_before,
            df.height()
        );

        Table::with_kinds(df, kinds)
    }

    fn check_fillable(table: &Table) -> Result<()> {
        let frame = table.frame();
        for col in frame.get_columns() {
            if col.null_count() == frame.height() {
                return Err(EtlError::Imputation {
                    column: col.name().to_string(),
                    reason: "every value is missing".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Remove exact duplicate rows, keeping the first occurrence in order.
fn drop_duplicates(df: DataFrame) -> Result<DataFrame> {
    let before = df.height();
    let df = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
    let removed = before - df.height();
    if removed > 0 {
        debug!("Removed {} duplicate rows", removed);
    }
    Ok(df)
}

/// Remove every row that still contains a missing value.
fn drop_null_rows(df: DataFrame) -> Result<DataFrame> {
    let with_nulls = rows_with_nulls(&df);
    if with_nulls == 0 {
        return Ok(df);
    }
    debug!("Dropping {} rows with missing values", with_nulls);
    Ok(df.drop_nulls::<String>(None)?)
}

fn fill_columns(
    mut df: DataFrame,
    kinds: &std::collections::HashMap<String, ColumnKind>,
) -> Result<DataFrame> {
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    for name in &names {
        match kinds.get(name) {
            Some(ColumnKind::Categorical) => StatisticalImputer::apply_mode(&mut df, name)?,
            Some(ColumnKind::Integer) => StatisticalImputer::apply_integer_mean(&mut df, name)?,
            Some(ColumnKind::Float) => StatisticalImputer::apply_float_mean(&mut df, name)?,
            None => {
                return Err(EtlError::Schema(format!(
                    "no semantic kind for column '{}'",
                    name
                )));
            }
        }
    }
    Ok(df)
}
