//! Inner join of two cleaned tables.

use crate::error::{EtlError, Result};
use crate::table::{ColumnKind, Table};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

/// Suffix appended to non-key columns of the left table that clash with the right.
pub const LEFT_SUFFIX: &str = "_x";
/// Suffix appended to non-key columns of the right table that clash with the left.
pub const RIGHT_SUFFIX: &str = "_y";

/// Joins two tables on a key column.
#[derive(Debug, Clone, Default)]
pub struct Merger {
    dropped_column: Option<String>,
}

impl Merger {
    /// Create a merger that removes `dropped_column` from the result.
    pub fn new(dropped_column: Option<String>) -> Self {
        Self { dropped_column }
    }

    /// Inner-join `left` and `right` on `join_key`.
    ///
    /// Repeated keys produce the cross product of matching rows. Columns
    /// present on both sides (other than the key) are suffixed `_x` / `_y`.
    /// Rows with any missing value after the join are dropped.
    pub fn merge(&self, left: Table, right: Table, join_key: &str) -> Result<Table> {
        for (side, table) in [("left", &left), ("right", &right)] {
            if !table.has_column(join_key) {
                return Err(EtlError::Join(format!(
                    "join key '{}' not found in {} table",
                    join_key, side
                )));
            }
        }

        let (mut left_df, left_kinds) = left.into_parts();
        let (mut right_df, right_kinds) = right.into_parts();

        let key_kind = left_kinds[join_key];
        if right_kinds[join_key] != key_kind {
            return Err(EtlError::Join(format!(
                "join key '{}' is {} on the left but {} on the right",
                join_key, key_kind, right_kinds[join_key]
            )));
        }
        let left_key_dtype = left_df.column(join_key)?.dtype().clone();
        if right_df.column(join_key)?.dtype() != &left_key_dtype {
            let cast = right_df
                .column(join_key)?
                .as_materialized_series()
                .cast(&left_key_dtype)?;
            right_df.replace(join_key, cast)?;
        }

        if let Some(dropped) = &self.dropped_column {
            left_df = drop_if_present(left_df, dropped)?;
            right_df = drop_if_present(right_df, dropped)?;
        }

        let left_names = column_names(&left_df);
        let right_names = column_names(&right_df);
        let mut kinds: HashMap<String, ColumnKind> = HashMap::new();
        kinds.insert(join_key.to_string(), key_kind);

        for name in &left_names {
            if name == join_key {
                continue;
            }
            let mut out_name = name.clone();
            if right_names.contains(name) {
                out_name = suffixed(name, LEFT_SUFFIX, &left_names, &right_names)?;
                left_df.rename(name, out_name.as_str().into())?;
            }
            kinds.insert(out_name, left_kinds[name]);
        }
        for name in &right_names {
            if name == join_key {
                continue;
            }
            let mut out_name = name.clone();
            if left_names.contains(name) {
                out_name = suffixed(name, RIGHT_SUFFIX, &left_names, &right_names)?;
                right_df.rename(name, out_name.as_str().into())?;
            }
            kinds.insert(out_name, right_kinds[name]);
        }

        let (left_rows, right_rows) = (left_df.height(), right_df.height());
        let joined = left_df
            .lazy()
            .join(
                right_df.lazy(),
                [col(join_key)],
                [col(join_key)],
                JoinArgs::new(JoinType::Inner),
            )
            .collect()?;
        debug!(
            "Joined {} x {} rows on '{}' into {} rows",
            left_rows,
            right_rows,
            join_key,
            joined.height()
        );

        let joined_rows = joined.height();
        let merged = joined.drop_nulls::<String>(None)?;
        if merged.height() < joined_rows {
            debug!(
                "Dropped {} merged rows with missing values",
                joined_rows - merged.height()
            );
        }

        info!("Merged dataset shape: {:?}", merged.shape());
        Table::with_kinds(merged, kinds)
    }
}

/// `name` with `suffix` appended, failing when either table already has that column.
fn suffixed(name: &str, suffix: &str, left: &[String], right: &[String]) -> Result<String> {
    let out_name = format!("{}{}", name, suffix);
    if left.contains(&out_name) || right.contains(&out_name) {
        return Err(EtlError::Schema(format!(
            "overlapping column '{}' would be renamed to '{}', which already exists",
            name, out_name
        )));
    }
    Ok(out_name)
}

fn drop_if_present(df: DataFrame, column: &str) -> Result<DataFrame> {
    if df.column(column).is_ok() {
        debug!("Dropping column '{}'", column);
        Ok(df.drop(column)?)
    } else {
        Ok(df)
    }
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}
