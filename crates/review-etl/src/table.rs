//! Table model: a DataFrame plus an explicit semantic kind per column.
//!
//! Kinds are assigned once, when a table is built from a freshly loaded
//! frame. Later stages read the kind instead of guessing from whatever
//! storage dtype the column currently has, so a column narrowed to `Int8`
//! is still an [`ColumnKind::Integer`] column.

use crate::error::{EtlError, Result};
use crate::utils::{is_float_dtype, is_integer_dtype};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Semantic kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Free or categorical text
    Categorical,
    /// Whole numbers
    Integer,
    /// Real numbers
    Float,
}

impl ColumnKind {
    /// Kind for a storage dtype, `None` when the dtype must be converted first.
    pub fn from_dtype(dtype: &DataType) -> Option<Self> {
        if is_integer_dtype(dtype) {
            Some(Self::Integer)
        } else if is_float_dtype(dtype) {
            Some(Self::Float)
        } else if matches!(dtype, DataType::String) {
            Some(Self::Categorical)
        } else {
            None
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Categorical => "categorical",
            Self::Integer => "integer",
            Self::Float => "float",
        };
        f.write_str(name)
    }
}

/// A table of named, semantically typed columns.
#[derive(Debug, Clone)]
pub struct Table {
    frame: DataFrame,
    kinds: HashMap<String, ColumnKind>,
}

impl Table {
    /// Build a table from a loaded frame, tagging each column.
    ///
    /// Columns whose dtype is neither numeric nor string (booleans, all-null
    /// columns, temporal values) are cast to strings and tagged categorical.
    pub fn from_frame(mut frame: DataFrame) -> Result<Self> {
        let mut kinds = HashMap::with_capacity(frame.width());
        let names: Vec<String> = frame
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect();

        for name in names {
            let dtype = frame.column(&name)?.dtype().clone();
            let kind = match ColumnKind::from_dtype(&dtype) {
                Some(kind) => kind,
                None => {
                    let as_text = frame
                        .column(&name)?
                        .as_materialized_series()
                        .cast(&DataType::String)
                        .map_err(|e| {
                            EtlError::Schema(format!(
                                "column '{}' has unsupported type {:?}: {}",
                                name, dtype, e
                            ))
                        })?;
                    frame.replace(&name, as_text)?;
                    ColumnKind::Categorical
                }
            };
            kinds.insert(name, kind);
        }

        Ok(Self { frame, kinds })
    }

    /// Build a table with explicit kinds. Every frame column must have a kind.
    pub fn with_kinds(frame: DataFrame, kinds: HashMap<String, ColumnKind>) -> Result<Self> {
        for name in frame.get_column_names() {
            if !kinds.contains_key(name.as_str()) {
                return Err(EtlError::Schema(format!(
                    "no semantic kind for column '{}'",
                    name
                )));
            }
        }
        let kinds = kinds
            .into_iter()
            .filter(|(name, _)| frame.column(name).is_ok())
            .collect();
        Ok(Self { frame, kinds })
    }

    /// Same kinds, new frame. Kinds of columns the frame no longer has are dropped.
    pub(crate) fn replace_frame(self, frame: DataFrame) -> Self {
        let kinds = self
            .kinds
            .into_iter()
            .filter(|(name, _)| frame.column(name).is_ok())
            .collect();
        Self { frame, kinds }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub(crate) fn into_parts(self) -> (DataFrame, HashMap<String, ColumnKind>) {
        (self.frame, self.kinds)
    }

    pub fn kind(&self, column: &str) -> Option<ColumnKind> {
        self.kinds.get(column).copied()
    }

    /// Column names in frame order.
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Column names of a given kind, in frame order.
    pub fn columns_of_kind(&self, kind: ColumnKind) -> Vec<String> {
        self.column_names()
            .into_iter()
            .filter(|name| self.kind(name) == Some(kind))
            .collect()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.frame.column(column).is_ok()
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    /// Total number of missing cells.
    pub fn null_count(&self) -> usize {
        self.frame
            .get_columns()
            .iter()
            .map(|col| col.null_count())
            .sum()
    }

    /// Estimated in-memory size of the column data in bytes.
    pub fn estimated_size(&self) -> usize {
        self.frame.estimated_size()
    }
}
