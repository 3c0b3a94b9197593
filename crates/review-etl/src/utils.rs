//! Shared utilities for the pipeline stages.
//!
//! Dtype classification, column statistics and null filling used by more
//! than one stage live here.

use polars::prelude::*;
use std::collections::HashMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is a signed or unsigned integer.
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Check if a DataType is floating point.
#[inline]
pub fn is_float_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Storage width of a numeric dtype in bits, `None` for everything else.
pub fn numeric_bit_width(dtype: &DataType) -> Option<u8> {
    match dtype {
        DataType::Int8 | DataType::UInt8 => Some(8),
        DataType::Int16 | DataType::UInt16 => Some(16),
        DataType::Int32 | DataType::UInt32 | DataType::Float32 => Some(32),
        DataType::Int64 | DataType::UInt64 | DataType::Float64 => Some(64),
        _ => None,
    }
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Most frequent non-null value of a string Series.
///
/// Ties go to the value whose first occurrence comes earliest in the column.
pub fn string_mode(series: &Series) -> Option<String> {
    let str_chunked = series.str().ok()?;

    // value -> (count, first index)
    let mut value_counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (idx, val) in str_chunked.into_iter().enumerate() {
        if let Some(val) = val {
            value_counts.entry(val).or_insert((0, idx)).0 += 1;
        }
    }

    value_counts
        .into_iter()
        .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
            count_a.cmp(count_b).then(first_b.cmp(first_a))
        })
        .map(|(val, _)| val.to_string())
}

/// Count rows that contain at least one null across all columns.
pub fn rows_with_nulls(df: &DataFrame) -> usize {
    if df.height() == 0 {
        return 0;
    }
    let mut any_null = BooleanChunked::full("any_null".into(), false, df.height());
    for col in df.get_columns() {
        let mask = col.as_materialized_series().is_null();
        any_null = &any_null | &mask;
    }
    any_null.num_trues()
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series, keeping its original dtype.
///
/// Only the fill value is cast to the column's dtype; existing values are
/// selected as they are, so `UInt64` values above `i64::MAX` survive. The
/// fill value must be representable in that dtype.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    if series.null_count() == 0 {
        return Ok(series.clone());
    }
    let fill = Series::new(series.name().clone(), [fill_value])
        .strict_cast(series.dtype())?
        .new_from_index(0, series.len());

    series.zip_with(&series.is_not_null(), &fill)
}

/// Fill null values in a string Series with a specific value.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let values: Vec<&str> = series
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();

    Ok(Series::new(series.name().clone(), values))
}

// =============================================================================
// Tests
// =============================================================================
