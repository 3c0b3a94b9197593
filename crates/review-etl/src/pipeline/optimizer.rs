//! Storage narrowing for numeric columns.
//!
//! Integer columns move to `Int8` or `Int16` when their range allows it,
//! float columns move to `Float32`. Values never change and a column is
//! never widened.

use crate::error::Result;
use crate::table::{ColumnKind, Table};
use crate::types::ColumnNarrowing;
use crate::utils::numeric_bit_width;
use polars::prelude::*;
use tracing::{debug, info};

/// Narrows numeric column storage to the smallest type that holds every value.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryOptimizer;

impl MemoryOptimizer {
    /// Narrow every qualifying column.
    pub fn optimize(&self, table: Table) -> Result<Table> {
        self.optimize_with_report(table).map(|(table, _)| table)
    }

    /// Narrow every qualifying column and report what changed.
    pub fn optimize_with_report(&self, table: Table) -> Result<(Table, Vec<ColumnNarrowing>)> {
        let size_before = table.estimated_size();
        let mut df = table.frame().clone();
        let mut narrowings = Vec::new();

        for name in table.columns_of_kind(ColumnKind::Integer) {
            let series = df.column(&name)?.as_materialized_series().clone();
            if let Some(target) = integer_target(&series)? {
                narrowings.push(narrow_column(&mut df, &series, &target)?);
            }
        }
        for name in table.columns_of_kind(ColumnKind::Float) {
            let series = df.column(&name)?.as_materialized_series().clone();
            if let Some(target) = float_target(&series)? {
                narrowings.push(narrow_column(&mut df, &series, &target)?);
            }
        }

        let table = table.replace_frame(df);
        info!(
            "Memory usage: {} -> {} bytes ({} columns narrowed)",
            size_before,
            table.estimated_size(),
            narrowings.len()
        );
        Ok((table, narrowings))
    }
}

fn narrow_column(df: &mut DataFrame, series: &Series, target: &DataType) -> Result<ColumnNarrowing> {
    let name = series.name().as_str();
    let narrowed = series.cast(target)?;
    debug!("Narrowed '{}' from {} to {}", name, series.dtype(), target);
    df.replace(name, narrowed)?;
    Ok(ColumnNarrowing::new(
        name,
        series.dtype().to_string(),
        target.to_string(),
    ))
}

/// Narrowest signed integer type holding the column's range, if narrower than now.
fn integer_target(series: &Series) -> Result<Option<DataType>> {
    let Some(current) = numeric_bit_width(series.dtype()) else {
        return Ok(None);
    };
    let values = series.cast(&DataType::Int64)?;
    // unsigned values beyond i64 turn into nulls
    if values.null_count() != series.null_count() {
        return Ok(None);
    }

    let Some((min, max)) = values.i64()?.into_iter().flatten().fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    }) else {
        return Ok(None);
    };

    let (target, width) = if min >= i8::MIN as i64 && max <= i8::MAX as i64 {
        (DataType::Int8, 8)
    } else if min >= i16::MIN as i64 && max <= i16::MAX as i64 {
        (DataType::Int16, 16)
    } else {
        return Ok(None);
    };

    if width >= current {
        return Ok(None);
    }
    Ok(Some(target))
}

/// `Float32` when every value lies within its finite range and the column is wider.
fn float_target(series: &Series) -> Result<Option<DataType>> {
    if series.dtype() != &DataType::Float64 {
        return Ok(None);
    }

    let mut seen = false;
    for value in series.f64()?.into_iter().flatten() {
        if !value.is_finite() || value.abs() > f32::MAX as f64 {
            return Ok(None);
        }
        seen = true;
    }

    Ok(seen.then_some(DataType::Float32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn optimize(df: DataFrame) -> (Table, Vec<ColumnNarrowing>) {
        let table = Table::from_frame(df).unwrap();
        MemoryOptimizer.optimize_with_report(table).unwrap()
    }

    fn dtype(table: &Table, column: &str) -> DataType {
        table.frame().column(column).unwrap().dtype().clone()
    }

    #[test]
    fn test_integer_ranges() {
        let (table, narrowings) = optimize(
            df![
                "small" => [-50i64, 100, 0],
                "medium" => [-50i64, 40000, 0],
                "large" => [-50i64, 1_000_000, 0],
            ]
            .unwrap(),
        );

        assert_eq!(dtype(&table, "small"), DataType::Int8);
        assert_eq!(dtype(&table, "medium"), DataType::Int16);
        assert_eq!(dtype(&table, "large"), DataType::Int64);
        assert_eq!(narrowings.len(), 2);
    }

    #[test]
    fn test_integer_boundaries() {
        let (table, _) = optimize(
            df![
                "i8_edge" => [-128i64, 127],
                "i8_over" => [-129i64, 127],
                "i16_edge" => [-32768i64, 32767],
                "i16_over" => [0i64, 32768],
            ]
            .unwrap(),
        );

        assert_eq!(dtype(&table, "i8_edge"), DataType::Int8);
        assert_eq!(dtype(&table, "i8_over"), DataType::Int16);
        assert_eq!(dtype(&table, "i16_edge"), DataType::Int16);
        assert_eq!(dtype(&table, "i16_over"), DataType::Int64);
    }

    #[test]
    fn test_values_unchanged() {
        let (table, _) = optimize(
            df![
                "rating" => [1i64, 5, 3, -2],
                "price" => [9.5, 12.25, 0.0, -3.5],
            ]
            .unwrap(),
        );

        let ratings: Vec<i64> = table
            .frame()
            .column("rating")
            .unwrap()
            .cast(&DataType::Int64)
            .unwrap()
            .i64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(ratings, vec![1, 5, 3, -2]);

        let prices: Vec<f64> = table
            .frame()
            .column("price")
            .unwrap()
            .cast(&DataType::Float64)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(prices, vec![9.5, 12.25, 0.0, -3.5]);
        assert_eq!(dtype(&table, "price"), DataType::Float32);
    }

    #[test]
    fn test_float_out_of_f32_range_kept() {
        let (table, narrowings) = optimize(
            df![
                "huge" => [1.0e300, 2.0],
                "infinite" => [f64::INFINITY, 1.0],
            ]
            .unwrap(),
        );

        assert_eq!(dtype(&table, "huge"), DataType::Float64);
        assert_eq!(dtype(&table, "infinite"), DataType::Float64);
        assert!(narrowings.is_empty());
    }

    #[test]
    fn test_never_widens() {
        let (table, narrowings) = optimize(
            df![
                "tiny" => [1i8, 2],
                "short" => [1000i16, 2000],
                "single" => [1.5f32, 2.5],
            ]
            .unwrap(),
        );

        assert_eq!(dtype(&table, "tiny"), DataType::Int8);
        assert_eq!(dtype(&table, "short"), DataType::Int16);
        assert_eq!(dtype(&table, "single"), DataType::Float32);
        assert!(narrowings.is_empty());
    }

    #[test]
    fn test_empty_and_all_null_columns_untouched() {
        let (table, narrowings) = optimize(
            df![
                "empty" => Vec::<i64>::new(),
            ]
            .unwrap(),
        );
        assert_eq!(dtype(&table, "empty"), DataType::Int64);
        assert!(narrowings.is_empty());

        let (table, _) = optimize(df!["nulls" => [Option::<f64>::None, None]].unwrap());
        assert_eq!(dtype(&table, "nulls"), DataType::Float64);
    }

    #[test]
    fn test_kinds_and_text_untouched() {
        let (table, narrowings) = optimize(
            df![
                "asin" => ["A1", "A2"],
                "rating" => [4i64, 5],
            ]
            .unwrap(),
        );

        assert_eq!(dtype(&table, "asin"), DataType::String);
        assert_eq!(table.kind("rating"), Some(ColumnKind::Integer));
        assert_eq!(narrowings, vec![ColumnNarrowing::new("rating", "i64", "i8")]);
    }

    #[test]
    fn test_optimize_reduces_estimated_size() {
        let table = Table::from_frame(
            df![
                "rating" => (0..1000i64).map(|v| v % 5).collect::<Vec<_>>(),
            ]
            .unwrap(),
        )
        .unwrap();
        let before = table.estimated_size();

        let after = MemoryOptimizer.optimize(table).unwrap();
        assert!(after.estimated_size() < before);
    }
}
