//! Data Processor Module
//! Extracts typed price and signal columns from a DataFrame.

use crate::error::{ChartError, Result};
use polars::prelude::*;

/// Columns a candlestick chart needs, in reporting order.
pub const OHLC_COLUMNS: [&str; 4] = ["open", "high", "low", "close"];

/// Column extraction helpers used by the chart builder.
pub struct DataProcessor;

impl DataProcessor {
    /// Names from `required` that the frame lacks, in the order given.
    pub fn missing_columns(df: &DataFrame, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| df.column(name).is_err())
            .map(|name| name.to_string())
            .collect()
    }

    /// Numeric column as f64. Nulls and non-finite values become `None`.
    pub fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
        let column = df
            .column(name)
            .map_err(|_| ChartError::ColumnNotFound(name.to_string()))?;
        let values = column.cast(&DataType::Float64)?;
        let ca = values.f64()?;

        Ok(ca
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect())
    }

    /// Signal column as flags. Nulls count as false; numeric columns are true when nonzero.
    pub fn flag_values(df: &DataFrame, name: &str) -> Result<Vec<bool>> {
        let column = df
            .column(name)
            .map_err(|_| ChartError::ColumnNotFound(name.to_string()))?;

        let flags = match column.dtype() {
            DataType::Boolean => column.clone(),
            dtype if dtype.is_integer() || dtype.is_float() => {
                column.cast(&DataType::Boolean)?
            }
            _ => return Err(ChartError::NotBoolean(name.to_string())),
        };

        Ok(flags
            .bool()?
            .into_iter()
            .map(|v| v.unwrap_or(false))
            .collect())
    }
}
