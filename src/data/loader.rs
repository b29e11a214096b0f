//! CSV Data Loader Module
//! Loads a time-indexed table from CSV using Polars.

use crate::data::TimeSeriesTable;
use crate::error::Result;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

/// Handles CSV file loading with Polars.
pub struct DataLoader {
    table: Option<TimeSeriesTable>,
    file_path: Option<PathBuf>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            table: None,
            file_path: None,
        }
    }

    /// Read a CSV file and index it by `index_column`.
    pub fn load_csv(
        &mut self,
        file_path: impl AsRef<Path>,
        index_column: &str,
    ) -> Result<&TimeSeriesTable> {
        let file_path = file_path.as_ref();
        let df = LazyCsvReader::new(file_path)
            .with_infer_schema_length(Some(10000))
            .with_try_parse_dates(true)
            .finish()?
            .collect()?;

        info!(
            path = %file_path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded CSV"
        );

        let table = TimeSeriesTable::new(df, index_column)?;
        self.file_path = Some(file_path.to_path_buf());
        Ok(&*self.table.insert(table))
    }

    /// Column names with their Polars types, index column included.
    pub fn get_column_summary(&self) -> Vec<(String, String)> {
        self.table
            .as_ref()
            .map(|table| {
                table
                    .frame()
                    .get_columns()
                    .iter()
                    .map(|col| (col.name().to_string(), col.dtype().to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Boolean columns, the usual signal candidates.
    pub fn get_signal_columns(&self) -> Vec<String> {
        let Some(table) = &self.table else {
            return Vec::new();
        };

        table
            .frame()
            .get_columns()
            .iter()
            .filter(|col| matches!(col.dtype(), DataType::Boolean))
            .map(|col| col.name().to_string())
            .collect()
    }

    pub fn get_row_count(&self) -> usize {
        self.table.as_ref().map(|t| t.height()).unwrap_or(0)
    }

    pub fn get_table(&self) -> Option<&TimeSeriesTable> {
        self.table.as_ref()
    }

    pub fn get_file_path(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }
}
