//! Error types shared by the whole library.

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("chart_type must be either 'line' or 'candlestick' (got '{0}')")]
    InvalidChartType(String),

    #[error(
        "For candlestick chart, DataFrame must include [open, high, low, close]. Missing: [{}]",
        .missing.join(", ")
    )]
    MissingColumns { missing: Vec<String> },

    #[error("{0}")]
    SignalConfigMismatch(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Column '{0}' is not a boolean signal column")]
    NotBoolean(String),

    #[error("Invalid time index: {0}")]
    InvalidIndex(String),

    #[error("Invalid date bound: {0}")]
    InvalidDate(String),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to render chart: {0}")]
    Render(String),

    #[error("Failed to encode image: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, ChartError>;
