//! Chart Options Module
//! Builder configuration with defaults, loadable from a JSON file.

use crate::error::{ChartError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_TITLE: &str = "Interactive Equity Curve with Technical Signals";

/// Primary price trace type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChartType {
    /// Connected line over the price column
    #[default]
    Line,
    /// OHLC bars with wicks
    Candlestick,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Candlestick => "candlestick",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "line" => Ok(ChartType::Line),
            "candlestick" => Ok(ChartType::Candlestick),
            other => Err(ChartError::InvalidChartType(other.to_string())),
        }
    }
}

impl TryFrom<String> for ChartType {
    type Error = ChartError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ChartType> for String {
    fn from(value: ChartType) -> Self {
        value.as_str().to_string()
    }
}

/// Everything the chart builder needs besides the table and the date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    pub chart_type: ChartType,
    pub price_column: String,
    pub num_signals: usize,
    pub signal_columns: Option<Vec<String>>,
    pub title: String,
    pub marker_symbols: Option<Vec<String>>,
    pub marker_colors: Option<Vec<String>>,
    pub increasing_color: String,
    pub decreasing_color: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            chart_type: ChartType::Line,
            price_column: "close".to_string(),
            num_signals: 0,
            signal_columns: None,
            title: DEFAULT_TITLE.to_string(),
            marker_symbols: None,
            marker_colors: None,
            increasing_color: "green".to_string(),
            decreasing_color: "red".to_string(),
        }
    }
}

impl ChartOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signal columns and keep `num_signals` in step with them.
    pub fn with_signals<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        self.num_signals = columns.len();
        self.signal_columns = Some(columns);
        self
    }

    pub fn with_chart_type(mut self, chart_type: ChartType) -> Self {
        self.chart_type = chart_type;
        self
    }

    pub fn with_price_column(mut self, column: impl Into<String>) -> Self {
        self.price_column = column.into();
        self
    }

    /// Load options from a JSON file. Missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
