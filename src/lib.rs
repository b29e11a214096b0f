//! Signal Chart - interactive price charts with signal markers
//!
//! Builds a Plotly-compatible figure from a time-indexed Polars table: a line or
//! candlestick price trace plus one marker trace per boolean signal column.

pub mod charts;
pub mod config;
pub mod data;
pub mod error;
pub mod export;

pub use charts::{equity_chart_with_signals, ChartPlotter, Figure, StaticChartRenderer, Trace};
pub use config::{ChartOptions, ChartType};
pub use data::{DataLoader, DateRange, TimeSeriesTable};
pub use error::{ChartError, Result};
pub use export::{export_figure, ExportFormat};
