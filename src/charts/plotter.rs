//! Chart Plotter Module
//! Builds the price + signal figure from a time-indexed table.

use crate::charts::figure::{
    Axis, CandlestickTrace, DirectionStyle, Figure, Layout, Legend, LineStyle, MarkerStyle,
    RangeSlider, ScatterMode, ScatterTrace, Title, Trace,
};
use crate::charts::style::MarkerPalette;
use crate::config::{ChartOptions, ChartType};
use crate::data::{DataProcessor, DateRange, TimeSeriesTable, OHLC_COLUMNS};
use crate::error::{ChartError, Result};
use tracing::debug;

pub const CHART_WIDTH: u32 = 1600;
pub const CHART_HEIGHT: u32 = 1000;
pub const WHISKER_WIDTH: f64 = 0.9;
pub const MARKER_SIZE: f64 = 12.0;
const PRICE_LINE_WIDTH: f64 = 2.0;
const GRID_COLOR: &str = "#EBF0F8";

/// Builds interactive price charts with signal overlays.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Check the options against the table before anything is built.
    pub fn validate(table: &TimeSeriesTable, options: &ChartOptions) -> Result<()> {
        if options.chart_type == ChartType::Candlestick {
            let missing = DataProcessor::missing_columns(table.frame(), &OHLC_COLUMNS);
            if !missing.is_empty() {
                return Err(ChartError::MissingColumns { missing });
            }
        }

        if options.num_signals > 0 && options.signal_columns.is_none() {
            return Err(ChartError::SignalConfigMismatch(
                "signal_column_names must be provided when num_signals > 0".to_string(),
            ));
        }

        if let Some(names) = &options.signal_columns {
            if names.len() != options.num_signals {
                return Err(ChartError::SignalConfigMismatch(format!(
                    "Length of signal_column_names ({}) must match num_signals ({})",
                    names.len(),
                    options.num_signals
                )));
            }
        }

        Ok(())
    }

    /// Build the figure for the rows of `table` inside `range`.
    pub fn build(
        table: &TimeSeriesTable,
        range: &DateRange,
        options: &ChartOptions,
    ) -> Result<Figure> {
        Self::validate(table, options)?;

        let filtered = table.slice(range)?;
        debug!(
            rows = filtered.height(),
            total = table.height(),
            chart_type = %options.chart_type,
            "filtered table to date range"
        );

        let palette = MarkerPalette::resolve(
            options.marker_symbols.as_deref(),
            options.marker_colors.as_deref(),
            options.num_signals,
        );

        let mut data = Vec::with_capacity(options.num_signals + 1);
        data.push(match options.chart_type {
            ChartType::Line => Self::line_trace(&filtered, &options.price_column)?,
            ChartType::Candlestick => Self::candlestick_trace(&filtered, options)?,
        });

        let signal_columns = options.signal_columns.as_deref().unwrap_or_default();
        if !signal_columns.is_empty() {
            let prices = DataProcessor::float_values(filtered.frame(), &options.price_column)?;
            for (i, column) in signal_columns.iter().enumerate() {
                let trace = Self::signal_trace(&filtered, &prices, column, &palette, i)?;
                debug!(signal = %column, points = trace.x.len(), "added signal trace");
                data.push(Trace::Scatter(trace));
            }
        }

        Ok(Figure {
            data,
            layout: Self::layout(&options.title),
        })
    }

    fn line_trace(table: &TimeSeriesTable, price_column: &str) -> Result<Trace> {
        let y = DataProcessor::float_values(table.frame(), price_column)?;

        Ok(Trace::Scatter(ScatterTrace {
            x: table.timestamps().to_vec(),
            y,
            mode: ScatterMode::Lines,
            name: format!("{} Price", capitalize(price_column)),
            line: Some(LineStyle {
                width: PRICE_LINE_WIDTH,
                color: None,
            }),
            marker: None,
        }))
    }

    fn candlestick_trace(table: &TimeSeriesTable, options: &ChartOptions) -> Result<Trace> {
        let frame = table.frame();

        Ok(Trace::Candlestick(CandlestickTrace {
            x: table.timestamps().to_vec(),
            open: DataProcessor::float_values(frame, "open")?,
            high: DataProcessor::float_values(frame, "high")?,
            low: DataProcessor::float_values(frame, "low")?,
            close: DataProcessor::float_values(frame, "close")?,
            name: "OHLC".to_string(),
            increasing: DirectionStyle::colored(&options.increasing_color),
            decreasing: DirectionStyle::colored(&options.decreasing_color),
            whiskerwidth: WHISKER_WIDTH,
        }))
    }

    /// Markers at the price of every row where `column` is set.
    fn signal_trace(
        table: &TimeSeriesTable,
        prices: &[Option<f64>],
        column: &str,
        palette: &MarkerPalette,
        index: usize,
    ) -> Result<ScatterTrace> {
        let flags = DataProcessor::flag_values(table.frame(), column)?;

        let (x, y) = table
            .timestamps()
            .iter()
            .zip(prices.iter())
            .zip(flags.iter())
            .filter(|(_, &flag)| flag)
            .map(|((ts, price), _)| (*ts, *price))
            .unzip();

        Ok(ScatterTrace {
            x,
            y,
            mode: ScatterMode::Markers,
            name: column.to_string(),
            line: None,
            marker: Some(MarkerStyle {
                color: palette.color(index).to_string(),
                symbol: palette.symbol(index).to_string(),
                size: MARKER_SIZE,
                line: LineStyle {
                    width: 1.0,
                    color: Some("black".to_string()),
                },
            }),
        })
    }

    fn layout(title: &str) -> Layout {
        Layout {
            title: Title::new(title),
            xaxis: Axis {
                title: Some(Title::new("Date")),
                axis_type: Some("date".to_string()),
                rangeslider: Some(RangeSlider { visible: false }),
                gridcolor: Some(GRID_COLOR.to_string()),
                ..Axis::default()
            },
            yaxis: Axis {
                title: Some(Title::new("Price")),
                autorange: Some(true),
                fixedrange: Some(false),
                gridcolor: Some(GRID_COLOR.to_string()),
                zerolinecolor: Some(GRID_COLOR.to_string()),
                ..Axis::default()
            },
            yaxis2: Axis {
                anchor: Some("x".to_string()),
                overlaying: Some("y".to_string()),
                side: Some("right".to_string()),
                ..Axis::default()
            },
            legend: Legend {
                orientation: "h".to_string(),
                yanchor: "bottom".to_string(),
                y: 1.02,
                xanchor: "right".to_string(),
                x: 1.0,
            },
            width: CHART_WIDTH,
            height: CHART_HEIGHT,
            hovermode: "closest".to_string(),
            dragmode: "zoom".to_string(),
            paper_bgcolor: "white".to_string(),
            plot_bgcolor: "white".to_string(),
        }
    }
}

/// Upper-case the first character and lower-case the rest.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Parse the date bounds and build the chart in one call.
pub fn equity_chart_with_signals(
    table: &TimeSeriesTable,
    start_date: &str,
    end_date: &str,
    options: &ChartOptions,
) -> Result<Figure> {
    ChartPlotter::validate(table, options)?;
    let range = DateRange::between(start_date, end_date)?;
    ChartPlotter::build(table, &range, options)
}
