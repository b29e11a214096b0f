//! Charts module - Figure building and rendering

pub mod figure;
mod plotter;
mod renderer;
mod style;

pub use figure::{CandlestickTrace, Figure, Layout, ScatterMode, ScatterTrace, Trace};
pub use plotter::{equity_chart_with_signals, ChartPlotter};
pub use renderer::{parse_color, MarkerShape, StaticChartRenderer};
pub use style::{extend_by_doubling, MarkerPalette, DEFAULT_COLORS, DEFAULT_SYMBOLS};
