//! Static Chart Renderer
//! Draws a figure to PNG or SVG with plotters.
//!
//! Layout:
//! 1. Title caption centered on top
//! 2. Price trace (line segments or candlesticks) on a date x axis
//! 3. Signal markers on top of the price trace
//! 4. Legend in the upper right corner

use crate::charts::figure::{CandlestickTrace, Figure, ScatterMode, ScatterTrace, Trace};
use crate::error::{ChartError, Result};
use chrono::{DateTime, NaiveDateTime};
use image::{ImageFormat, RgbImage};
use plotters::chart::SeriesAnno;
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::io::Cursor;
use std::ops::Range;
use std::path::Path;
use tracing::warn;

const PLOTLY_BLUE: RGBColor = RGBColor(99, 110, 250);
const GRID: RGBColor = RGBColor(235, 240, 248);
const DAY_SECS: f64 = 86_400.0;
const Y_PADDING: f64 = 0.05;

type PriceChart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

// CSS color names accepted in figures
const NAMED_COLORS: [(&str, RGBColor); 20] = [
    ("black", RGBColor(0, 0, 0)),
    ("white", RGBColor(255, 255, 255)),
    ("red", RGBColor(255, 0, 0)),
    ("green", RGBColor(0, 128, 0)),
    ("blue", RGBColor(0, 0, 255)),
    ("purple", RGBColor(128, 0, 128)),
    ("orange", RGBColor(255, 165, 0)),
    ("teal", RGBColor(0, 128, 128)),
    ("magenta", RGBColor(255, 0, 255)),
    ("yellow", RGBColor(255, 255, 0)),
    ("cyan", RGBColor(0, 255, 255)),
    ("lime", RGBColor(0, 255, 0)),
    ("navy", RGBColor(0, 0, 128)),
    ("maroon", RGBColor(128, 0, 0)),
    ("olive", RGBColor(128, 128, 0)),
    ("gray", RGBColor(128, 128, 128)),
    ("grey", RGBColor(128, 128, 128)),
    ("silver", RGBColor(192, 192, 192)),
    ("brown", RGBColor(165, 42, 42)),
    ("pink", RGBColor(255, 192, 203)),
];

/// Parse a CSS color name, `#rrggbb` or `#rgb`.
pub fn parse_color(text: &str) -> Option<RGBColor> {
    let text = text.trim().to_ascii_lowercase();

    if let Some(hex) = text.strip_prefix('#') {
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        return match hex.len() {
            6 => Some(RGBColor(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => Some(RGBColor(
                channel(&hex[0..1])? * 17,
                channel(&hex[1..2])? * 17,
                channel(&hex[2..3])? * 17,
            )),
            _ => None,
        };
    }

    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == text)
        .map(|(_, color)| *color)
}

fn color_or_black(text: &str) -> RGBColor {
    parse_color(text).unwrap_or_else(|| {
        warn!(color = text, "unknown color, drawing in black");
        BLACK
    })
}

/// Marker outline drawn for a Plotly symbol name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Circle,
    Square,
    Diamond,
    TriangleUp,
    TriangleDown,
    Cross,
    X,
}

impl MarkerShape {
    /// Unknown symbols draw as circles.
    pub fn from_symbol(symbol: &str) -> Self {
        match symbol.trim_end_matches("-open") {
            "square" => MarkerShape::Square,
            "diamond" => MarkerShape::Diamond,
            "triangle-up" => MarkerShape::TriangleUp,
            "triangle-down" => MarkerShape::TriangleDown,
            "cross" => MarkerShape::Cross,
            "x" => MarkerShape::X,
            _ => MarkerShape::Circle,
        }
    }
}

fn render_err<E: std::fmt::Display>(err: E) -> ChartError {
    ChartError::Render(err.to_string())
}

fn to_seconds(ts: &NaiveDateTime) -> f64 {
    ts.and_utc().timestamp_millis() as f64 / 1000.0
}

fn format_timestamp(secs: f64) -> String {
    DateTime::from_timestamp(secs.floor() as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// Split a series at missing values so gaps are not bridged.
fn segments(x: &[NaiveDateTime], y: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut current = Vec::new();

    for (ts, value) in x.iter().zip(y.iter()) {
        match value {
            Some(v) => current.push((to_seconds(ts), *v)),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Draw the figure onto any plotters drawing area.
    pub fn render<DB: DrawingBackend>(
        figure: &Figure,
        root: &DrawingArea<DB, Shift>,
    ) -> Result<()> {
        root.fill(&WHITE).map_err(render_err)?;

        let (x_range, y_range) = Self::ranges(figure);
        let layout = &figure.layout;
        let x_desc = layout.xaxis.title.as_ref().map_or("", |t| t.text.as_str());
        let y_desc = layout.yaxis.title.as_ref().map_or("", |t| t.text.as_str());

        let mut chart = ChartBuilder::on(root)
            .caption(&layout.title.text, ("sans-serif", 28).into_font())
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(x_range, y_range)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .light_line_style(&GRID)
            .bold_line_style(&GRID)
            .x_desc(x_desc)
            .y_desc(y_desc)
            .x_labels(8)
            .y_labels(10)
            .x_label_formatter(&|ts| format_timestamp(*ts))
            .y_label_formatter(&|v| format!("{:.2}", v))
            .draw()
            .map_err(render_err)?;

        for trace in &figure.data {
            match trace {
                Trace::Scatter(t) if t.mode == ScatterMode::Lines => {
                    Self::draw_line(&mut chart, t)?
                }
                Trace::Scatter(t) => Self::draw_markers(&mut chart, t)?,
                Trace::Candlestick(t) => Self::draw_candles(&mut chart, t)?,
            }
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(render_err)?;

        Ok(())
    }

    /// Write a PNG file at the figure's layout size.
    pub fn render_png(figure: &Figure, path: &Path) -> Result<()> {
        std::fs::write(path, Self::png_bytes(figure)?)?;
        Ok(())
    }

    /// Write an SVG file at the figure's layout size.
    pub fn render_svg(figure: &Figure, path: &Path) -> Result<()> {
        let size = (figure.layout.width, figure.layout.height);
        let root = SVGBackend::new(path, size).into_drawing_area();
        Self::render(figure, &root)?;
        root.present().map_err(render_err)
    }

    /// Encode the figure as PNG in memory.
    pub fn png_bytes(figure: &Figure) -> Result<Vec<u8>> {
        let (width, height) = (figure.layout.width, figure.layout.height);
        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            Self::render(figure, &root)?;
            root.present().map_err(render_err)?;
        }

        let image = RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| ChartError::Render("pixel buffer size mismatch".to_string()))?;
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// X range in epoch seconds and padded y range over every trace.
    fn ranges(figure: &Figure) -> (Range<f64>, Range<f64>) {
        let mut x_min = f64::INFINITY;
        let mut x_max = f64::NEG_INFINITY;
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;

        for trace in &figure.data {
            for ts in trace.x() {
                let x = to_seconds(ts);
                x_min = x_min.min(x);
                x_max = x_max.max(x);
            }

            let values: Box<dyn Iterator<Item = &Option<f64>>> = match trace {
                Trace::Scatter(t) => Box::new(t.y.iter()),
                Trace::Candlestick(t) => Box::new(t.low.iter().chain(t.high.iter())),
            };
            for v in values.flatten() {
                y_min = y_min.min(*v);
                y_max = y_max.max(*v);
            }
        }

        let x_range = if !x_min.is_finite() {
            0.0..DAY_SECS
        } else if x_min == x_max {
            x_min - DAY_SECS..x_max + DAY_SECS
        } else {
            x_min..x_max
        };

        let y_range = if !y_min.is_finite() {
            0.0..1.0
        } else if y_min == y_max {
            y_min - 1.0..y_max + 1.0
        } else {
            let pad = (y_max - y_min) * Y_PADDING;
            y_min - pad..y_max + pad
        };

        (x_range, y_range)
    }

    fn draw_line<DB: DrawingBackend>(
        chart: &mut PriceChart<'_, DB>,
        trace: &ScatterTrace,
    ) -> Result<()> {
        let line = trace.line.as_ref();
        let color = line
            .and_then(|l| l.color.as_deref())
            .map_or(PLOTLY_BLUE, color_or_black);
        let width = line.map_or(2.0, |l| l.width).round().max(1.0) as u32;

        for (i, segment) in segments(&trace.x, &trace.y).into_iter().enumerate() {
            let anno = chart
                .draw_series(LineSeries::new(segment, color.stroke_width(width)))
                .map_err(render_err)?;
            if i == 0 {
                anno.label(trace.name.as_str()).legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            }
        }
        Ok(())
    }

    fn draw_candles<DB: DrawingBackend>(
        chart: &mut PriceChart<'_, DB>,
        trace: &CandlestickTrace,
    ) -> Result<()> {
        let up = trace.increasing.color().map_or(GREEN, color_or_black);
        let down = trace.decreasing.color().map_or(RED, color_or_black);

        let candles: Vec<(f64, f64, f64, f64, f64)> = trace
            .x
            .iter()
            .enumerate()
            .filter_map(|(i, ts)| {
                Some((
                    to_seconds(ts),
                    trace.open.get(i).copied().flatten()?,
                    trace.high.get(i).copied().flatten()?,
                    trace.low.get(i).copied().flatten()?,
                    trace.close.get(i).copied().flatten()?,
                ))
            })
            .collect();
        if candles.is_empty() {
            return Ok(());
        }

        let plot_width = chart.plotting_area().dim_in_pixel().0 as f64;
        let body_width = (plot_width / candles.len() as f64 * 0.8 * trace.whiskerwidth)
            .clamp(1.0, 30.0) as u32;

        chart
            .draw_series(candles.iter().map(|&(x, open, high, low, close)| {
                CandleStick::new(x, open, high, low, close, up.filled(), down.filled(), body_width)
            }))
            .map_err(render_err)?
            .label(trace.name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 20, y + 5)], up.filled()));
        Ok(())
    }

    fn draw_markers<DB: DrawingBackend>(
        chart: &mut PriceChart<'_, DB>,
        trace: &ScatterTrace,
    ) -> Result<()> {
        let Some(marker) = trace.marker.as_ref() else {
            return Ok(());
        };

        let points: Vec<(f64, f64)> = trace
            .x
            .iter()
            .zip(trace.y.iter())
            .filter_map(|(ts, y)| y.map(|y| (to_seconds(ts), y)))
            .collect();

        let color = color_or_black(&marker.color);
        let shape = MarkerShape::from_symbol(&marker.symbol);
        let radius = (marker.size / 2.0).round().max(1.0) as i32;

        Self::draw_shapes(chart, &points, shape, radius, color.filled())?;
        let outline = marker.line.color.as_deref().map_or(BLACK, color_or_black);
        let outline_width = marker.line.width.round().max(1.0) as u32;
        Self::draw_shapes(chart, &points, shape, radius, outline.stroke_width(outline_width))?
            .label(trace.name.as_str())
            .legend(move |(x, y)| Circle::new((x + 10, y), 5, color.filled()));
        Ok(())
    }

    fn draw_shapes<'c, 'a: 'c, DB: DrawingBackend>(
        chart: &'c mut PriceChart<'a, DB>,
        points: &[(f64, f64)],
        shape: MarkerShape,
        r: i32,
        style: ShapeStyle,
    ) -> Result<&'c mut SeriesAnno<'a, DB>> {
        let points = points.iter().copied();
        let anno = match shape {
            MarkerShape::Circle => chart.draw_series(points.map(|p| Circle::new(p, r, style))),
            MarkerShape::TriangleUp => {
                chart.draw_series(points.map(|p| TriangleMarker::new(p, r, style)))
            }
            MarkerShape::TriangleDown => {
                chart.draw_series(points.map(|p| TriangleMarker::new(p, -r, style)))
            }
            MarkerShape::Square => chart.draw_series(points.map(|p| {
                EmptyElement::at(p) + Rectangle::new([(-r, -r), (r, r)], style)
            })),
            MarkerShape::Diamond => chart.draw_series(points.map(|p| {
                EmptyElement::at(p) + Polygon::new(vec![(0, -r), (r, 0), (0, r), (-r, 0)], style)
            })),
            MarkerShape::Cross => chart.draw_series(points.map(|p| {
                EmptyElement::at(p)
                    + PathElement::new(vec![(-r, 0), (r, 0)], style.stroke_width(3))
                    + PathElement::new(vec![(0, -r), (0, r)], style.stroke_width(3))
            })),
            MarkerShape::X => {
                chart.draw_series(points.map(|p| Cross::new(p, r, style.stroke_width(3))))
            }
        };
        anno.map_err(render_err)
    }
}
