//! Figure Export Module
//! Writes a figure as interactive HTML, Plotly JSON, PNG or SVG.

use crate::charts::{Figure, StaticChartRenderer};
use crate::error::{ChartError, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Html,
    Json,
    Png,
    Svg,
}

impl ExportFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Html => "html",
            ExportFormat::Json => "json",
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "html" | "htm" => Ok(ExportFormat::Html),
            "json" => Ok(ExportFormat::Json),
            "png" => Ok(ExportFormat::Png),
            "svg" => Ok(ExportFormat::Svg),
            other => Err(ChartError::Render(format!("unsupported export format '{other}'"))),
        }
    }
}

/// Write `figure` to `path`. Without an explicit format the extension decides, defaulting to HTML.
pub fn export_figure(
    figure: &Figure,
    path: &Path,
    format: Option<ExportFormat>,
) -> Result<PathBuf> {
    let format = format
        .or_else(|| ExportFormat::from_path(path))
        .unwrap_or(ExportFormat::Html);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    match format {
        ExportFormat::Html => fs::write(path, figure.to_html()?)?,
        ExportFormat::Json => fs::write(path, figure.to_json_pretty()?)?,
        ExportFormat::Png => StaticChartRenderer::render_png(figure, path)?,
        ExportFormat::Svg => StaticChartRenderer::render_svg(figure, path)?,
    }

    info!(path = %path.display(), %format, traces = figure.data.len(), "exported chart");
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChartOptions;
    use crate::charts::ChartPlotter;
    use crate::data::{DateRange, TimeSeriesTable};
    use polars::prelude::*;

    fn figure() -> Figure {
        let frame = DataFrame::new(vec![
            Column::new("date".into(), vec!["2024-01-01", "2024-01-02"]),
            Column::new("close".into(), vec![10.0, 11.0]),
        ])
        .unwrap();
        let table = TimeSeriesTable::new(frame, "date").unwrap();
        ChartPlotter::build(&table, &DateRange::all(), &ChartOptions::default()).unwrap()
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("a/chart.PNG")), Some(ExportFormat::Png));
        assert_eq!(ExportFormat::from_path(Path::new("chart.htm")), Some(ExportFormat::Html));
        assert_eq!(ExportFormat::from_path(Path::new("chart.pdf")), None);
        assert_eq!(ExportFormat::from_path(Path::new("chart")), None);
    }

    #[test]
    fn writes_html_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let figure = figure();

        let html = export_figure(&figure, &dir.path().join("out/chart.html"), None).unwrap();
        assert!(fs::read_to_string(html).unwrap().contains("Plotly.newPlot"));

        let json = export_figure(&figure, &dir.path().join("chart.txt"), Some(ExportFormat::Json))
            .unwrap();
        let back: Figure = serde_json::from_str(&fs::read_to_string(json).unwrap()).unwrap();
        assert_eq!(back, figure);
    }

    #[test]
    fn writes_png_and_svg() {
        let dir = tempfile::tempdir().unwrap();
        let figure = figure();

        let png = export_figure(&figure, &dir.path().join("img/chart.png"), None).unwrap();
        assert!(fs::read(png).unwrap().starts_with(b"\x89PNG\r\n\x1a\n"));

        let svg = export_figure(&figure, &dir.path().join("chart.svg"), None).unwrap();
        assert!(fs::read_to_string(svg).unwrap().contains("<svg"));
    }

    #[test]
    fn unknown_extension_defaults_to_html() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_figure(&figure(), &dir.path().join("chart.out"), None).unwrap();
        assert!(fs::read_to_string(path).unwrap().starts_with("<!DOCTYPE html>"));
    }
}
