//! Signal Chart - command line front end
//!
//! Loads a CSV, builds the price/signal chart and writes it as HTML, JSON, PNG or SVG.

use anyhow::{Context, Result};
use clap::Parser;
use signal_chart::{
    export_figure, ChartOptions, ChartPlotter, ChartType, DataLoader, DateRange, ExportFormat,
};
use std::path::PathBuf;
use tracing::{info, Level};

#[derive(Parser)]
#[command(
    name = "signal-chart",
    version,
    about = "Interactive price chart with signal markers from a CSV time series"
)]
struct Cli {
    /// CSV file with a timestamp column, price columns and boolean signal columns
    #[arg(long)]
    csv: PathBuf,

    /// Name of the timestamp column
    #[arg(long, default_value = "date")]
    index: String,

    /// First timestamp to include (inclusive)
    #[arg(long)]
    start: Option<String>,

    /// Last timestamp to include (inclusive; a bare date covers the whole day)
    #[arg(long)]
    end: Option<String>,

    /// JSON file with base chart options; flags below override it
    #[arg(long)]
    options: Option<PathBuf>,

    /// Price trace type: line or candlestick
    #[arg(long)]
    chart_type: Option<ChartType>,

    /// Column used for the line trace and marker heights
    #[arg(long)]
    price_column: Option<String>,

    /// Comma-separated signal columns
    #[arg(long, value_delimiter = ',')]
    signals: Option<Vec<String>>,

    /// Declared signal count; defaults to the number of --signals
    #[arg(long)]
    num_signals: Option<usize>,

    #[arg(long)]
    title: Option<String>,

    /// Comma-separated Plotly marker symbols
    #[arg(long, value_delimiter = ',')]
    marker_symbols: Option<Vec<String>>,

    /// Comma-separated marker colors
    #[arg(long, value_delimiter = ',')]
    marker_colors: Option<Vec<String>>,

    #[arg(long)]
    increasing_color: Option<String>,

    #[arg(long)]
    decreasing_color: Option<String>,

    /// Output file
    #[arg(long, default_value = "chart.html")]
    out: PathBuf,

    /// Output format (html, json, png, svg); inferred from --out when omitted
    #[arg(long)]
    format: Option<ExportFormat>,

    /// Open the result with the system default application
    #[arg(long)]
    open: bool,

    /// Print the table's columns and exit
    #[arg(long)]
    list_columns: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn chart_options(&self) -> Result<ChartOptions> {
        let mut options = match &self.options {
            Some(path) => ChartOptions::from_json_file(path)
                .with_context(|| format!("Failed to read options from {}", path.display()))?,
            None => ChartOptions::default(),
        };

        if let Some(chart_type) = self.chart_type {
            options.chart_type = chart_type;
        }
        if let Some(column) = &self.price_column {
            options.price_column = column.clone();
        }
        if let Some(signals) = &self.signals {
            options.num_signals = signals.len();
            options.signal_columns = Some(signals.clone());
        }
        if let Some(count) = self.num_signals {
            options.num_signals = count;
        }
        if let Some(title) = &self.title {
            options.title = title.clone();
        }
        if let Some(symbols) = &self.marker_symbols {
            options.marker_symbols = Some(symbols.clone());
        }
        if let Some(colors) = &self.marker_colors {
            options.marker_colors = Some(colors.clone());
        }
        if let Some(color) = &self.increasing_color {
            options.increasing_color = color.clone();
        }
        if let Some(color) = &self.decreasing_color {
            options.decreasing_color = color.clone();
        }

        Ok(options)
    }
}

/// Column listing for `--list-columns`, with the index and signal candidates marked.
fn print_columns(loader: &DataLoader) {
    let path = loader.get_file_path().map(|p| p.display().to_string());
    let index = loader.get_table().map(|t| t.index_column()).unwrap_or_default();
    let signals = loader.get_signal_columns();

    println!(
        "{} ({} rows)",
        path.as_deref().unwrap_or("<no file>"),
        loader.get_row_count()
    );
    for (name, dtype) in loader.get_column_summary() {
        let role = if name == index {
            "index"
        } else if signals.contains(&name) {
            "signal"
        } else {
            ""
        };
        println!("{name}\t{dtype}\t{role}");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let mut loader = DataLoader::new();
    loader
        .load_csv(&cli.csv, &cli.index)
        .with_context(|| format!("Failed to load {}", cli.csv.display()))?;

    if cli.list_columns {
        print_columns(&loader);
        return Ok(());
    }

    let options = cli.chart_options()?;
    let range = DateRange::parse(cli.start.as_deref(), cli.end.as_deref())?;
    let table = loader.get_table().context("No table loaded")?;

    let figure = ChartPlotter::build(table, &range, &options)?;
    let path = export_figure(&figure, &cli.out, cli.format)?;
    println!("{}", path.display());

    if cli.open {
        info!(path = %path.display(), "opening chart");
        open::that(&path).with_context(|| format!("Failed to open {}", path.display()))?;
    }

    Ok(())
}
