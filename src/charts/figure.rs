//! Figure Model
//! Serializable chart description laid out like a Plotly figure (`data` + `layout`),
//! so any Plotly front end can draw it unchanged.

use crate::error::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Trace {
    Scatter(ScatterTrace),
    Candlestick(CandlestickTrace),
}

impl Trace {
    pub fn name(&self) -> &str {
        match self {
            Trace::Scatter(t) => &t.name,
            Trace::Candlestick(t) => &t.name,
        }
    }

    pub fn x(&self) -> &[NaiveDateTime] {
        match self {
            Trace::Scatter(t) => &t.x,
            Trace::Candlestick(t) => &t.x,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScatterMode {
    Lines,
    Markers,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterTrace {
    pub x: Vec<NaiveDateTime>,
    pub y: Vec<Option<f64>>,
    pub mode: ScatterMode,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<LineStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<MarkerStyle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub width: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub color: String,
    pub symbol: String,
    pub size: f64,
    pub line: LineStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandlestickTrace {
    pub x: Vec<NaiveDateTime>,
    pub open: Vec<Option<f64>>,
    pub high: Vec<Option<f64>>,
    pub low: Vec<Option<f64>>,
    pub close: Vec<Option<f64>>,
    pub name: String,
    pub increasing: DirectionStyle,
    pub decreasing: DirectionStyle,
    pub whiskerwidth: f64,
}

/// Styling for rising or falling candles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionStyle {
    pub line: LineStyle,
}

impl DirectionStyle {
    pub fn colored(color: &str) -> Self {
        Self {
            line: LineStyle {
                width: 2.0,
                color: Some(color.to_string()),
            },
        }
    }

    pub fn color(&self) -> Option<&str> {
        self.line.color.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    pub text: String,
}

impl Title {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeSlider {
    pub visible: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub axis_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rangeslider: Option<RangeSlider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autorange: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixedrange: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlaying: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gridcolor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zerolinecolor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub orientation: String,
    pub yanchor: String,
    pub y: f64,
    pub xanchor: String,
    pub x: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub title: Title,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub yaxis2: Axis,
    pub legend: Legend,
    pub width: u32,
    pub height: u32,
    pub hovermode: String,
    pub dragmode: String,
    pub paper_bgcolor: String,
    pub plot_bgcolor: String,
}

impl Figure {
    /// The first trace: the line or candlestick price series.
    pub fn price_trace(&self) -> Option<&Trace> {
        self.data.first()
    }

    /// Signal traces, in signal order.
    pub fn marker_traces(&self) -> impl Iterator<Item = &ScatterTrace> {
        self.data.iter().skip(1).filter_map(|trace| match trace {
            Trace::Scatter(t) if t.mode == ScatterMode::Markers => Some(t),
            _ => None,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Self-contained HTML page drawing the figure with plotly.js.
    pub fn to_html(&self) -> Result<String> {
        // A literal "</" inside the JSON would close the script element early.
        let json = self.to_json()?.replace("</", "<\\/");
        let title = html_escape(&self.layout.title.text);

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{PLOTLY_CDN}"></script>
</head>
<body style="margin:0;background:white">
<div id="chart"></div>
<script>
const figure = {json};
Plotly.newPlot("chart", figure.data, figure.layout, {{responsive: true, scrollZoom: true}});
</script>
</body>
</html>
"#
        ))
    }
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> Figure {
        let x = vec![NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()];
        Figure {
            data: vec![
                Trace::Scatter(ScatterTrace {
                    x: x.clone(),
                    y: vec![None],
                    mode: ScatterMode::Lines,
                    name: "Close Price".to_string(),
                    line: Some(LineStyle {
                        width: 2.0,
                        color: None,
                    }),
                    marker: None,
                }),
                Trace::Scatter(ScatterTrace {
                    x,
                    y: vec![Some(1.0)],
                    mode: ScatterMode::Markers,
                    name: "buy".to_string(),
                    line: None,
                    marker: Some(MarkerStyle {
                        color: "green".to_string(),
                        symbol: "triangle-down".to_string(),
                        size: 12.0,
                        line: LineStyle {
                            width: 1.0,
                            color: Some("black".to_string()),
                        },
                    }),
                }),
            ],
            layout: Layout {
                title: Title::new("A <b>&</b> B"),
                xaxis: Axis::default(),
                yaxis: Axis::default(),
                yaxis2: Axis::default(),
                legend: Legend {
                    orientation: "h".to_string(),
                    yanchor: "bottom".to_string(),
                    y: 1.02,
                    xanchor: "right".to_string(),
                    x: 1.0,
                },
                width: 1600,
                height: 1000,
                hovermode: "closest".to_string(),
                dragmode: "zoom".to_string(),
                paper_bgcolor: "white".to_string(),
                plot_bgcolor: "white".to_string(),
            },
        }
    }

    #[test]
    fn json_uses_plotly_keys() {
        let value: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(value["data"][0]["type"], "scatter");
        assert_eq!(value["data"][0]["mode"], "lines");
        assert!(value["data"][0]["y"][0].is_null());
        assert!(value["data"][0].get("marker").is_none());
        assert_eq!(value["data"][1]["marker"]["symbol"], "triangle-down");
        assert_eq!(value["data"][0]["x"][0], "2024-01-01T00:00:00");
    }

    #[test]
    fn json_round_trips() {
        let figure = sample();
        let back: Figure = serde_json::from_str(&figure.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, figure);
    }

    #[test]
    fn accessors_split_price_and_markers() {
        let figure = sample();
        assert_eq!(figure.price_trace().map(Trace::name), Some("Close Price"));
        let names: Vec<&str> = figure.marker_traces().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["buy"]);
    }

    #[test]
    fn html_embeds_figure_and_escapes_title() {
        let html = sample().to_html().unwrap();
        assert!(html.contains("Plotly.newPlot"));
        assert!(html.contains("<title>A &lt;b&gt;&amp;&lt;/b&gt; B</title>"));
        assert!(html.contains("\"hovermode\":\"closest\""));
        assert!(html.contains("&<\\/b>"));
        assert!(!html.contains("</b>"));
    }
}
