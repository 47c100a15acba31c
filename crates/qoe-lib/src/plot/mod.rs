use crate::config::QoeConfig;
use crate::signal::{SessionMode, TimeSeries};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DATA_LINE_COLOR: Color = Color(0x454545);

/// Band colors assigned by rank, lowest band first.
pub const BAND_PALETTE: [Color; 4] = [
    Color(0x00C2D1),
    Color(0x00727A),
    Color(0x002629),
    Color(0x454545),
];

const X_LABEL: &str = "Media Streaming (Seconds)";
const QOE_BAND_LABELS: [&str; 3] = ["Good", "Better", "Best"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
    pub range: (f64, f64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub dash: Option<[f32; 2]>,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(&self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
    /// Whether the series gets a legend entry.
    pub legend: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegendPosition {
    UpperRight,
    LowerRight,
    LowerLeft,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
    pub legend: Option<LegendPosition>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis {
                label: None,
                range: (0.0, 1.0),
            },
            y: Axis {
                label: None,
                range: (0.0, 1.0),
            },
            series: Vec::new(),
            legend: None,
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }
}

/// Rasterizes a [`Figure`] to an image file, overwriting it if present.
pub trait PlotBackend {
    fn draw(&mut self, fig: &Figure, path: &Path) -> anyhow::Result<()>;
}

/// The four charts emitted per session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    ResolutionQuality,
    FrameBuffering,
    ResolutionChanges,
    OverallQoe,
}

/// Where a chart takes its reference bands from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BandSource {
    None,
    QualityRungs,
    ChangeRungs,
    QoeBands,
}

/// Fixed rendering recipe for one chart kind.
#[derive(Debug, Copy, Clone)]
pub struct ChartRecipe {
    pub metric: &'static str,
    pub title_lead: &'static str,
    pub y_label: &'static str,
    pub y_range: (f64, f64),
    pub bands: BandSource,
    pub legend: Option<LegendPosition>,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::ResolutionQuality,
        ChartKind::FrameBuffering,
        ChartKind::ResolutionChanges,
        ChartKind::OverallQoe,
    ];

    pub fn recipe(&self) -> ChartRecipe {
        match self {
            ChartKind::ResolutionQuality => ChartRecipe {
                metric: "streaming_resolution",
                title_lead: "Resolution Quality",
                y_label: "Resolution (Pixels x Pixels)",
                y_range: (0.0, 33.0),
                bands: BandSource::QualityRungs,
                legend: Some(LegendPosition::LowerRight),
            },
            ChartKind::FrameBuffering => ChartRecipe {
                metric: "streaming_buffering",
                title_lead: "Frames Buffered",
                y_label: "Frame Buffering",
                y_range: (-0.1, 1.1),
                bands: BandSource::None,
                legend: None,
            },
            ChartKind::ResolutionChanges => ChartRecipe {
                metric: "resolution_changes",
                title_lead: "Bitrate Changes",
                y_label: "Resolution Changes (Pixel Change)",
                y_range: (0.0, 33.0),
                bands: BandSource::ChangeRungs,
                legend: Some(LegendPosition::UpperRight),
            },
            ChartKind::OverallQoe => ChartRecipe {
                metric: "streaming_QoE",
                title_lead: "Overall QoE",
                y_label: "Quality of Experience (%)",
                y_range: (0.0, 105.0),
                bands: BandSource::QoeBands,
                legend: Some(LegendPosition::LowerLeft),
            },
        }
    }

    /// Short name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::ResolutionQuality => "resolution-quality",
            ChartKind::FrameBuffering => "frame-buffering",
            ChartKind::ResolutionChanges => "resolution-changes",
            ChartKind::OverallQoe => "overall-qoe",
        }
    }
}

pub fn chart_title(kind: ChartKind, mode: SessionMode, player: &str) -> String {
    format!(
        "{} when Streaming {} Media with {}",
        kind.recipe().title_lead,
        mode.display_name(),
        player
    )
}

pub fn artifact_file_name(kind: ChartKind, mode: SessionMode, prefix: &str, ext: &str) -> String {
    format!("{}_{}_{}.{}", prefix, kind.recipe().metric, mode.tag(), ext)
}

/// Reference bands for a chart, highest first so the legend reads top-down.
fn reference_bands(kind: ChartKind, cfg: &QoeConfig) -> Vec<(f64, String, Color)> {
    let values: &[f64] = match kind.recipe().bands {
        BandSource::None => &[],
        BandSource::QualityRungs => &cfg.quality_rungs,
        BandSource::ChangeRungs => &cfg.change_rungs,
        BandSource::QoeBands => &cfg.qoe_bands,
    };
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mut bands: Vec<(f64, String, Color)> = sorted
        .iter()
        .enumerate()
        .map(|(rank, value)| {
            let label = match kind.recipe().bands {
                BandSource::QoeBands => QOE_BAND_LABELS
                    .get(rank)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("{}", value)),
                _ => format!("{}P", value),
            };
            let color = BAND_PALETTE[rank.min(BAND_PALETTE.len() - 1)];
            (*value, label, color)
        })
        .collect();
    bands.reverse();
    bands
}

/// Build the annotated figure for one chart of a session.
///
/// The data line covers at most `streaming_seconds` samples; non-finite
/// samples are kept so backends can show the gap.
pub fn figure_for_chart(
    kind: ChartKind,
    series: &TimeSeries,
    mode: SessionMode,
    cfg: &QoeConfig,
) -> Figure {
    let recipe = kind.recipe();
    let duration = cfg.streaming_seconds as f64;
    let mut fig = Figure::new(Some(chart_title(kind, mode, &cfg.player_name)));
    fig.x = Axis {
        label: Some(X_LABEL.into()),
        range: (0.0, duration),
    };
    fig.y = Axis {
        label: Some(recipe.y_label.into()),
        range: recipe.y_range,
    };
    let bands = reference_bands(kind, cfg);
    for (value, label, color) in &bands {
        fig.add_series(Series::Line(LineSeries {
            name: label.clone(),
            points: vec![[0.0, *value], [duration, *value]],
            style: Style {
                width: 1.0,
                dash: Some([2.0, 3.0]),
                color: *color,
            },
            legend: true,
        }));
    }
    let points: Vec<[f64; 2]> = series
        .data
        .iter()
        .take(cfg.streaming_seconds)
        .enumerate()
        .map(|(i, value)| [series.time_at(i), *value])
        .collect();
    fig.add_series(Series::Line(LineSeries {
        name: kind.name().into(),
        points,
        style: Style {
            width: 1.4,
            dash: None,
            color: DATA_LINE_COLOR,
        },
        legend: false,
    }));
    fig.legend = if bands.is_empty() { None } else { recipe.legend };
    fig
}
