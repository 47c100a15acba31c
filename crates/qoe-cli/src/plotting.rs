use anyhow::{bail, Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use qoe_lib::config::SUPPORTED_IMAGE_FORMATS;
use qoe_lib::plot::{Color as FigColor, Figure, LegendPosition, PlotBackend, Series, Style};
use std::path::Path;

/// Draws figures with plotters; `.svg` paths use the SVG backend and `.png`
/// paths the bitmap encoder. Other extensions are rejected before drawing.
pub struct PlottersBackend {
    pub size: (u32, u32),
}

impl PlottersBackend {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
        }
    }
}

impl PlotBackend for PlottersBackend {
    fn draw(&mut self, fig: &Figure, path: &Path) -> Result<()> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if !SUPPORTED_IMAGE_FORMATS.contains(&ext.as_str()) {
            bail!(
                "unsupported image extension '{}' for {} (expected one of {:?})",
                ext,
                path.display(),
                SUPPORTED_IMAGE_FORMATS
            );
        }
        let drawn = if ext == "svg" {
            let root = SVGBackend::new(path, self.size).into_drawing_area();
            draw_figure(root, fig)
        } else {
            let root = BitMapBackend::new(path, self.size).into_drawing_area();
            draw_figure(root, fig)
        };
        drawn.with_context(|| format!("drawing {}", path.display()))
    }
}

fn rgb(color: FigColor) -> RGBColor {
    let (r, g, b) = color.rgb();
    RGBColor(r, g, b)
}

fn shape_style(style: &Style) -> ShapeStyle {
    rgb(style.color).stroke_width(style.width.round().max(1.0) as u32)
}

/// Contiguous runs of finite points; NaN or infinite samples break the line.
fn finite_segments(points: &[[f64; 2]]) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for p in points {
        if p[0].is_finite() && p[1].is_finite() {
            current.push((p[0], p[1]));
        } else if !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

fn draw_figure<DB>(root: DrawingArea<DB, Shift>, fig: &Figure) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let (x_min, x_max) = fig.x.range;
    let (y_min, y_max) = fig.y.range;
    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(
            fig.title.clone().unwrap_or_else(|| "Plot".into()),
            ("sans-serif", 18),
        )
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
    chart
        .configure_mesh()
        .x_desc(fig.x.label.clone().unwrap_or_default())
        .y_desc(fig.y.label.clone().unwrap_or_default())
        .draw()?;

    for series in &fig.series {
        match series {
            Series::Line(line) => {
                let style = shape_style(&line.style);
                match line.style.dash {
                    Some([size, spacing]) => {
                        let anno = chart.draw_series(DashedLineSeries::new(
                            line.points.iter().map(|p| (p[0], p[1])),
                            size.round().max(1.0) as i32,
                            spacing.round().max(1.0) as i32,
                            style,
                        ))?;
                        if line.legend {
                            anno.label(line.name.clone()).legend(move |(x, y)| {
                                PathElement::new(vec![(x, y), (x + 20, y)], style)
                            });
                        }
                    }
                    None => {
                        for segment in finite_segments(&line.points) {
                            chart.draw_series(LineSeries::new(segment, style))?;
                        }
                    }
                }
            }
        }
    }

    if let Some(position) = fig.legend {
        let position = match position {
            LegendPosition::UpperRight => SeriesLabelPosition::UpperRight,
            LegendPosition::LowerRight => SeriesLabelPosition::LowerRight,
            LegendPosition::LowerLeft => SeriesLabelPosition::LowerLeft,
        };
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK.mix(0.3))
            .label_font(("sans-serif", 12))
            .position(position)
            .draw()?;
    }
    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_samples_split_the_line() {
        let points = [
            [0.0, 1.0],
            [1.0, 2.0],
            [2.0, f64::NAN],
            [3.0, 4.0],
            [4.0, f64::NAN],
        ];
        let segments = finite_segments(&points);
        assert_eq!(segments, vec![vec![(0.0, 1.0), (1.0, 2.0)], vec![(3.0, 4.0)]]);
    }

    #[test]
    fn all_nan_has_no_segments() {
        assert!(finite_segments(&[[0.0, f64::NAN]]).is_empty());
    }

    #[test]
    fn unknown_extension_is_rejected_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.gif");
        let fig = Figure::new(Some("t".to_string()));
        let err = PlottersBackend::new(100, 100).draw(&fig, &path).unwrap_err();
        assert!(err.to_string().contains("unsupported image extension"));
        assert!(!path.exists());
    }

    #[test]
    fn colors_unpack_to_rgb() {
        let c = rgb(FigColor(0x00C2D1));
        assert_eq!((c.0, c.1, c.2), (0x00, 0xC2, 0xD1));
    }
}
