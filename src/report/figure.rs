use std::fs;
use std::ops::Range;
use std::path::Path;

use dynbin_export::timeseries::Record;
use plotters::prelude::*;

use super::ReportError;

const TRUE_COLOR: RGBColor = RGBColor(31, 119, 180);
const ANALYTIC_COLOR: RGBColor = RGBColor(255, 127, 14);

/// Canvas size of the rendered figure.
#[derive(Debug, Clone, Copy)]
pub struct FigureOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 900,
        }
    }
}

struct Panel<'a> {
    title: &'a str,
    y_desc: &'a str,
    series: Vec<(Vec<(f64, f64)>, RGBColor)>,
}

/// Render the 2×2 comparison figure: a(t) true vs analytic, M(t), the fractional difference
/// in a, and e(t) true vs analytic.
pub fn render_figure(
    records: &[Record],
    output: &Path,
    options: FigureOptions,
) -> Result<(), ReportError> {
    if records.is_empty() {
        return Err(ReportError::EmptySeries);
    }
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let output_str = output.to_str().ok_or(ReportError::InvalidPath)?;

    let points = |f: fn(&Record) -> f64| -> Vec<(f64, f64)> {
        records.iter().map(|r| (r.time_yr, f(r))).collect()
    };
    let panels = [
        Panel {
            title: "Semimajor axis",
            y_desc: "a [R☉]",
            series: vec![
                (points(|r| r.a_rsun), TRUE_COLOR),
                (points(|r| r.a_analytic_rsun), ANALYTIC_COLOR),
            ],
        },
        Panel {
            title: "Total mass",
            y_desc: "M [M☉]",
            series: vec![(points(|r| r.mass_msun), TRUE_COLOR)],
        },
        Panel {
            title: "Semimajor axis residual",
            y_desc: "(a - a_an) / a_an",
            series: vec![(
                points(|r| (r.a_rsun - r.a_analytic_rsun) / r.a_analytic_rsun),
                TRUE_COLOR,
            )],
        },
        Panel {
            title: "Eccentricity",
            y_desc: "e",
            series: vec![
                (points(|r| r.e), TRUE_COLOR),
                (points(|r| r.e_analytic), ANALYTIC_COLOR),
            ],
        },
    ];

    let root = BitMapBackend::new(output_str, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE).map_err(draw_error)?;
    let areas = root.split_evenly((2, 2));

    let time_range = padded_range(records.iter().map(|r| r.time_yr));
    let font_family = select_font_family();
    let caption_font = FontDesc::new(font_family, 20.0, FontStyle::Bold);
    let label_font = FontDesc::new(font_family, 14.0, FontStyle::Normal);

    for (area, panel) in areas.iter().zip(panels.iter()) {
        let y_range = padded_range(
            panel
                .series
                .iter()
                .flat_map(|(pts, _)| pts.iter().map(|(_, y)| *y)),
        );
        let mut chart = ChartBuilder::on(area)
            .margin(15)
            .caption(panel.title, caption_font.clone())
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(time_range.clone(), y_range)
            .map_err(draw_error)?;

        chart
            .configure_mesh()
            .x_desc("time [yr]")
            .y_desc(panel.y_desc)
            .label_style(label_font.clone())
            .x_labels(6)
            .y_labels(6)
            .y_label_formatter(&|v| format!("{v:.4}"))
            .draw()
            .map_err(draw_error)?;

        for (pts, color) in &panel.series {
            chart
                .draw_series(LineSeries::new(pts.iter().copied(), color.stroke_width(2)))
                .map_err(draw_error)?;
        }
    }

    root.present().map_err(draw_error)?;
    Ok(())
}

fn draw_error<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> ReportError {
    ReportError::Draw(err.to_string())
}

/// Min/max of the finite values with 5% padding; flat data gets a small symmetric window.
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    let span = max - min;
    if span <= f64::EPSILON * max.abs().max(1.0) {
        let half = (max.abs() * 1e-6).max(1e-9);
        return (min - half)..(max + half);
    }
    let pad = 0.05 * span;
    (min - pad)..(max + pad)
}

fn select_font_family() -> FontFamily<'static> {
    if cfg!(target_os = "macos") {
        FontFamily::Name("Helvetica")
    } else if cfg!(target_os = "windows") {
        FontFamily::Name("Arial")
    } else {
        FontFamily::Name("DejaVu Sans")
    }
}
