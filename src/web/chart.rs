//! Inline SVG charts

use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

use crate::db::{format_number, Table, TableError};

const WIDTH: f64 = 760.0;
const HEIGHT: f64 = 340.0;
const MARGIN_LEFT: f64 = 64.0;
const MARGIN_RIGHT: f64 = 16.0;
const MARGIN_TOP: f64 = 36.0;
const MARGIN_BOTTOM: f64 = 48.0;
const TICKS: usize = 5;

const PALETTE: &[&str] = &["#29b5e8", "#11567f", "#ff9f36", "#7d44cf", "#d45b90"];

/// One y column of a chart
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<f64>,
}

/// Categories from `x`, one series per `y` column
pub fn extract(table: &Table, x: &str, y: &[&str]) -> Result<(Vec<String>, Vec<Series>), TableError> {
    let categories = table.column(x)?.iter().map(|c| c.to_string()).collect();
    let series = y
        .iter()
        .map(|name| {
            Ok(Series {
                name: name.to_string(),
                values: table.numeric_column(name)?,
            })
        })
        .collect::<Result<Vec<_>, TableError>>()?;
    Ok((categories, series))
}

struct Frame {
    max: f64,
}

impl Frame {
    fn new(series: &[Series]) -> Self {
        let max = series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0_f64, f64::max);
        Self {
            max: if max > 0.0 { max } else { 1.0 },
        }
    }

    fn plot_width(&self) -> f64 {
        WIDTH - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn plot_height(&self) -> f64 {
        HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
    }

    fn baseline(&self) -> f64 {
        HEIGHT - MARGIN_BOTTOM
    }

    fn y(&self, value: f64) -> f64 {
        self.baseline() - (value.max(0.0) / self.max) * self.plot_height()
    }
}

fn open_svg(out: &mut String, kind: &str) {
    let _ = write!(
        out,
        r#"<svg class="chart chart-{kind}" viewBox="0 0 {WIDTH} {HEIGHT}" role="img" xmlns="http://www.w3.org/2000/svg">"#
    );
}

fn axes(out: &mut String, frame: &Frame) {
    for i in 0..=TICKS {
        let value = frame.max * i as f64 / TICKS as f64;
        let y = frame.y(value);
        let _ = write!(
            out,
            r##"<line x1="{MARGIN_LEFT}" y1="{y:.1}" x2="{x2}" y2="{y:.1}" stroke="#e6e9ef"/><text x="{tx}" y="{ty:.1}" text-anchor="end" class="tick">{label}</text>"##,
            x2 = WIDTH - MARGIN_RIGHT,
            tx = MARGIN_LEFT - 6.0,
            ty = y + 4.0,
            label = format_number((value * 100.0).round() / 100.0),
        );
    }
}

fn category_labels(out: &mut String, categories: &[String], centers: impl Iterator<Item = f64>) {
    for (category, x) in categories.iter().zip(centers) {
        let _ = write!(
            out,
            r#"<text x="{x:.1}" y="{y}" text-anchor="middle" class="category">{label}</text>"#,
            y = HEIGHT - MARGIN_BOTTOM + 18.0,
            label = encode_text(category),
        );
    }
}

fn legend(out: &mut String, series: &[Series]) {
    let mut x = MARGIN_LEFT;
    for (index, s) in series.iter().enumerate() {
        let color = PALETTE[index % PALETTE.len()];
        let _ = write!(
            out,
            r#"<rect x="{x:.1}" y="10" width="12" height="12" fill="{color}"/><text x="{tx:.1}" y="20" class="legend">{name}</text>"#,
            tx = x + 16.0,
            name = encode_text(&s.name),
        );
        x += 24.0 + 8.0 * s.name.len() as f64;
    }
}

fn no_data(out: &mut String) {
    let _ = write!(
        out,
        r#"<text x="{x}" y="{y}" text-anchor="middle" class="empty">No data</text></svg>"#,
        x = WIDTH / 2.0,
        y = HEIGHT / 2.0,
    );
}

/// Bars of each series side by side within every category
pub fn bar_chart(categories: &[String], series: &[Series]) -> String {
    let mut out = String::new();
    open_svg(&mut out, "bar");
    if categories.is_empty() || series.is_empty() {
        no_data(&mut out);
        return out;
    }

    let frame = Frame::new(series);
    axes(&mut out, &frame);
    legend(&mut out, series);

    let group_width = frame.plot_width() / categories.len() as f64;
    let bar_width = group_width * 0.8 / series.len() as f64;
    for (ci, category) in categories.iter().enumerate() {
        let group_x = MARGIN_LEFT + ci as f64 * group_width + group_width * 0.1;
        for (si, s) in series.iter().enumerate() {
            let value = s.values.get(ci).copied().unwrap_or(0.0);
            let y = frame.y(value);
            let _ = write!(
                out,
                r#"<rect x="{x:.1}" y="{y:.1}" width="{w:.1}" height="{h:.1}" fill="{color}"><title>{title}</title></rect>"#,
                x = group_x + si as f64 * bar_width,
                w = bar_width,
                h = frame.baseline() - y,
                color = PALETTE[si % PALETTE.len()],
                title = encode_text(&format!("{} / {}: {}", category, s.name, format_number(value))),
            );
        }
    }
    let centers = (0..categories.len()).map(|i| MARGIN_LEFT + (i as f64 + 0.5) * group_width);
    category_labels(&mut out, categories, centers);

    out.push_str("</svg>");
    out
}

/// Filled area under one series, categories evenly spaced
pub fn area_chart(categories: &[String], series: &Series) -> String {
    let mut out = String::new();
    open_svg(&mut out, "area");
    if categories.is_empty() {
        no_data(&mut out);
        return out;
    }

    let frame = Frame::new(std::slice::from_ref(series));
    axes(&mut out, &frame);
    legend(&mut out, std::slice::from_ref(series));

    let step = if categories.len() > 1 {
        frame.plot_width() / (categories.len() - 1) as f64
    } else {
        0.0
    };
    let x_at = |i: usize| {
        if categories.len() > 1 {
            MARGIN_LEFT + i as f64 * step
        } else {
            MARGIN_LEFT + frame.plot_width() / 2.0
        }
    };

    let points: Vec<(f64, f64)> = (0..categories.len())
        .map(|i| (x_at(i), frame.y(series.values.get(i).copied().unwrap_or(0.0))))
        .collect();
    let line = points
        .iter()
        .map(|(x, y)| format!("{:.1},{:.1}", x, y))
        .collect::<Vec<_>>()
        .join(" ");

    let color = PALETTE[0];
    let _ = write!(
        out,
        r#"<polygon points="{x0:.1},{base:.1} {line} {xn:.1},{base:.1}" fill="{color}" fill-opacity="0.45"/><polyline points="{line}" fill="none" stroke="{color}" stroke-width="2"/>"#,
        x0 = points[0].0,
        xn = points[points.len() - 1].0,
        base = frame.baseline(),
    );
    for (category, (x, y)) in categories.iter().zip(&points) {
        let _ = write!(
            out,
            r#"<circle cx="{x:.1}" cy="{y:.1}" r="3" fill="{color}" data-category="{attr}"/>"#,
            attr = encode_double_quoted_attribute(category),
        );
    }
    category_labels(&mut out, categories, points.iter().map(|(x, _)| *x));

    out.push_str("</svg>");
    out
}
