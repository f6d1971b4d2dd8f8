//! Chart rendering. Every chart draws onto any plotters backend; files and
//! the web form both use the SVG backend, which needs no system fonts.

use crate::utils::error::{EtlError, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;

const FONT: &str = "sans-serif";
const PALETTE: [RGBColor; 4] = [
    RGBColor(59, 76, 192),
    RGBColor(180, 4, 38),
    RGBColor(44, 160, 44),
    RGBColor(255, 127, 14),
];

fn chart_error<E: std::fmt::Display>(e: E) -> EtlError {
    EtlError::ChartError {
        message: e.to_string(),
    }
}

pub trait Chart {
    fn size(&self) -> (u32, u32);

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>;

    fn to_svg(&self) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, self.size()).into_drawing_area();
            self.draw(&root)?;
            root.present().map_err(chart_error)?;
        }
        Ok(svg)
    }

    /// SVG document bytes, as written to the plots directory.
    fn render(&self) -> Result<Vec<u8>> {
        Ok(self.to_svg()?.into_bytes())
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn padded(lo: f64, hi: f64) -> Range<f64> {
    if (hi - lo).abs() < f64::EPSILON {
        return (lo - 1.0)..(hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad)..(hi + pad)
}

/// Axis label for categorical positions placed at integer coordinates.
fn category_label(labels: &[String], position: f64) -> String {
    let index = position.round();
    if (position - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    labels.get(index as usize).cloned().unwrap_or_default()
}

/// Diverging blue-grey-red scale for values in [-1, 1].
fn coolwarm(value: f64) -> RGBColor {
    if !value.is_finite() {
        return RGBColor(200, 200, 200);
    }
    let t = (value.clamp(-1.0, 1.0) + 1.0) / 2.0;
    let (from, to, local) = if t < 0.5 {
        ((59.0, 76.0, 192.0), (221.0, 221.0, 221.0), t * 2.0)
    } else {
        ((221.0, 221.0, 221.0), (180.0, 4.0, 38.0), (t - 0.5) * 2.0)
    };
    let mix = |a: f64, b: f64| (a + (b - a) * local).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

/// Blues, darkest first.
fn blues(rank: usize, count: usize) -> RGBColor {
    let t = if count <= 1 {
        0.0
    } else {
        rank as f64 / (count - 1) as f64
    };
    let mix = |dark: f64, light: f64| (dark + (light - dark) * t).round() as u8;
    RGBColor(mix(8.0, 198.0), mix(48.0, 219.0), mix(107.0, 239.0))
}

#[derive(Debug, Clone)]
pub struct ScatterSeries {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone)]
pub struct ScatterChart {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub series: Vec<ScatterSeries>,
}

impl Chart for ScatterChart {
    fn size(&self) -> (u32, u32) {
        (800, 600)
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()> {
        let all = || self.series.iter().flat_map(|s| s.points.iter());
        let (x_lo, x_hi) = bounds(all().map(|p| p.0)).ok_or_else(|| chart_error("scatter chart has no points"))?;
        let (y_lo, y_hi) = bounds(all().map(|p| p.1)).ok_or_else(|| chart_error("scatter chart has no points"))?;

        root.fill(&WHITE).map_err(chart_error)?;
        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, (FONT, 22))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(padded(x_lo, x_hi), padded(y_lo, y_hi))
            .map_err(chart_error)?;

        chart
            .configure_mesh()
            .x_desc(self.x_desc.as_str())
            .y_desc(self.y_desc.as_str())
            .draw()
            .map_err(chart_error)?;

        for (i, series) in self.series.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            chart
                .draw_series(
                    series
                        .points
                        .iter()
                        .map(move |&(x, y)| Circle::new((x, y), 5, color.filled())),
                )
                .map_err(chart_error)?
                .label(series.label.as_str())
                .legend(move |(x, y)| Circle::new((x, y), 5, color.filled()));
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(chart_error)?;
        Ok(())
    }
}

/// One value per category, joined by a line, categories in the given order.
#[derive(Debug, Clone)]
pub struct LineChart {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub points: Vec<(String, f64)>,
}

impl Chart for LineChart {
    fn size(&self) -> (u32, u32) {
        (1000, 500)
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()> {
        let (y_lo, y_hi) =
            bounds(self.points.iter().map(|p| p.1)).ok_or_else(|| chart_error("line chart has no points"))?;
        let labels: Vec<String> = self.points.iter().map(|p| p.0.clone()).collect();
        let n = self.points.len();

        root.fill(&WHITE).map_err(chart_error)?;
        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, (FONT, 22))
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(50)
            .build_cartesian_2d(-0.5..(n as f64 - 0.5), padded(y_lo, y_hi))
            .map_err(chart_error)?;

        let formatter = |v: &f64| category_label(&labels, *v);
        chart
            .configure_mesh()
            .x_labels(n)
            .x_label_formatter(&formatter)
            .x_desc(self.x_desc.as_str())
            .y_desc(self.y_desc.as_str())
            .draw()
            .map_err(chart_error)?;

        let series: Vec<(f64, f64)> = self
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| (i as f64, p.1))
            .collect();
        chart
            .draw_series(LineSeries::new(series.clone(), PALETTE[0].stroke_width(2)))
            .map_err(chart_error)?;
        chart
            .draw_series(series.into_iter().map(|p| Circle::new(p, 4, PALETTE[0].filled())))
            .map_err(chart_error)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Histogram {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub values: Vec<f64>,
    pub bins: usize,
}

impl Histogram {
    /// (lower edge, upper edge, count) per bin; the last bin is closed.
    pub fn bin_counts(&self) -> Vec<(f64, f64, usize)> {
        let Some((lo, hi)) = bounds(self.values.iter().copied()) else {
            return Vec::new();
        };
        let bins = self.bins.max(1);
        let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
        let width = (hi - lo) / bins as f64;

        let mut counts = vec![0usize; bins];
        for v in self.values.iter().filter(|v| v.is_finite()) {
            let index = (((v - lo) / width).floor() as usize).min(bins - 1);
            counts[index] += 1;
        }
        counts
            .into_iter()
            .enumerate()
            .map(|(i, c)| (lo + i as f64 * width, lo + (i + 1) as f64 * width, c))
            .collect()
    }
}

impl Chart for Histogram {
    fn size(&self) -> (u32, u32) {
        (800, 500)
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()> {
        let bins = self.bin_counts();
        if bins.is_empty() {
            return Err(chart_error("histogram has no values"));
        }
        let x_range = bins[0].0..bins[bins.len() - 1].1;
        let top = bins.iter().map(|b| b.2).max().unwrap_or(1).max(1) as f64 * 1.1;

        root.fill(&WHITE).map_err(chart_error)?;
        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, (FONT, 22))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_range, 0.0..top)
            .map_err(chart_error)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(self.x_desc.as_str())
            .y_desc(self.y_desc.as_str())
            .draw()
            .map_err(chart_error)?;

        chart
            .draw_series(
                bins.iter()
                    .map(|&(x0, x1, c)| Rectangle::new([(x0, 0.0), (x1, c as f64)], PALETTE[0].mix(0.7).filled())),
            )
            .map_err(chart_error)?;
        chart
            .draw_series(
                bins.iter()
                    .map(|&(x0, x1, c)| Rectangle::new([(x0, 0.0), (x1, c as f64)], BLACK.stroke_width(1))),
            )
            .map_err(chart_error)?;
        Ok(())
    }
}

/// Square matrix of values in [-1, 1] with the value printed in each cell.
#[derive(Debug, Clone)]
pub struct Heatmap {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl Chart for Heatmap {
    fn size(&self) -> (u32, u32) {
        (1000, 900)
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()> {
        let n = self.labels.len();
        if n == 0 || self.values.len() != n || self.values.iter().any(|row| row.len() != n) {
            return Err(chart_error("heatmap needs a non-empty square matrix"));
        }
        let reversed: Vec<String> = self.labels.iter().rev().cloned().collect();

        root.fill(&WHITE).map_err(chart_error)?;
        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, (FONT, 22))
            .margin(15)
            .x_label_area_size(60)
            .y_label_area_size(120)
            .build_cartesian_2d(-0.5..(n as f64 - 0.5), -0.5..(n as f64 - 0.5))
            .map_err(chart_error)?;

        let x_formatter = |v: &f64| category_label(&self.labels, *v);
        let y_formatter = |v: &f64| category_label(&reversed, *v);
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(n)
            .y_labels(n)
            .x_label_formatter(&x_formatter)
            .y_label_formatter(&y_formatter)
            .draw()
            .map_err(chart_error)?;

        // first label on the top row
        let cells: Vec<(f64, f64, f64)> = (0..n)
            .flat_map(|i| (0..n).map(move |j| (j as f64, (n - 1 - i) as f64, i, j)))
            .map(|(x, y, i, j)| (x, y, self.values[i][j]))
            .collect();

        chart
            .draw_series(
                cells
                    .iter()
                    .map(|&(x, y, v)| Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], coolwarm(v).filled())),
            )
            .map_err(chart_error)?;

        let style = TextStyle::from((FONT, 12.0).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
        chart
            .draw_series(cells.iter().map(|&(x, y, v)| {
                let label = if v.is_finite() { format!("{:.2}", v) } else { String::new() };
                Text::new(label, (x, y), style.clone())
            }))
            .map_err(chart_error)?;
        Ok(())
    }
}

/// Side-by-side bars per group, one colour per series.
#[derive(Debug, Clone)]
pub struct GroupedBarChart {
    pub title: String,
    pub y_desc: String,
    pub groups: Vec<String>,
    pub series: Vec<(String, Vec<f64>)>,
}

impl Chart for GroupedBarChart {
    fn size(&self) -> (u32, u32) {
        (800, 500)
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()> {
        let n = self.groups.len();
        let k = self.series.len();
        if n == 0 || k == 0 || self.series.iter().any(|(_, values)| values.len() != n) {
            return Err(chart_error("grouped bar chart needs one value per group in every series"));
        }
        let (lo, hi) = bounds(self.series.iter().flat_map(|(_, values)| values.iter().copied()))
            .ok_or_else(|| chart_error("grouped bar chart has no finite values"))?;
        let y_range = (lo.min(0.0) * 1.1)..(hi.max(0.0) * 1.1 + f64::EPSILON);

        root.fill(&WHITE).map_err(chart_error)?;
        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, (FONT, 22))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(-0.5..(n as f64 - 0.5), y_range)
            .map_err(chart_error)?;

        let formatter = |v: &f64| category_label(&self.groups, *v);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(n)
            .x_label_formatter(&formatter)
            .y_desc(self.y_desc.as_str())
            .draw()
            .map_err(chart_error)?;

        let width = 0.8 / k as f64;
        for (s, (label, values)) in self.series.iter().enumerate() {
            let color = PALETTE[s % PALETTE.len()];
            chart
                .draw_series(values.iter().enumerate().map(move |(g, &v)| {
                    let x0 = g as f64 - 0.4 + s as f64 * width;
                    Rectangle::new([(x0, 0.0), (x0 + width, v)], color.filled())
                }))
                .map_err(chart_error)?
                .label(label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(chart_error)?;
        Ok(())
    }
}

/// Horizontal bars, first bar on top.
#[derive(Debug, Clone)]
pub struct HorizontalBarChart {
    pub title: String,
    pub x_desc: String,
    pub bars: Vec<(String, f64)>,
}

impl Chart for HorizontalBarChart {
    fn size(&self) -> (u32, u32) {
        (1000, 600)
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()> {
        let n = self.bars.len();
        if n == 0 {
            return Err(chart_error("bar chart has no bars"));
        }
        let top = bounds(self.bars.iter().map(|b| b.1))
            .map(|(_, hi)| hi)
            .filter(|hi| *hi > 0.0)
            .unwrap_or(1.0)
            * 1.1;
        let labels: Vec<String> = self.bars.iter().rev().map(|b| b.0.clone()).collect();

        root.fill(&WHITE).map_err(chart_error)?;
        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, (FONT, 22))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(160)
            .build_cartesian_2d(0.0..top, -0.5..(n as f64 - 0.5))
            .map_err(chart_error)?;

        let formatter = |v: &f64| category_label(&labels, *v);
        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(n)
            .y_label_formatter(&formatter)
            .x_desc(self.x_desc.as_str())
            .draw()
            .map_err(chart_error)?;

        let rects: Vec<(f64, f64, RGBColor)> = self
            .bars
            .iter()
            .enumerate()
            .map(|(i, b)| ((n - 1 - i) as f64, b.1.max(0.0), blues(i, n)))
            .collect();
        chart
            .draw_series(
                rects
                    .iter()
                    .map(|&(y, v, color)| Rectangle::new([(0.0, y - 0.4), (v, y + 0.4)], color.filled())),
            )
            .map_err(chart_error)?;
        chart
            .draw_series(
                rects
                    .iter()
                    .map(|&(y, v, _)| Rectangle::new([(0.0, y - 0.4), (v, y + 0.4)], BLACK.stroke_width(1))),
            )
            .map_err(chart_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars() -> HorizontalBarChart {
        HorizontalBarChart {
            title: "Predicted Title Odds".to_string(),
            x_desc: "Normalized Probability".to_string(),
            bars: vec![("Arsenal".to_string(), 0.6), ("Chelsea".to_string(), 0.4)],
        }
    }

    #[test]
    fn test_bar_chart_svg() {
        let chart = bars();

        let svg = chart.to_svg().unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Arsenal"));
        assert!(svg.contains("Predicted Title Odds"));
    }

    #[test]
    fn test_empty_charts_are_errors() {
        let chart = HorizontalBarChart {
            bars: vec![],
            ..bars()
        };
        assert!(matches!(chart.render(), Err(EtlError::ChartError { .. })));

        let scatter = ScatterChart {
            title: "t".to_string(),
            x_desc: "x".to_string(),
            y_desc: "y".to_string(),
            series: vec![],
        };
        assert!(scatter.to_svg().is_err());
    }

    #[test]
    fn test_histogram_bins() {
        let histogram = Histogram {
            title: "Points".to_string(),
            x_desc: "Points".to_string(),
            y_desc: "Team-Seasons".to_string(),
            values: vec![0.0, 1.0, 2.0, 3.0, 4.0],
            bins: 4,
        };

        let bins = histogram.bin_counts();

        assert_eq!(bins.len(), 4);
        assert_eq!(bins.iter().map(|b| b.2).sum::<usize>(), 5);
        // the maximum lands in the last, closed bin
        assert_eq!(bins[3].2, 2);
        assert_eq!(bins[0].0, 0.0);
        assert_eq!(bins[3].1, 4.0);
    }

    #[test]
    fn test_other_charts_render() {
        let scatter = ScatterChart {
            title: "Points vs Goal Difference".to_string(),
            x_desc: "Goal Difference".to_string(),
            y_desc: "Points".to_string(),
            series: vec![
                ScatterSeries {
                    label: "Winner = 0".to_string(),
                    points: vec![(10.0, 60.0), (-5.0, 40.0)],
                },
                ScatterSeries {
                    label: "Winner = 1".to_string(),
                    points: vec![(50.0, 90.0)],
                },
            ],
        };
        assert!(scatter.render().is_ok());

        let line = LineChart {
            title: "Average Points per Season".to_string(),
            x_desc: "Season".to_string(),
            y_desc: "Average Points".to_string(),
            points: vec![("2015".to_string(), 52.0), ("2016".to_string(), 53.5)],
        };
        assert!(line.render().is_ok());

        let heatmap = Heatmap {
            title: "Feature Correlation Heatmap".to_string(),
            labels: vec!["points".to_string(), "Wins".to_string()],
            values: vec![vec![1.0, 0.9], vec![0.9, 1.0]],
        };
        assert!(heatmap.to_svg().unwrap().contains("0.90"));

        let grouped = GroupedBarChart {
            title: "Winners vs Non-Winners".to_string(),
            y_desc: "Average Value".to_string(),
            groups: vec!["points".to_string(), "Losses".to_string()],
            series: vec![
                ("Non-Winner (0)".to_string(), vec![50.0, 13.0]),
                ("Winner (1)".to_string(), vec![88.0, 3.0]),
            ],
        };
        assert!(grouped.render().is_ok());
    }

    #[test]
    fn test_heatmap_rejects_ragged_matrix() {
        let heatmap = Heatmap {
            title: "t".to_string(),
            labels: vec!["a".to_string(), "b".to_string()],
            values: vec![vec![1.0], vec![0.0, 1.0]],
        };
        assert!(heatmap.render().is_err());
    }

    #[test]
    fn test_coolwarm_endpoints() {
        assert_eq!(coolwarm(-1.0), RGBColor(59, 76, 192));
        assert_eq!(coolwarm(1.0), RGBColor(180, 4, 38));
        assert_eq!(coolwarm(f64::NAN), RGBColor(200, 200, 200));
    }
}
