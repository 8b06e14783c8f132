//! Chart output: one SVG per reconciled variable
//!
//! Each chart overlays the three sources on the shared relative time axis.

use crate::derive::VariableSeries;
use crate::error::{Result, XvalError};
use crate::source::SourceKind;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

/// Default canvas size in pixels
pub const CHART_SIZE: (u32, u32) = (1200, 600);

/// Line color of each source
pub fn source_color(source: SourceKind) -> RGBColor {
    match source {
        SourceKind::KernelSocket => RGBColor(31, 119, 180),
        SourceKind::InKernelProbe => RGBColor(214, 39, 40),
        SourceKind::TrafficGenerator => RGBColor(44, 160, 44),
    }
}

/// Chart title, suffixed with the upper-cased congestion algorithm if any
///
/// # Example
/// ```
/// use tcpinfo_xval::chart::chart_title;
///
/// assert_eq!(chart_title("RTT", Some("bbr")), "RTT - BBR");
/// assert_eq!(chart_title("RTT", None), "RTT");
/// ```
pub fn chart_title(title: &str, cong_alg: Option<&str>) -> String {
    match cong_alg.map(str::trim) {
        Some(alg) if !alg.is_empty() => format!("{} - {}", title, alg.to_uppercase()),
        _ => title.to_string(),
    }
}

/// Axis range with 5% headroom on both ends
///
/// Degenerate ranges (a single value) are widened so they stay drawable.
pub fn padded_range(lo: f64, hi: f64) -> (f64, f64) {
    let span = hi - lo;
    if span.abs() < f64::EPSILON {
        let pad = if lo.abs() < f64::EPSILON { 1.0 } else { lo.abs() * 0.1 };
        return (lo - pad, hi + pad);
    }
    (lo - span * 0.05, hi + span * 0.05)
}

/// Renders reconciled variables to `{prefix}{variable}.svg`
#[derive(Debug, Clone)]
pub struct ChartRenderer {
    prefix: String,
    cong_alg: Option<String>,
    size: (u32, u32),
}

impl ChartRenderer {
    pub fn new(prefix: &str, cong_alg: Option<&str>) -> Self {
        Self {
            prefix: prefix.to_string(),
            cong_alg: cong_alg.map(str::to_string),
            size: CHART_SIZE,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    /// Output path for a variable, deterministic in prefix and name
    pub fn output_path(&self, variable: &str) -> PathBuf {
        PathBuf::from(format!("{}{}.svg", self.prefix, variable))
    }

    /// Draw one variable and return the written path
    pub fn render(&self, variable: &VariableSeries) -> Result<PathBuf> {
        let path = self.output_path(&variable.descriptor.variable);
        self.draw(&path, variable)
            .map_err(|e| XvalError::Render {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(path)
    }

    fn draw(
        &self,
        path: &Path,
        variable: &VariableSeries,
    ) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let ((x_lo, x_hi), (y_lo, y_hi)) = variable.bounds().unwrap_or(((0.0, 1.0), (0.0, 1.0)));
        let (x_lo, x_hi) = padded_range(x_lo, x_hi);
        let (y_lo, y_hi) = padded_range(y_lo, y_hi);

        let root = SVGBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE)?;

        let title = chart_title(&variable.descriptor.title, self.cong_alg.as_deref());
        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 28))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(80)
            .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

        chart
            .configure_mesh()
            .x_desc("Time [s]")
            .y_desc(variable.descriptor.y_label.as_str())
            .label_style(("sans-serif", 16))
            .axis_desc_style(("sans-serif", 18))
            .draw()?;

        for series in &variable.series {
            let color = source_color(series.source);
            chart
                .draw_series(LineSeries::new(series.points.iter().copied(), color))?
                .label(series.source.label())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 25, y)], color));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }
}
