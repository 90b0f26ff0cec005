//! Bar chart model.
//!
//! A [`BarChart`] is the renderer-independent description of one dashboard
//! panel: one bar per table row, with the value label already formatted,
//! the colour already picked from a continuous scale and the hover text
//! already materialized.

use polars::prelude::*;
use std::fmt;

use crate::data_loader::{extract_f64_column, extract_str_column};
use crate::error::{DashError, DashResult};

/// Plain RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// `#rrggbb` notation.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

const RD_YL_GN: [Rgb; 11] = [
    Rgb(165, 0, 38),
    Rgb(215, 48, 39),
    Rgb(244, 109, 67),
    Rgb(253, 174, 97),
    Rgb(254, 224, 139),
    Rgb(255, 255, 191),
    Rgb(217, 239, 139),
    Rgb(166, 217, 106),
    Rgb(102, 189, 99),
    Rgb(26, 152, 80),
    Rgb(0, 104, 55),
];

const BLUES: [Rgb; 9] = [
    Rgb(247, 251, 255),
    Rgb(222, 235, 247),
    Rgb(198, 219, 239),
    Rgb(158, 202, 225),
    Rgb(107, 174, 214),
    Rgb(66, 146, 198),
    Rgb(33, 113, 181),
    Rgb(8, 81, 156),
    Rgb(8, 48, 107),
];

const TEALGRN: [Rgb; 7] = [
    Rgb(176, 242, 188),
    Rgb(137, 232, 172),
    Rgb(103, 219, 165),
    Rgb(76, 200, 163),
    Rgb(56, 178, 163),
    Rgb(44, 152, 160),
    Rgb(37, 125, 152),
];

const VIRIDIS: [Rgb; 5] = [
    Rgb(68, 1, 84),
    Rgb(59, 82, 139),
    Rgb(33, 145, 140),
    Rgb(94, 201, 98),
    Rgb(253, 231, 37),
];

/// Continuous colour scale, low values at the first stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScale {
    RdYlGn,
    Blues,
    Tealgrn,
    Viridis,
}

impl ColorScale {
    fn stops(self) -> &'static [Rgb] {
        match self {
            ColorScale::RdYlGn => &RD_YL_GN,
            ColorScale::Blues => &BLUES,
            ColorScale::Tealgrn => &TEALGRN,
            ColorScale::Viridis => &VIRIDIS,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorScale::RdYlGn => "RdYlGn",
            ColorScale::Blues => "Blues",
            ColorScale::Tealgrn => "Tealgrn",
            ColorScale::Viridis => "Viridis",
        }
    }

    /// Colour at position `t` in `[0, 1]` (clamped).
    pub fn at(self, t: f64) -> Rgb {
        let stops = self.stops();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let scaled = t * (stops.len() - 1) as f64;
        let lower = scaled.floor() as usize;
        if lower >= stops.len() - 1 {
            return stops[stops.len() - 1];
        }
        stops[lower].lerp(stops[lower + 1], scaled - lower as f64)
    }

    /// Colour of `value` on a scale spanning `[min, max]`.
    ///
    /// A degenerate range maps everything to the middle of the scale.
    pub fn map(self, value: f64, min: f64, max: f64) -> Rgb {
        if max - min <= f64::EPSILON {
            return self.at(0.5);
        }
        self.at((value - min) / (max - min))
    }
}

impl fmt::Display for ColorScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How table columns map onto a bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BarEncoding {
    /// Category column (x axis)
    pub x: String,
    /// Metric column (y axis, bar height and colour)
    pub y: String,
    /// Auxiliary columns shown on hover
    pub hover: Vec<String>,
    /// Fixed decimals of the value label
    pub decimals: usize,
    pub scale: ColorScale,
}

impl BarEncoding {
    pub fn new(x: &str, y: &str) -> Self {
        Self {
            x: x.to_string(),
            y: y.to_string(),
            hover: Vec::new(),
            decimals: 1,
            scale: ColorScale::Viridis,
        }
    }

    pub fn with_hover(mut self, columns: &[&str]) -> Self {
        self.hover = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_decimals(mut self, decimals: usize) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn with_scale(mut self, scale: ColorScale) -> Self {
        self.scale = scale;
        self
    }
}

/// Caption and axis titles of a chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartLabels {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl ChartLabels {
    pub fn new(title: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
        }
    }
}

/// One bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub category: String,
    pub value: f64,
    /// Value formatted with the encoding's decimals
    pub label: String,
    pub color: Rgb,
    /// (column, formatted value) pairs for the tooltip
    pub hover: Vec<(String, String)>,
}

impl Bar {
    /// Tooltip text: category, metric label, then auxiliary columns.
    pub fn tooltip(&self) -> String {
        let mut text = format!("{}: {}", self.category, self.label);
        for (name, value) in &self.hover {
            text.push_str(&format!("\n{}: {}", name, value));
        }
        text
    }
}

/// Renderer-independent bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub labels: ChartLabels,
    pub bars: Vec<Bar>,
    pub decimals: usize,
    pub scale: ColorScale,
}

impl BarChart {
    /// Materialize a table into bars, one per row with a non-null metric.
    pub fn from_frame(df: &DataFrame, encoding: &BarEncoding, labels: ChartLabels) -> DashResult<Self> {
        let categories = display_column(df, &encoding.x, encoding.decimals)?;
        let values = extract_f64_column(df, &encoding.y)?;
        let hover_columns = encoding
            .hover
            .iter()
            .map(|name| display_column(df, name, 2).map(|cells| (name.clone(), cells)))
            .collect::<DashResult<Vec<_>>>()?;

        let (min, max) = values
            .iter()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

        let bars = values
            .iter()
            .enumerate()
            .filter_map(|(row, value)| value.map(|v| (row, v)))
            .map(|(row, value)| Bar {
                category: categories[row].clone(),
                value,
                label: format_value(value, encoding.decimals),
                color: encoding.scale.map(value, min, max),
                hover: hover_columns
                    .iter()
                    .map(|(name, cells)| (name.clone(), cells[row].clone()))
                    .collect(),
            })
            .collect();

        Ok(Self {
            labels,
            bars,
            decimals: encoding.decimals,
            scale: encoding.scale,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Largest bar value, 0 for an empty chart.
    pub fn max_value(&self) -> f64 {
        self.bars.iter().map(|b| b.value).fold(0.0, f64::max)
    }
}

/// Fixed-decimal label.
pub fn format_value(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

/// Cells of a column as display strings; floats get `float_decimals`.
fn display_column(df: &DataFrame, name: &str, float_decimals: usize) -> DashResult<Vec<String>> {
    let column = df
        .column(name)
        .map_err(|_| DashError::missing_column(name))?;

    if column.dtype().is_float() {
        return Ok(extract_f64_column(df, name)?
            .into_iter()
            .map(|v| v.map(|v| format_value(v, float_decimals)).unwrap_or_default())
            .collect());
    }

    if column.dtype() == &DataType::String {
        return Ok(extract_str_column(df, name)?
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect());
    }

    let text = column
        .cast(&DataType::String)
        .map_err(|e| DashError::polars("formatting column", e))?;
    let text = text
        .str()
        .map_err(|_| DashError::type_mismatch(name, "str", text.dtype().to_string()))?;
    Ok(text
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}
