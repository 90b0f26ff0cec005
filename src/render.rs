//! Chart rendering backends.
//!
//! [`SvgRenderer`] draws with Plotters into an in-memory SVG document;
//! [`TextRenderer`] draws block bars for the terminal. Both consume the
//! same [`BarChart`] and neither touches the filesystem.

use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::chart::{format_value, BarChart};
use crate::error::DashResult;

/// Anything that turns a chart into a document.
pub trait ChartRenderer: Send + Sync {
    /// Render one chart to a string.
    fn render(&self, chart: &BarChart) -> DashResult<String>;

    /// File extension for rendered output, without the dot.
    fn extension(&self) -> &'static str;
}

/// Output sizes for the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// SVG width in pixels
    pub width: u32,
    /// SVG height in pixels
    pub height: u32,
    /// Longest text bar in characters
    pub text_bar_width: usize,
    /// Category names longer than this are shortened
    pub max_category_chars: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 560,
            text_bar_width: 40,
            max_category_chars: 24,
        }
    }
}

/// Shorten `text` to `max` characters, marking the cut with an ellipsis.
pub fn truncate_label(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ============================================================================
// SVG
// ============================================================================

/// Plotters-backed SVG renderer.
#[derive(Debug, Clone, Default)]
pub struct SvgRenderer {
    config: RenderConfig,
}

impl SvgRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Draw the chart and return the SVG text plus one pixel box per bar.
    fn draw(&self, chart: &BarChart) -> DashResult<(String, Vec<(i32, i32, i32, i32)>)> {
        let mut buffer = String::new();
        let mut hit_boxes = Vec::with_capacity(chart.len());

        {
            let root = SVGBackend::with_string(&mut buffer, (self.config.width, self.config.height))
                .into_drawing_area();
            root.fill(&WHITE)?;

            let slots = chart.len().max(1);
            let y_max = if chart.max_value() > 0.0 {
                chart.max_value() * 1.15
            } else {
                1.0
            };

            let categories: Vec<String> = chart
                .bars
                .iter()
                .map(|bar| truncate_label(&bar.category, self.config.max_category_chars))
                .collect();
            let decimals = chart.decimals;

            let mut ctx = ChartBuilder::on(&root)
                .caption(&chart.labels.title, ("sans-serif", 22).into_font())
                .margin(15)
                .x_label_area_size(50)
                .y_label_area_size(80)
                .build_cartesian_2d((0..slots).into_segmented(), 0f64..y_max)?;

            ctx.configure_mesh()
                .disable_x_mesh()
                .x_labels(slots)
                .x_desc(&chart.labels.x_label)
                .y_desc(&chart.labels.y_label)
                .x_label_formatter(&|segment: &SegmentValue<usize>| match segment {
                    SegmentValue::CenterOf(i) => categories.get(*i).cloned().unwrap_or_default(),
                    _ => String::new(),
                })
                .y_label_formatter(&|v: &f64| format_value(*v, decimals))
                .draw()?;

            ctx.draw_series(chart.bars.iter().enumerate().map(|(i, bar)| {
                let color = RGBColor(bar.color.0, bar.color.1, bar.color.2);
                let mut rect = Rectangle::new(
                    [
                        (SegmentValue::Exact(i), 0.0),
                        (SegmentValue::Exact(i + 1), bar.value),
                    ],
                    color.filled(),
                );
                rect.set_margin(0, 0, 4, 4);
                rect
            }))?;

            let label_style = TextStyle::from(("sans-serif", 12).into_font())
                .pos(Pos::new(HPos::Center, VPos::Bottom));
            ctx.draw_series(chart.bars.iter().enumerate().map(|(i, bar)| {
                Text::new(
                    bar.label.clone(),
                    (SegmentValue::CenterOf(i), bar.value),
                    label_style.clone(),
                )
            }))?;

            if chart.is_empty() {
                let notice_style = TextStyle::from(("sans-serif", 16).into_font())
                    .pos(Pos::new(HPos::Center, VPos::Center));
                ctx.draw_series(std::iter::once(Text::new(
                    "No movies match this selection".to_string(),
                    (SegmentValue::CenterOf(0), y_max / 2.0),
                    notice_style,
                )))?;
            }

            for (i, bar) in chart.bars.iter().enumerate() {
                let (x0, y0) = ctx.backend_coord(&(SegmentValue::Exact(i), bar.value));
                let (x1, y1) = ctx.backend_coord(&(SegmentValue::Exact(i + 1), 0.0));
                hit_boxes.push((x0, y0, x1, y1));
            }

            root.present()?;
        }

        Ok((buffer, hit_boxes))
    }
}

impl ChartRenderer for SvgRenderer {
    /// Render to SVG. Every bar gets a transparent overlay carrying a
    /// `<title>` so hovering shows its tooltip.
    fn render(&self, chart: &BarChart) -> DashResult<String> {
        let (mut svg, hit_boxes) = self.draw(chart)?;

        let overlays: String = chart
            .bars
            .iter()
            .zip(hit_boxes)
            .map(|(bar, (x0, y0, x1, y1))| {
                format!(
                    "<rect class=\"hover\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#000000\" fill-opacity=\"0\"><title>{}</title></rect>\n",
                    x0.min(x1),
                    y0.min(y1),
                    (x1 - x0).abs(),
                    (y1 - y0).abs(),
                    escape_xml(&bar.tooltip()),
                )
            })
            .collect();

        match svg.rfind("</svg>") {
            Some(end) => svg.insert_str(end, &overlays),
            None => svg.push_str(&overlays),
        }
        Ok(svg)
    }

    fn extension(&self) -> &'static str {
        "svg"
    }
}

// ============================================================================
// Text
// ============================================================================

/// Terminal renderer drawing one block bar per line.
#[derive(Debug, Clone, Default)]
pub struct TextRenderer {
    config: RenderConfig,
}

impl TextRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }
}

impl ChartRenderer for TextRenderer {
    fn render(&self, chart: &BarChart) -> DashResult<String> {
        let mut out = format!("=== {} ===\n", chart.labels.title);
        out.push_str(&format!(
            "x: {} | y: {} | colour: {}\n",
            chart.labels.x_label, chart.labels.y_label, chart.scale
        ));

        if chart.is_empty() {
            out.push_str("(no data)\n");
            return Ok(out);
        }

        let width = self.config.max_category_chars;
        let max = chart.max_value();
        for bar in &chart.bars {
            let filled = if max > 0.0 {
                ((bar.value / max) * self.config.text_bar_width as f64).round() as usize
            } else {
                0
            };
            let category = truncate_label(&bar.category, width);
            let padding = width.saturating_sub(category.chars().count());
            out.push_str(&format!(
                "{}{} {} {}",
                category,
                " ".repeat(padding),
                "█".repeat(filled.max(1)),
                bar.label
            ));
            if !bar.hover.is_empty() {
                let hover: Vec<String> = bar
                    .hover
                    .iter()
                    .map(|(name, value)| format!("{}={}", name, value))
                    .collect();
                out.push_str(&format!("  ({})", hover.join(", ")));
            }
            out.push('\n');
        }
        Ok(out)
    }

    fn extension(&self) -> &'static str {
        "txt"
    }
}
