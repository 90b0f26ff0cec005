//! Movie ratings analytics dashboard.
//!
//! Loads a delimited movie table, cleans and normalizes it with Polars,
//! derives ranked and aggregated views behind a (genre, year) selection,
//! and renders them as bar charts.

pub mod types;
pub mod error;
pub mod data_loader;
pub mod data_pipeline;
pub mod views;
pub mod chart;
pub mod render;
pub mod dashboard;
pub mod logger;

pub use types::*;
pub use error::{DashError, DashResult};
pub use data_loader::DataLoader;
pub use data_pipeline::{DataPipeline, PipelineConfig};
pub use views::ViewLimits;
pub use chart::{Bar, BarChart, BarEncoding, ChartLabels, ColorScale, Rgb};
pub use render::{ChartRenderer, RenderConfig, SvgRenderer, TextRenderer};
pub use dashboard::{Dashboard, DashboardConfig, Panel, PanelKind, RenderedPanel};
pub use logger::{init_logging, LogLevel};
