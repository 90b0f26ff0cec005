//! The dashboard: base tables plus the four chart panels.
//!
//! A [`Dashboard`] owns the immutable tables derived once per load (cleaned,
//! browsable, scoring base). Every request for panels re-runs the whole
//! filter, sort, limit and chart chain for the given selection; nothing is
//! cached between selections.

use polars::prelude::DataFrame;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::chart::{BarChart, BarEncoding, ChartLabels, ColorScale};
use crate::data_loader::DataLoader;
use crate::data_pipeline::{DataPipeline, PipelineConfig};
use crate::error::{DashError, DashResult};
use crate::render::{ChartRenderer, RenderConfig};
use crate::types::{columns, CleaningReport, Selection};
use crate::views::{self, ViewLimits};

/// Everything tunable about a dashboard.
#[derive(Debug, Clone, Default)]
pub struct DashboardConfig {
    pub pipeline: PipelineConfig,
    pub limits: ViewLimits,
    pub render: RenderConfig,
}

impl DashboardConfig {
    pub fn with_limits(mut self, limits: ViewLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }
}

/// Which of the four views a panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    TopRated,
    GenreScore,
    TopVotedOverall,
    TopVotedInGenre,
}

impl PanelKind {
    pub const ALL: [PanelKind; 4] = [
        PanelKind::TopRated,
        PanelKind::GenreScore,
        PanelKind::TopVotedOverall,
        PanelKind::TopVotedInGenre,
    ];

    /// Stable file-name stem.
    pub fn slug(self) -> &'static str {
        match self {
            PanelKind::TopRated => "top_rated",
            PanelKind::GenreScore => "genre_score",
            PanelKind::TopVotedOverall => "top_voted_overall",
            PanelKind::TopVotedInGenre => "top_voted_in_genre",
        }
    }
}

/// One chart of the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub kind: PanelKind,
    pub chart: BarChart,
}

/// A panel after rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPanel {
    pub kind: PanelKind,
    pub title: String,
    pub body: String,
}

/// Row counts of the base tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSummary {
    pub movies: usize,
    pub genre_rows: usize,
    pub genres: usize,
    pub years: usize,
}

/// Loaded dataset plus the configuration used to query it.
#[derive(Debug, Clone)]
pub struct Dashboard {
    config: DashboardConfig,
    cleaned: DataFrame,
    browsable: DataFrame,
    scoring_base: DataFrame,
    report: Option<CleaningReport>,
}

impl Dashboard {
    /// Load, clean and prepare a dataset from disk.
    pub fn load<P: AsRef<Path>>(path: P, loader: &DataLoader, config: DashboardConfig) -> DashResult<Self> {
        let raw = loader.load_from_file(path)?;
        Self::from_raw(raw, config)
    }

    /// Clean and prepare a raw text table.
    pub fn from_raw(raw: DataFrame, config: DashboardConfig) -> DashResult<Self> {
        let pipeline = DataPipeline::new(config.pipeline.clone());
        let (cleaned, report) = pipeline.clean(raw)?;
        let mut dashboard = Self::from_cleaned(cleaned, config)?;
        dashboard.report = Some(report);
        Ok(dashboard)
    }

    /// Prepare an already cleaned table.
    pub fn from_cleaned(cleaned: DataFrame, config: DashboardConfig) -> DashResult<Self> {
        let pipeline = DataPipeline::new(config.pipeline.clone());
        let browsable = pipeline.browsable(&cleaned)?;
        let scoring_base = pipeline.scoring_base(&cleaned)?;

        info!(
            movies = cleaned.height(),
            browsable = browsable.height(),
            scored = scoring_base.height(),
            "dashboard ready"
        );

        Ok(Self {
            config,
            cleaned,
            browsable,
            scoring_base,
            report: None,
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn cleaned(&self) -> &DataFrame {
        &self.cleaned
    }

    pub fn browsable(&self) -> &DataFrame {
        &self.browsable
    }

    pub fn scoring_base(&self) -> &DataFrame {
        &self.scoring_base
    }

    /// Cleaning statistics, when the dashboard was built from raw data.
    pub fn cleaning_report(&self) -> Option<&CleaningReport> {
        self.report.as_ref()
    }

    /// Genre choices, sorted.
    pub fn genres(&self) -> DashResult<Vec<String>> {
        views::distinct_genres(&self.browsable)
    }

    /// Year choices, sorted.
    pub fn years(&self) -> DashResult<Vec<i32>> {
        views::distinct_years(&self.browsable)
    }

    pub fn summary(&self) -> DashResult<DashboardSummary> {
        Ok(DashboardSummary {
            movies: self.cleaned.height(),
            genre_rows: self.browsable.height(),
            genres: self.genres()?.len(),
            years: self.years()?.len(),
        })
    }

    /// First year and first genre of the choice lists, as a fresh select
    /// box would show them. `None` when nothing is browsable.
    pub fn default_selection(&self) -> DashResult<Option<Selection>> {
        let genre = self.genres()?.into_iter().next();
        let year = self.years()?.into_iter().next();
        Ok(genre.zip(year).map(|(genre, year)| Selection::new(genre, year)))
    }

    /// Check that both halves of a selection are offered choices.
    ///
    /// A valid selection can still match no movie; that is not an error.
    pub fn validate(&self, selection: &Selection) -> DashResult<()> {
        if !self.genres()?.contains(&selection.genre) {
            return Err(DashError::UnknownGenre(selection.genre.clone()));
        }
        if !self.years()?.contains(&selection.year) {
            return Err(DashError::UnknownYear(selection.year));
        }
        Ok(())
    }

    /// Build one panel.
    pub fn panel(&self, kind: PanelKind, selection: &Selection) -> DashResult<Panel> {
        let limits = &self.config.limits;
        let chart = match kind {
            PanelKind::TopRated => {
                let table = views::top_rated_for(&self.browsable, selection, limits.top_rated)?;
                BarChart::from_frame(
                    &table,
                    &BarEncoding::new(columns::TITLE, columns::RATING)
                        .with_hover(&[columns::YEAR])
                        .with_decimals(1)
                        .with_scale(ColorScale::RdYlGn),
                    ChartLabels::new(
                        format!("Top {} movies in genre {}", limits.top_rated, selection.genre),
                        "Movie title",
                        "Average rating",
                    ),
                )?
            }
            PanelKind::GenreScore => {
                let table = views::weighted_genre_ranking(&self.scoring_base, limits.min_mean_votes)?;
                BarChart::from_frame(
                    &table,
                    &BarEncoding::new(columns::GENRE, columns::WEIGHTED_SCORE)
                        .with_hover(&[columns::MEAN_RATING, columns::MEAN_VOTES])
                        .with_decimals(2)
                        .with_scale(ColorScale::Blues),
                    ChartLabels::new(
                        "Genres ranked by weighted score (rating × popularity)",
                        "Genre",
                        "Weighted score",
                    ),
                )?
            }
            PanelKind::TopVotedOverall => {
                let table = views::top_voted_overall(&self.cleaned, limits.top_voted_overall)?;
                BarChart::from_frame(
                    &table,
                    &BarEncoding::new(columns::TITLE, columns::VOTES)
                        .with_hover(&[columns::RATING])
                        .with_decimals(0)
                        .with_scale(ColorScale::Tealgrn),
                    ChartLabels::new(
                        format!(
                            "Top {} most voted movies (all genres)",
                            limits.top_voted_overall
                        ),
                        "Title",
                        "Number of votes",
                    ),
                )?
            }
            PanelKind::TopVotedInGenre => {
                let ranked = views::top_voted_per_genre(&self.browsable, limits.top_voted_per_genre)?;
                let table = views::rows_for_genre(&ranked, &selection.genre)?;
                BarChart::from_frame(
                    &table,
                    &BarEncoding::new(columns::TITLE, columns::VOTES)
                        .with_hover(&[columns::RANK, columns::RATING, columns::YEAR])
                        .with_decimals(0)
                        .with_scale(ColorScale::Viridis),
                    ChartLabels::new(
                        format!(
                            "Top {} most voted movies in genre {}",
                            limits.top_voted_per_genre, selection.genre
                        ),
                        "Movie title",
                        "Number of votes",
                    ),
                )?
            }
        };

        debug!(panel = kind.slug(), bars = chart.len(), "built panel");
        Ok(Panel { kind, chart })
    }

    /// All four panels for a selection, in display order.
    pub fn panels(&self, selection: &Selection) -> DashResult<Vec<Panel>> {
        PanelKind::ALL
            .iter()
            .map(|kind| self.panel(*kind, selection))
            .collect()
    }

    /// Render panels in parallel, keeping their order.
    pub fn render_panels(
        &self,
        panels: &[Panel],
        renderer: &dyn ChartRenderer,
    ) -> DashResult<Vec<RenderedPanel>> {
        panels
            .par_iter()
            .map(|panel| -> DashResult<RenderedPanel> {
                Ok(RenderedPanel {
                    kind: panel.kind,
                    title: panel.chart.labels.title.clone(),
                    body: renderer.render(&panel.chart)?,
                })
            })
            .collect()
    }

    /// Recompute and render every panel for `selection`, writing one file
    /// per panel into `dir`. SVG output also gets an `index.html` page.
    ///
    /// Returns the paths written, index last.
    pub fn write_report(
        &self,
        dir: &Path,
        selection: &Selection,
        renderer: &dyn ChartRenderer,
    ) -> DashResult<Vec<PathBuf>> {
        fs::create_dir_all(dir)
            .map_err(|e| DashError::IoError(format!("Failed to create directory: {}", e)))?;

        let rendered = self.render_panels(&self.panels(selection)?, renderer)?;
        let mut written = Vec::with_capacity(rendered.len() + 1);

        for panel in &rendered {
            let path = dir.join(format!("{}.{}", panel.kind.slug(), renderer.extension()));
            fs::write(&path, &panel.body)
                .map_err(|e| DashError::IoError(format!("Failed to write {}: {}", path.display(), e)))?;
            written.push(path);
        }

        if renderer.extension() == "svg" {
            let path = dir.join("index.html");
            fs::write(&path, index_page(selection, &rendered))
                .map_err(|e| DashError::IoError(format!("Failed to write {}: {}", path.display(), e)))?;
            written.push(path);
        }

        info!(dir = %dir.display(), %selection, files = written.len(), "wrote report");
        Ok(written)
    }
}

/// HTML page embedding rendered SVG panels inline.
pub fn index_page(selection: &Selection, panels: &[RenderedPanel]) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Movie analysis</title>\n</head>\n<body>\n<h1>Movie analysis</h1>\n",
    );
    html.push_str(&format!(
        "<p class=\"selection\">Year: {} | Genre: {}</p>\n",
        selection.year,
        html_escape(&selection.genre)
    ));
    for panel in panels {
        html.push_str(&format!(
            "<section id=\"{}\">\n<h2>{}</h2>\n{}\n</section>\n",
            panel.kind.slug(),
            html_escape(&panel.title),
            panel.body
        ));
    }
    html.push_str("</body>\n</html>\n");
    html
}

fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
