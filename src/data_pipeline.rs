//! Data Pipeline module for cleaning and normalizing the movie table.
//!
//! Stages:
//! - Cleaning: null-sentinel handling and lenient type coercion
//! - Required-field filter (title, genres, year, rating)
//! - Genre explosion into one row per (movie, genre) pair
//! - The two filtered explosions the dashboard views are built from
//!
//! Every stage takes an immutable `DataFrame` and returns a new one.

use polars::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{DashError, DashResult};
use crate::types::{columns, CleaningReport};

/// Configuration for the data pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Placeholder token meaning "missing value" in the source file
    pub null_sentinel: String,
    /// Separator between tags in the `genres` column
    pub genre_delimiter: String,
    /// Genre removed from every exploded view
    pub excluded_genre: String,
    /// Releases in or before this year are left out of the browsable view
    pub min_year_exclusive: i32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            null_sentinel: r"\N".to_string(),
            genre_delimiter: ",".to_string(),
            excluded_genre: "Adult".to_string(),
            min_year_exclusive: 1919,
        }
    }
}

/// The main Data Pipeline processor
#[derive(Debug, Clone, Default)]
pub struct DataPipeline {
    config: PipelineConfig,
}

impl DataPipeline {
    /// Create a new DataPipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Create a new DataPipeline with default configuration
    pub fn with_defaults() -> Self {
        Self::new(PipelineConfig::default())
    }

    /// Get the current configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Clean a raw text table.
    ///
    /// Steps:
    /// 1. Runtime, year and votes: sentinel to null, otherwise cast to integer
    /// 2. Genres: split into non-empty tags; sentinel or no tag left to null
    /// 3. Rating: cast to float
    /// 4. Drop rows lacking title, genres, year or rating
    ///
    /// Numeric text is trimmed before casting. Casts are non-strict: an
    /// unparseable value becomes null.
    pub fn clean(&self, raw: DataFrame) -> DashResult<(DataFrame, CleaningReport)> {
        for name in columns::REQUIRED {
            if raw.column(name).is_err() {
                return Err(DashError::missing_column(name));
            }
        }

        let sentinel = self.config.null_sentinel.as_str();
        let text = raw
            .lazy()
            .with_columns(
                columns::REQUIRED
                    .iter()
                    .map(|name| col(*name).cast(DataType::String))
                    .collect::<Vec<_>>(),
            )
            .collect()
            .map_err(|e| DashError::polars("normalizing raw columns", e))?;

        let typed = text
            .clone()
            .lazy()
            .with_columns([
                self.sentinel_cast(columns::RUNTIME, DataType::Int32),
                self.sentinel_cast(columns::YEAR, DataType::Int32),
                self.sentinel_cast(columns::VOTES, DataType::Int64),
                trimmed(columns::RATING).cast(DataType::Float64).alias(columns::RATING),
                self.split_genres(),
            ])
            .collect()
            .map_err(|e| DashError::polars("coercing column types", e))?;

        let mut report = CleaningReport {
            total_rows: text.height(),
            runtime_coerced: coerced_count(&text, &typed, columns::RUNTIME, Some(sentinel))?,
            year_coerced: coerced_count(&text, &typed, columns::YEAR, Some(sentinel))?,
            rating_coerced: coerced_count(&text, &typed, columns::RATING, None)?,
            votes_coerced: coerced_count(&text, &typed, columns::VOTES, Some(sentinel))?,
            ..Default::default()
        };

        let cleaned = typed
            .lazy()
            .filter(
                col(columns::TITLE)
                    .is_not_null()
                    .and(col(columns::GENRES).is_not_null())
                    .and(col(columns::YEAR).is_not_null())
                    .and(col(columns::RATING).is_not_null()),
            )
            .collect()
            .map_err(|e| DashError::polars("dropping incomplete rows", e))?;

        report.kept_rows = cleaned.height();
        report.dropped_rows = report.total_rows - report.kept_rows;

        info!(
            total = report.total_rows,
            kept = report.kept_rows,
            "cleaned movie table"
        );
        if report.dropped_rows > 0 {
            warn!(dropped = report.dropped_rows, "dropped rows missing required fields");
        }
        if report.total_coerced() > 0 {
            debug!(?report, "unparseable values coerced to null");
        }

        Ok((cleaned, report))
    }

    /// `when(trim(value) == sentinel) null otherwise cast(trim(value))`
    fn sentinel_cast(&self, name: &str, dtype: DataType) -> Expr {
        let value = trimmed(name);
        when(value.clone().eq(lit(self.config.null_sentinel.clone())))
            .then(lit(NULL).cast(dtype.clone()))
            .otherwise(value.cast(dtype))
            .alias(name)
    }

    /// Split into tags and drop empty ones. A cell holding the sentinel or
    /// no non-empty tag becomes null, so the row is dropped like any other
    /// row without genres.
    fn split_genres(&self) -> Expr {
        let genres = col(columns::GENRES);
        let tags = genres
            .clone()
            .str()
            .split(lit(self.config.genre_delimiter.clone()))
            .list()
            .eval(col("").filter(col("").neq(lit(""))), false);

        when(
            genres
                .neq(lit(self.config.null_sentinel.clone()))
                .and(tags.clone().list().len().gt(lit(0))),
        )
        .then(tags)
        .otherwise(lit(NULL))
        .alias(columns::GENRES)
    }

    /// One row per (movie, genre tag), with the tag in a new `genre` column.
    ///
    /// Null and empty tags produce no row. All other columns, including the
    /// original `genres` list, are duplicated unchanged.
    pub fn explode_genres(&self, cleaned: &DataFrame) -> DashResult<DataFrame> {
        let exploded = self
            .explode_lazy(cleaned)
            .collect()
            .map_err(|e| DashError::polars("exploding genres", e))?;

        debug!(
            movies = cleaned.height(),
            rows = exploded.height(),
            "exploded genres"
        );
        Ok(exploded)
    }

    fn explode_lazy(&self, cleaned: &DataFrame) -> LazyFrame {
        cleaned
            .clone()
            .lazy()
            .with_column(col(columns::GENRES).alias(columns::GENRE))
            .explode([col(columns::GENRE)])
            .filter(
                col(columns::GENRE)
                    .is_not_null()
                    .and(col(columns::GENRE).neq(lit(""))),
            )
    }

    /// Exploded rows offered for browsing: excluded genre removed and only
    /// releases after `min_year_exclusive`.
    pub fn browsable(&self, cleaned: &DataFrame) -> DashResult<DataFrame> {
        let df = self
            .explode_lazy(cleaned)
            .filter(
                col(columns::GENRE)
                    .neq(lit(self.config.excluded_genre.clone()))
                    .and(col(columns::YEAR).gt(lit(self.config.min_year_exclusive))),
            )
            .collect()
            .map_err(|e| DashError::polars("building browsable view", e))?;

        debug!(rows = df.height(), "built browsable view");
        Ok(df)
    }

    /// Exploded rows feeding the weighted genre ranking: excluded genre and
    /// sentinel tags removed, no year restriction.
    pub fn scoring_base(&self, cleaned: &DataFrame) -> DashResult<DataFrame> {
        let df = self
            .explode_lazy(cleaned)
            .filter(
                col(columns::GENRE)
                    .neq(lit(self.config.excluded_genre.clone()))
                    .and(col(columns::GENRE).neq(lit(self.config.null_sentinel.clone()))),
            )
            .collect()
            .map_err(|e| DashError::polars("building scoring base", e))?;

        debug!(rows = df.height(), "built scoring base");
        Ok(df)
    }
}

/// Text column with surrounding whitespace removed.
fn trimmed(name: &str) -> Expr {
    col(name).str().strip_chars(lit(NULL))
}

/// Number of values present in `text` (and not the sentinel) that came out
/// null in `typed`.
fn coerced_count(
    text: &DataFrame,
    typed: &DataFrame,
    name: &str,
    sentinel: Option<&str>,
) -> DashResult<usize> {
    let raw = text
        .column(name)
        .map_err(|_| DashError::missing_column(name))?
        .str()
        .map_err(|_| DashError::type_mismatch(name, "str", "non-text"))?;

    let present = raw
        .into_iter()
        .filter(|v| match (v, sentinel) {
            (Some(s), Some(token)) => s.trim() != token,
            (Some(_), None) => true,
            (None, _) => false,
        })
        .count();

    let column = typed
        .column(name)
        .map_err(|_| DashError::missing_column(name))?;
    let parsed = column.len() - column.null_count();

    Ok(present.saturating_sub(parsed))
}

// ============================================================================
// Tests
// ============================================================================
