//! Core data structures for the movie dashboard.
//!
//! The working tables themselves are polars `DataFrame`s; this module holds
//! the fixed column names, the typed row used to build tables by hand, and
//! the small value types passed between pipeline stages.

use std::fmt;

/// Column names of the source file and of the derived tables.
pub mod columns {
    pub const TITLE: &str = "primaryTitle";
    pub const RUNTIME: &str = "runtimeMinutes";
    pub const GENRES: &str = "genres";
    pub const YEAR: &str = "startYear";
    pub const RATING: &str = "averageRating";
    pub const VOTES: &str = "numVotes";

    /// Single genre tag produced by the explode step.
    pub const GENRE: &str = "genre";
    /// 1-based position within a genre partition.
    pub const RANK: &str = "rank";
    pub const MEAN_RATING: &str = "mean_rating";
    pub const MEAN_VOTES: &str = "mean_votes";
    pub const WEIGHTED_SCORE: &str = "weighted_score";

    /// Columns that must be present in the input file.
    pub const REQUIRED: [&str; 6] = [TITLE, RUNTIME, GENRES, YEAR, RATING, VOTES];
}

/// One movie row with typed, nullable attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MovieRecord {
    pub title: Option<String>,
    pub runtime_minutes: Option<i32>,
    /// Genre tags in source order
    pub genres: Option<Vec<String>>,
    pub start_year: Option<i32>,
    /// 0-10 scale
    pub average_rating: Option<f64>,
    pub num_votes: Option<i64>,
}

impl MovieRecord {
    /// Convenience constructor for a fully populated row.
    pub fn new(title: &str, genres: &[&str], year: i32, rating: f64, votes: i64) -> Self {
        Self {
            title: Some(title.to_string()),
            runtime_minutes: None,
            genres: Some(genres.iter().map(|g| g.to_string()).collect()),
            start_year: Some(year),
            average_rating: Some(rating),
            num_votes: Some(votes),
        }
    }

    pub fn with_runtime(mut self, minutes: i32) -> Self {
        self.runtime_minutes = Some(minutes);
        self
    }

    pub fn without_votes(mut self) -> Self {
        self.num_votes = None;
        self
    }
}

/// The user's current (genre, year) choice.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub genre: String,
    pub year: i32,
}

impl Selection {
    pub fn new(genre: impl Into<String>, year: i32) -> Self {
        Self {
            genre: genre.into(),
            year,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.genre, self.year)
    }
}

/// Summary of what the cleaning step kept, dropped and coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleaningReport {
    /// Rows in the raw table
    pub total_rows: usize,
    /// Rows surviving the required-field filter
    pub kept_rows: usize,
    /// Rows dropped for a missing title, genres, year or rating
    pub dropped_rows: usize,
    /// Non-sentinel runtime values that failed to parse
    pub runtime_coerced: usize,
    /// Non-sentinel year values that failed to parse
    pub year_coerced: usize,
    /// Rating values that failed to parse
    pub rating_coerced: usize,
    /// Non-sentinel vote values that failed to parse
    pub votes_coerced: usize,
}

impl CleaningReport {
    /// Total number of cells turned into nulls by a failed cast.
    pub fn total_coerced(&self) -> usize {
        self.runtime_coerced + self.year_coerced + self.rating_coerced + self.votes_coerced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_record_builder() {
        let record = MovieRecord::new("Heat", &["Crime", "Drama"], 1995, 8.3, 700_000)
            .with_runtime(170)
            .without_votes();

        assert_eq!(record.title.as_deref(), Some("Heat"));
        assert_eq!(record.runtime_minutes, Some(170));
        assert_eq!(record.genres.as_ref().map(|g| g.len()), Some(2));
        assert_eq!(record.num_votes, None);
    }

    #[test]
    fn test_selection_display() {
        assert_eq!(Selection::new("Drama", 2000).to_string(), "Drama / 2000");
    }

    #[test]
    fn test_cleaning_report_total() {
        let report = CleaningReport {
            runtime_coerced: 1,
            year_coerced: 2,
            rating_coerced: 3,
            votes_coerced: 4,
            ..Default::default()
        };
        assert_eq!(report.total_coerced(), 10);
    }

    #[test]
    fn test_required_columns() {
        assert_eq!(columns::REQUIRED.len(), 6);
        assert!(columns::REQUIRED.contains(&columns::GENRES));
    }
}
