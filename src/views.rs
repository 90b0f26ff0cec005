//! Derived dashboard views.
//!
//! Each view is a pure function from an immutable table to a new, small
//! table ready to be charted. Sorting always carries a secondary key so
//! that ties come out in the same order on every run:
//! rating and vote ties by title, score ties by genre.

use polars::prelude::*;
use tracing::debug;

use crate::data_loader::{extract_i64_column, extract_str_column};
use crate::error::{DashError, DashResult};
use crate::types::{columns, Selection};

/// Row limits and thresholds for the derived views.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewLimits {
    /// Rows in the per-(genre, year) top by rating
    pub top_rated: usize,
    /// Rows in the global top by votes
    pub top_voted_overall: usize,
    /// Rows per genre in the windowed top by votes
    pub top_voted_per_genre: usize,
    /// Genres with a mean vote count at or below this are not scored
    pub min_mean_votes: f64,
}

impl Default for ViewLimits {
    fn default() -> Self {
        Self {
            top_rated: 10,
            top_voted_overall: 20,
            top_voted_per_genre: 10,
            min_mean_votes: 10.0,
        }
    }
}

fn descending_then_ascending(n_desc: usize, n_asc: usize) -> SortMultipleOptions {
    let order = std::iter::repeat(true)
        .take(n_desc)
        .chain(std::iter::repeat(false).take(n_asc));
    SortMultipleOptions::default()
        .with_order_descending_multi(order)
        .with_nulls_last(true)
        .with_maintain_order(true)
}

fn as_limit(limit: usize) -> IdxSize {
    IdxSize::try_from(limit).unwrap_or(IdxSize::MAX)
}

/// Best rated movies for one (genre, year) pair.
///
/// Columns: `primaryTitle, averageRating, startYear`. A selection matching
/// nothing yields an empty table with the same columns.
pub fn top_rated_for(
    browsable: &DataFrame,
    selection: &Selection,
    limit: usize,
) -> DashResult<DataFrame> {
    let df = browsable
        .clone()
        .lazy()
        .filter(
            col(columns::GENRE)
                .eq(lit(selection.genre.clone()))
                .and(col(columns::YEAR).eq(lit(selection.year))),
        )
        .sort([columns::RATING, columns::TITLE], descending_then_ascending(1, 1))
        .limit(as_limit(limit))
        .select([col(columns::TITLE), col(columns::RATING), col(columns::YEAR)])
        .collect()
        .map_err(|e| DashError::polars("top rated for selection", e))?;

    debug!(%selection, rows = df.height(), "computed top rated view");
    Ok(df)
}

/// Genres ranked by `mean_rating * log10(mean_votes)`.
///
/// Genres whose mean vote count is not above `min_mean_votes` are dropped,
/// which keeps the logarithm positive. Columns:
/// `genre, mean_rating, mean_votes, weighted_score`.
pub fn weighted_genre_ranking(scoring_base: &DataFrame, min_mean_votes: f64) -> DashResult<DataFrame> {
    let df = scoring_base
        .clone()
        .lazy()
        .group_by([col(columns::GENRE)])
        .agg([
            col(columns::RATING).mean().alias(columns::MEAN_RATING),
            col(columns::VOTES).cast(DataType::Float64).mean().alias(columns::MEAN_VOTES),
        ])
        .filter(col(columns::MEAN_VOTES).gt(lit(min_mean_votes)))
        .with_column(
            (col(columns::MEAN_RATING) * col(columns::MEAN_VOTES).log(10.0))
                .alias(columns::WEIGHTED_SCORE),
        )
        .sort(
            [columns::WEIGHTED_SCORE, columns::GENRE],
            descending_then_ascending(1, 1),
        )
        .select([
            col(columns::GENRE),
            col(columns::MEAN_RATING),
            col(columns::MEAN_VOTES),
            col(columns::WEIGHTED_SCORE),
        ])
        .collect()
        .map_err(|e| DashError::polars("weighted genre ranking", e))?;

    debug!(genres = df.height(), "computed weighted genre ranking");
    Ok(df)
}

/// Most voted movies across all genres, from the non-exploded table.
///
/// Columns: `primaryTitle, numVotes, averageRating`.
pub fn top_voted_overall(cleaned: &DataFrame, limit: usize) -> DashResult<DataFrame> {
    let df = cleaned
        .clone()
        .lazy()
        .filter(col(columns::VOTES).is_not_null())
        .sort([columns::VOTES, columns::TITLE], descending_then_ascending(1, 1))
        .limit(as_limit(limit))
        .select([col(columns::TITLE), col(columns::VOTES), col(columns::RATING)])
        .collect()
        .map_err(|e| DashError::polars("top voted overall", e))?;

    debug!(rows = df.height(), "computed top voted view");
    Ok(df)
}

/// Windowed top-N by votes within each genre.
///
/// Rows are ordered by genre, then votes descending, then title, and each
/// row gets its 1-based position inside its genre as `rank`. Only ranks up
/// to `limit` are kept. Columns:
/// `genre, rank, primaryTitle, numVotes, averageRating, startYear`.
pub fn top_voted_per_genre(browsable: &DataFrame, limit: usize) -> DashResult<DataFrame> {
    let max_rank = i64::try_from(limit).unwrap_or(i64::MAX);
    let df = browsable
        .clone()
        .lazy()
        .filter(col(columns::VOTES).is_not_null())
        .sort(
            [columns::GENRE, columns::VOTES, columns::TITLE],
            SortMultipleOptions::default()
                .with_order_descending_multi([false, true, false])
                .with_maintain_order(true),
        )
        .with_column(partition_row_number(columns::GENRE).alias(columns::RANK))
        .filter(col(columns::RANK).lt_eq(lit(max_rank)))
        .select([
            col(columns::GENRE),
            col(columns::RANK),
            col(columns::TITLE),
            col(columns::VOTES),
            col(columns::RATING),
            col(columns::YEAR),
        ])
        .collect()
        .map_err(|e| DashError::polars("top voted per genre", e))?;

    debug!(rows = df.height(), "computed top voted per genre view");
    Ok(df)
}

/// 1-based row number inside each `key` partition, following frame order.
///
/// Unlike `rank()`, equal sort keys still get distinct, gapless numbers.
fn partition_row_number(key: &str) -> Expr {
    (int_range(lit(0).cast(IDX_DTYPE), len(), 1, IDX_DTYPE) + lit(1).cast(IDX_DTYPE)).over([col(key)])
}

/// Rows of the windowed view belonging to one genre.
pub fn rows_for_genre(per_genre: &DataFrame, genre: &str) -> DashResult<DataFrame> {
    per_genre
        .clone()
        .lazy()
        .filter(col(columns::GENRE).eq(lit(genre.to_string())))
        .collect()
        .map_err(|e| DashError::polars("rows for genre", e))
}

/// Sorted distinct genre tags of a table with a `genre` column.
pub fn distinct_genres(exploded: &DataFrame) -> DashResult<Vec<String>> {
    let df = exploded
        .clone()
        .lazy()
        .select([col(columns::GENRE)])
        .unique(None, UniqueKeepStrategy::Any)
        .sort([columns::GENRE], SortMultipleOptions::default())
        .collect()
        .map_err(|e| DashError::polars("distinct genres", e))?;

    Ok(extract_str_column(&df, columns::GENRE)?
        .into_iter()
        .flatten()
        .collect())
}

/// Sorted distinct release years of a table.
pub fn distinct_years(exploded: &DataFrame) -> DashResult<Vec<i32>> {
    let df = exploded
        .clone()
        .lazy()
        .select([col(columns::YEAR)])
        .unique(None, UniqueKeepStrategy::Any)
        .sort([columns::YEAR], SortMultipleOptions::default())
        .collect()
        .map_err(|e| DashError::polars("distinct years", e))?;

    extract_i64_column(&df, columns::YEAR)?
        .into_iter()
        .flatten()
        .map(|year| {
            i32::try_from(year)
                .map_err(|_| DashError::type_mismatch(columns::YEAR, "i32", year.to_string()))
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::{extract_f64_column, DataLoader};
    use crate::data_pipeline::DataPipeline;
    use crate::types::MovieRecord;

    fn browsable_from(records: &[MovieRecord]) -> (DataFrame, DataFrame) {
        let raw = DataLoader::new().raw_from_records(records).unwrap();
        let pipeline = DataPipeline::with_defaults();
        let (cleaned, _) = pipeline.clean(raw).unwrap();
        let browsable = pipeline.browsable(&cleaned).unwrap();
        (cleaned, browsable)
    }

    fn titles(df: &DataFrame) -> Vec<String> {
        extract_str_column(df, columns::TITLE)
            .unwrap()
            .into_iter()
            .flatten()
            .collect()
    }

    #[test]
    fn test_top_rated_example() {
        let (_, browsable) = browsable_from(&[
            MovieRecord::new("B", &["Drama"], 2000, 7.0, 500),
            MovieRecord::new("A", &["Drama"], 2000, 8.0, 1000),
        ]);
        let top = top_rated_for(&browsable, &Selection::new("Drama", 2000), 10).unwrap();
        assert_eq!(titles(&top), vec!["A", "B"]);
        assert_eq!(top.width(), 3);
    }

    #[test]
    fn test_top_rated_ties_by_title() {
        let (_, browsable) = browsable_from(&[
            MovieRecord::new("Zeta", &["Drama"], 2000, 7.0, 1),
            MovieRecord::new("Alpha", &["Drama"], 2000, 7.0, 1),
            MovieRecord::new("Mid", &["Drama"], 2000, 9.0, 1),
        ]);
        let top = top_rated_for(&browsable, &Selection::new("Drama", 2000), 10).unwrap();
        assert_eq!(titles(&top), vec!["Mid", "Alpha", "Zeta"]);
    }

    #[test]
    fn test_top_rated_empty_selection() {
        let (_, browsable) = browsable_from(&[MovieRecord::new("A", &["Drama"], 2000, 8.0, 10)]);
        let top = top_rated_for(&browsable, &Selection::new("Western", 1950), 10).unwrap();
        assert_eq!(top.height(), 0);
        assert_eq!(top.width(), 3);
    }

    #[test]
    fn test_top_rated_limit() {
        let records: Vec<MovieRecord> = (0..15)
            .map(|i| MovieRecord::new(&format!("M{:02}", i), &["Drama"], 2010, i as f64 / 2.0, 100))
            .collect();
        let (_, browsable) = browsable_from(&records);
        let top = top_rated_for(&browsable, &Selection::new("Drama", 2010), 10).unwrap();
        assert_eq!(top.height(), 10);
        assert_eq!(titles(&top)[0], "M14");
    }

    #[test]
    fn test_weighted_ranking() {
        let records = vec![
            MovieRecord::new("A", &["Drama"], 2000, 8.0, 1000),
            MovieRecord::new("B", &["Drama"], 2001, 6.0, 1000),
            MovieRecord::new("C", &["Comedy"], 2000, 9.0, 100),
            MovieRecord::new("D", &["Horror"], 2000, 9.9, 5),
            MovieRecord::new("E", &["Adult"], 2000, 9.9, 100_000),
        ];
        let raw = DataLoader::new().raw_from_records(&records).unwrap();
        let pipeline = DataPipeline::with_defaults();
        let (cleaned, _) = pipeline.clean(raw).unwrap();
        let base = pipeline.scoring_base(&cleaned).unwrap();

        let ranking = weighted_genre_ranking(&base, 10.0).unwrap();
        let genres: Vec<String> = extract_str_column(&ranking, columns::GENRE)
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        // Drama: 7.0 * 3 = 21, Comedy: 9.0 * 2 = 18, Horror has too few votes
        assert_eq!(genres, vec!["Drama", "Comedy"]);

        let scores: Vec<f64> = extract_f64_column(&ranking, columns::WEIGHTED_SCORE)
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert!((scores[0] - 21.0).abs() < 1e-9);
        assert!((scores[1] - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_voted_overall() {
        let records: Vec<MovieRecord> = (0..25)
            .map(|i| MovieRecord::new(&format!("M{:02}", i), &["Drama", "Comedy"], 2000, 7.0, i * 10))
            .chain(std::iter::once(
                MovieRecord::new("NoVotes", &["Drama"], 2000, 7.0, 0).without_votes(),
            ))
            .collect();
        let (cleaned, _) = browsable_from(&records);

        let top = top_voted_overall(&cleaned, 20).unwrap();
        assert_eq!(top.height(), 20);
        let votes: Vec<i64> = extract_i64_column(&top, columns::VOTES)
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(votes[0], 240);
        assert!(votes.windows(2).all(|w| w[0] >= w[1]));
        assert!(!titles(&top).contains(&"NoVotes".to_string()));
    }

    #[test]
    fn test_top_voted_per_genre_ranks() {
        let mut records: Vec<MovieRecord> = (0..12)
            .map(|i| MovieRecord::new(&format!("D{:02}", i), &["Drama"], 2000, 7.0, 100 + i))
            .collect();
        records.push(MovieRecord::new("C1", &["Comedy"], 2000, 7.0, 50));
        records.push(MovieRecord::new("C0", &["Comedy"], 2000, 7.0, 50));
        let (_, browsable) = browsable_from(&records);

        let ranked = top_voted_per_genre(&browsable, 10).unwrap();
        let comedy = rows_for_genre(&ranked, "Comedy").unwrap();
        let drama = rows_for_genre(&ranked, "Drama").unwrap();

        assert_eq!(titles(&comedy), vec!["C0", "C1"]);
        assert_eq!(drama.height(), 10);
        assert_eq!(titles(&drama)[0], "D11");

        let ranks: Vec<i64> = extract_i64_column(&drama, columns::RANK)
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(ranks, (1..=10).collect::<Vec<i64>>());
    }

    #[test]
    fn test_per_genre_rank_restarts_and_ignores_ties() {
        let (_, browsable) = browsable_from(&[
            MovieRecord::new("Zulu", &["Drama", "Horror"], 2000, 7.0, 99),
            MovieRecord::new("Alpha", &["Horror"], 2000, 7.0, 99),
            MovieRecord::new("Mid", &["Drama"], 2000, 7.0, 12),
            MovieRecord::new("Last", &["Horror"], 2000, 7.0, 5),
        ]);
        let ranked = top_voted_per_genre(&browsable, 10).unwrap();

        assert_eq!(
            extract_str_column(&ranked, columns::GENRE).unwrap(),
            vec![
                Some("Drama".to_string()),
                Some("Drama".to_string()),
                Some("Horror".to_string()),
                Some("Horror".to_string()),
                Some("Horror".to_string()),
            ]
        );
        assert_eq!(titles(&ranked), vec!["Zulu", "Mid", "Alpha", "Zulu", "Last"]);
        assert_eq!(
            extract_i64_column(&ranked, columns::RANK).unwrap(),
            vec![Some(1), Some(2), Some(1), Some(2), Some(3)]
        );

        let capped = top_voted_per_genre(&browsable, 1).unwrap();
        assert_eq!(titles(&capped), vec!["Zulu", "Alpha"]);
    }

    #[test]
    fn test_distinct_lists_sorted() {
        let (_, browsable) = browsable_from(&[
            MovieRecord::new("A", &["Drama", "Comedy"], 2005, 7.0, 10),
            MovieRecord::new("B", &["Action"], 1999, 7.0, 10),
            MovieRecord::new("C", &["Drama"], 2005, 7.0, 10),
            MovieRecord::new("D", &["Adult"], 2010, 7.0, 10),
            MovieRecord::new("E", &["Silent"], 1915, 7.0, 10),
        ]);
        assert_eq!(
            distinct_genres(&browsable).unwrap(),
            vec!["Action", "Comedy", "Drama"]
        );
        assert_eq!(distinct_years(&browsable).unwrap(), vec![1999, 2005]);
    }
}
