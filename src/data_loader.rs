//! Data loading module using Polars.
//!
//! Reads the delimited movie file with every column kept as text. Typing
//! happens later in the cleaning pipeline, so a malformed cell can never
//! abort the load; only a missing file or a missing column can.

use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{DashError, DashResult};
use crate::types::{columns, MovieRecord};

/// Extensions accepted by [`DataLoader::load_from_file`].
const SUPPORTED_EXTENSIONS: [&str; 3] = ["csv", "tsv", "txt"];

/// Loader for the raw movie table.
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Field separator (default `,`)
    separator: u8,
    /// Token written for missing values by [`DataLoader::raw_from_records`]
    null_sentinel: String,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new DataLoader with default settings.
    pub fn new() -> Self {
        Self {
            separator: b',',
            null_sentinel: r"\N".to_string(),
        }
    }

    /// Set the field separator.
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_null_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.null_sentinel = sentinel.into();
        self
    }

    pub fn separator(&self) -> u8 {
        self.separator
    }

    /// Load the raw table from a delimited text file.
    ///
    /// # Returns
    /// * `Ok(DataFrame)` - every column as `String`, header names preserved
    /// * `Err(DashError)` - missing file, unsupported extension, unreadable
    ///   content or a required column absent from the header
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> DashResult<DataFrame> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DashError::file_not_found(path.display().to_string()));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(DashError::unsupported_format(extension));
        }

        let df = self.read_text_table(path)?;
        self.validate_columns(&df)?;

        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded raw movie table"
        );
        Ok(df)
    }

    /// Read the file with schema inference disabled so every column is text.
    fn read_text_table(&self, path: &Path) -> DashResult<DataFrame> {
        let separator = self.separator;
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .map_parse_options(|opts| opts.with_separator(separator))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .map_err(|e| DashError::read_error(path.display().to_string(), e.to_string()))?
            .finish()
            .map_err(|e| DashError::read_error(path.display().to_string(), e.to_string()))
    }

    /// Validate that required columns exist.
    pub fn validate_columns(&self, df: &DataFrame) -> DashResult<()> {
        for name in columns::REQUIRED {
            if df.column(name).is_err() {
                return Err(DashError::missing_column(name));
            }
        }
        Ok(())
    }

    /// Build a raw text table from typed records (for tests and benches).
    ///
    /// Missing values are written as the null sentinel, except the rating
    /// which has no sentinel in the source data and becomes a null cell.
    pub fn raw_from_records(&self, records: &[MovieRecord]) -> DashResult<DataFrame> {
        let sentinel = || Some(self.null_sentinel.clone());
        let text_or_sentinel = |value: Option<String>| value.or_else(sentinel);

        let titles: Vec<Option<String>> = records.iter().map(|r| r.title.clone()).collect();
        let runtimes: Vec<Option<String>> = records
            .iter()
            .map(|r| text_or_sentinel(r.runtime_minutes.map(|v| v.to_string())))
            .collect();
        let genres: Vec<Option<String>> = records
            .iter()
            .map(|r| text_or_sentinel(r.genres.as_ref().map(|g| g.join(","))))
            .collect();
        let years: Vec<Option<String>> = records
            .iter()
            .map(|r| text_or_sentinel(r.start_year.map(|v| v.to_string())))
            .collect();
        let ratings: Vec<Option<String>> = records
            .iter()
            .map(|r| r.average_rating.map(|v| v.to_string()))
            .collect();
        let votes: Vec<Option<String>> = records
            .iter()
            .map(|r| text_or_sentinel(r.num_votes.map(|v| v.to_string())))
            .collect();

        let df = df! {
            columns::TITLE => titles,
            columns::RUNTIME => runtimes,
            columns::GENRES => genres,
            columns::YEAR => years,
            columns::RATING => ratings,
            columns::VOTES => votes,
        }
        .map_err(|e| DashError::polars("building raw table", e))?;

        debug!(rows = df.height(), "built raw table from records");
        Ok(df)
    }
}

/// Extract a text column, nulls kept as `None`.
pub fn extract_str_column(df: &DataFrame, name: &str) -> DashResult<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| DashError::missing_column(name))?;

    let chunked = column
        .str()
        .map_err(|_| DashError::type_mismatch(name, "str", column.dtype().to_string()))?;

    Ok(chunked.into_iter().map(|opt| opt.map(str::to_string)).collect())
}

/// Extract an integer column as i64, nulls kept as `None`.
pub fn extract_i64_column(df: &DataFrame, name: &str) -> DashResult<Vec<Option<i64>>> {
    let column = df
        .column(name)
        .map_err(|_| DashError::missing_column(name))?;

    if !column.dtype().is_integer() {
        return Err(DashError::type_mismatch(name, "integer", column.dtype().to_string()));
    }

    let cast = column
        .cast(&DataType::Int64)
        .map_err(|e| DashError::polars("cast to i64", e))?;
    let chunked = cast
        .i64()
        .map_err(|_| DashError::type_mismatch(name, "i64", cast.dtype().to_string()))?;

    Ok(chunked.into_iter().collect())
}

/// Extract any numeric column as f64, nulls kept as `None`.
pub fn extract_f64_column(df: &DataFrame, name: &str) -> DashResult<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| DashError::missing_column(name))?;

    if !column.dtype().is_numeric() {
        return Err(DashError::type_mismatch(name, "numeric", column.dtype().to_string()));
    }

    let cast = column
        .cast(&DataType::Float64)
        .map_err(|e| DashError::polars("cast to f64", e))?;
    let chunked = cast
        .f64()
        .map_err(|_| DashError::type_mismatch(name, "f64", cast.dtype().to_string()))?;

    Ok(chunked.into_iter().collect())
}
