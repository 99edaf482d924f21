//! Catalog loaders
//!
//! The catalog does no I/O of its own; a `CatalogSource` hands it fully decoded
//! records. Both shipped sources read the same movies CSV layout, from disk or
//! over HTTP.
use chrono::NaiveDate;
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::MovieRecord,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    /// Returns every record, in the order the catalog should keep
    async fn load(&self) -> AppResult<Vec<MovieRecord>>;

    /// Human-readable origin for logging
    fn describe(&self) -> String;
}

/// Movies CSV on the local filesystem
pub struct CsvFileSource {
    path: String,
}

impl CsvFileSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl CatalogSource for CsvFileSource {
    async fn load(&self) -> AppResult<Vec<MovieRecord>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| AppError::Catalog(format!("Failed to read {}: {}", self.path, e)))?;
        parse_movies_csv(&bytes)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path)
    }
}

/// Movies CSV fetched over HTTP
pub struct HttpCsvSource {
    http_client: HttpClient,
    url: String,
}

impl HttpCsvSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            url: url.into(),
        }
    }
}

#[async_trait::async_trait]
impl CatalogSource for HttpCsvSource {
    async fn load(&self) -> AppResult<Vec<MovieRecord>> {
        tracing::info!(url = %self.url, "Downloading movie catalog");

        let response = self.http_client.get(&self.url).send().await?;

        if !response.status().is_success() {
            return Err(AppError::Catalog(format!(
                "Catalog download failed with status {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        parse_movies_csv(&bytes)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Raw CSV row; typing happens in `into_record`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CsvRow {
    id: Option<String>,
    title: Option<String>,
    overview: Option<String>,
    keywords: Option<String>,
    genres: Option<String>,
    vote_average: Option<String>,
    vote_count: Option<String>,
    release_date: Option<String>,
}

impl CsvRow {
    fn into_record(self, line: usize) -> AppResult<MovieRecord> {
        let raw_id = self
            .id
            .ok_or_else(|| AppError::Catalog(format!("Row {} has no id", line)))?;
        let id = parse_integer(&raw_id)
            .ok_or_else(|| AppError::Catalog(format!("Row {} has invalid id '{}'", line, raw_id)))?;

        let release_date = self.release_date.and_then(|raw| {
            let parsed = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok();
            if parsed.is_none() {
                tracing::warn!(id, value = %raw, "Ignoring unparseable release date");
            }
            parsed
        });

        Ok(MovieRecord {
            id,
            title: self.title,
            overview: self.overview,
            keywords: self.keywords,
            genres: self.genres,
            vote_average: self.vote_average.and_then(|v| v.trim().parse().ok()),
            vote_count: self
                .vote_count
                .and_then(|v| parse_integer(&v))
                .and_then(|v| u64::try_from(v).ok()),
            release_date,
        })
    }
}

/// Accepts "42" as well as "42.0"
fn parse_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    trimmed.parse::<i64>().ok().or_else(|| {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

/// Decodes a movies CSV; unknown columns are ignored
pub fn parse_movies_csv(bytes: &[u8]) -> AppResult<Vec<MovieRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let mut records = Vec::new();
    for (row, result) in reader.deserialize::<CsvRow>().enumerate() {
        let raw = result.map_err(|e| AppError::Catalog(format!("Malformed CSV: {}", e)))?;
        // header is line 1
        records.push(raw.into_record(row + 2)?);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
id,title,overview,release_date,keywords,genres,vote_average,vote_count,popularity
19995,Avatar,In the 22nd century a paraplegic Marine,2009-12-10,culture clash future,Action Adventure,7.2,11800,150.4
285,Pirates,,2007-05-19,ocean,Adventure,6.9,4500.0,139.1
9999,Untitled,,not-a-date,,,,,
";

    #[test]
    fn test_parse_movies_csv() {
        let records = parse_movies_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].id, 19995);
        assert_eq!(records[0].title.as_deref(), Some("Avatar"));
        assert_eq!(records[0].vote_count, Some(11800));
        assert_eq!(records[0].vote_average, Some(7.2));
        assert_eq!(records[0].release_date_text(), "2009-12-10");

        assert_eq!(records[1].overview, None);
        assert_eq!(records[1].vote_count, Some(4500));

        assert_eq!(records[2].release_date, None);
        assert_eq!(records[2].vote_average, None);
        assert_eq!(records[2].genres, None);
    }

    #[test]
    fn test_invalid_id_fails_load() {
        let csv = "id,title\nabc,Broken\n";
        let err = parse_movies_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, AppError::Catalog(msg) if msg.contains("abc")));
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(parse_integer(" 42 "), Some(42));
        assert_eq!(parse_integer("42.0"), Some(42));
        assert_eq!(parse_integer("42.5"), None);
        assert_eq!(parse_integer(""), None);
    }

    #[tokio::test]
    async fn test_missing_file_is_catalog_error() {
        let source = CsvFileSource::new("/nonexistent/movies.csv");
        let err = source.load().await.unwrap_err();
        assert!(matches!(err, AppError::Catalog(_)));
        assert_eq!(source.describe(), "file:/nonexistent/movies.csv");
    }
}
