use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Position of a record in the catalog.
///
/// The same handle addresses the record, its feature vector and its row in the
/// similarity index. Only the catalog creates these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RowIndex(pub(crate) usize);

impl RowIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

impl Display for RowIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One catalog entry. `None` means the column was absent for this row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MovieRecord {
    pub id: i64,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub keywords: Option<String>,
    pub genres: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
    pub release_date: Option<NaiveDate>,
}

impl MovieRecord {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_overview(mut self, overview: impl Into<String>) -> Self {
        self.overview = Some(overview.into());
        self
    }

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    pub fn with_genres(mut self, genres: impl Into<String>) -> Self {
        self.genres = Some(genres.into());
        self
    }

    pub fn with_votes(mut self, vote_average: f64, vote_count: u64) -> Self {
        self.vote_average = Some(vote_average);
        self.vote_count = Some(vote_count);
        self
    }

    pub fn with_release_date(mut self, release_date: NaiveDate) -> Self {
        self.release_date = Some(release_date);
        self
    }

    pub fn title_text(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    pub fn overview_text(&self) -> &str {
        self.overview.as_deref().unwrap_or_default()
    }

    /// ISO date, or an empty string when unknown
    pub fn release_date_text(&self) -> String {
        self.release_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_fields_render_empty() {
        let record = MovieRecord {
            id: 7,
            ..Default::default()
        };
        assert_eq!(record.title_text(), "");
        assert_eq!(record.overview_text(), "");
        assert_eq!(record.release_date_text(), "");
    }

    #[test]
    fn test_present_but_empty_is_distinct_from_absent() {
        let record = MovieRecord::new(1, "Heat").with_overview("");
        assert_eq!(record.overview, Some(String::new()));
        assert_ne!(record.overview, None);
    }

    #[test]
    fn test_release_date_text() {
        let record = MovieRecord::new(1, "Heat")
            .with_release_date(NaiveDate::from_ymd_opt(1995, 12, 15).unwrap());
        assert_eq!(record.release_date_text(), "1995-12-15");
    }
}
