use serde::{Deserialize, Serialize};

mod movie;

pub use movie::{MovieRecord, RowIndex};

/// Rounds to a fixed number of decimal places for presentation
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

// ============================================================================
// Popularity
// ============================================================================

/// A movie ranked by weighted rating
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopularMovie {
    pub id: i64,
    pub title: String,
    pub weighted_rating: f64,
    pub vote_average: f64,
    pub vote_count: u64,
    pub release_date: String,
    pub overview: String,
}

/// Descriptive numbers behind the popularity ranking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopularityStats {
    pub total_movies: usize,
    pub qualified_movies: usize,
    pub min_vote_threshold: f64,
    pub mean_vote_average: f64,
}

// ============================================================================
// Content similarity
// ============================================================================

/// A single content-based recommendation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub release_date: String,
    pub vote_average: f64,
    pub vote_count: u64,
    pub similarity_score: f64,
}

impl Recommendation {
    pub fn from_record(record: &MovieRecord, similarity_score: f64) -> Self {
        Self {
            id: record.id,
            title: record.title_text().to_string(),
            overview: record.overview_text().to_string(),
            release_date: record.release_date_text(),
            vote_average: record.vote_average.unwrap_or(0.0),
            vote_count: record.vote_count.unwrap_or(0),
            similarity_score,
        }
    }
}

/// Result of a similar-movies lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimilarMoviesResult {
    /// Title of the catalog entry the query resolved to
    pub query_movie: String,
    pub recommendations: Vec<Recommendation>,
}

// ============================================================================
// Search
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub id: i64,
    pub title: String,
    pub release_date: String,
}

impl From<&MovieRecord> for SearchHit {
    fn from(record: &MovieRecord) -> Self {
        Self {
            id: record.id,
            title: record.title_text().to_string(),
            release_date: record.release_date_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(7.456, 2), 7.46);
        assert_eq!(round_to(1.0, 4), 1.0);
    }

    #[test]
    fn test_recommendation_defaults_for_absent_fields() {
        let record = MovieRecord::new(42, "Alien");
        let rec = Recommendation::from_record(&record, 0.5);
        assert_eq!(rec.overview, "");
        assert_eq!(rec.release_date, "");
        assert_eq!(rec.vote_average, 0.0);
        assert_eq!(rec.vote_count, 0);
    }

    #[test]
    fn test_search_hit_serialization() {
        let hit = SearchHit::from(&MovieRecord::new(3, "Spartacus"));
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["title"], "Spartacus");
        assert_eq!(json["release_date"], "");
    }
}
