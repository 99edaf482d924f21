use tracing::instrument;

use crate::{
    catalog::Catalog,
    models::{round_to, MovieRecord, PopularMovie, PopularityStats},
};

/// Vote-count percentile used when none is given
pub const DEFAULT_PERCENTILE: f64 = 0.9;

/// Minimum-votes threshold `m` and catalog-wide mean rating `C`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub min_votes: f64,
    pub mean_rating: f64,
}

impl Baseline {
    pub fn compute(catalog: &Catalog, percentile: f64) -> Self {
        let mut counts: Vec<f64> = catalog
            .records()
            .iter()
            .filter_map(|r| r.vote_count)
            .map(|v| v as f64)
            .collect();
        counts.sort_by(f64::total_cmp);

        let ratings: Vec<f64> = catalog.records().iter().filter_map(|r| r.vote_average).collect();
        let mean_rating = if ratings.is_empty() {
            0.0
        } else {
            ratings.iter().sum::<f64>() / ratings.len() as f64
        };

        Self {
            min_votes: quantile(&counts, percentile),
            mean_rating,
        }
    }

    /// Vote count at or above `m`
    fn meets_threshold(&self, record: &MovieRecord) -> bool {
        record
            .vote_count
            .is_some_and(|v| v as f64 >= self.min_votes)
    }

    /// Rankable: meets the threshold and has a known average to blend
    fn rankable(&self, record: &MovieRecord) -> bool {
        record.vote_average.is_some() && self.meets_threshold(record)
    }

    pub fn weighted_rating(&self, vote_count: u64, vote_average: f64) -> f64 {
        weighted_rating(vote_count as f64, vote_average, self.min_votes, self.mean_rating)
    }
}

/// Linear interpolation between closest ranks over sorted `values`
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// `(v / (v + m)) * R + (m / (v + m)) * C`
pub fn weighted_rating(v: f64, r: f64, m: f64, c: f64) -> f64 {
    let total = v + m;
    if total == 0.0 {
        return c;
    }
    (v / total) * r + (m / total) * c
}

/// Top `n` movies by weighted rating among those at or above the vote-count
/// `percentile`. Equal ratings keep catalog order.
#[instrument(skip(catalog))]
pub fn top_popular(catalog: &Catalog, n: usize, percentile: f64) -> Vec<PopularMovie> {
    let baseline = Baseline::compute(catalog, percentile);

    let mut scored: Vec<(&MovieRecord, f64)> = catalog
        .records()
        .iter()
        .filter(|r| baseline.rankable(r))
        .map(|r| {
            let score = baseline.weighted_rating(
                r.vote_count.unwrap_or_default(),
                r.vote_average.unwrap_or_default(),
            );
            (r, score)
        })
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    tracing::debug!(
        min_votes = baseline.min_votes,
        mean_rating = baseline.mean_rating,
        qualified = scored.len(),
        "Ranked popular movies"
    );

    scored
        .into_iter()
        .take(n)
        .map(|(record, score)| PopularMovie {
            id: record.id,
            title: record.title_text().to_string(),
            weighted_rating: round_to(score, 2),
            vote_average: record.vote_average.unwrap_or_default(),
            vote_count: record.vote_count.unwrap_or_default(),
            release_date: record.release_date_text(),
            overview: record.overview_text().to_string(),
        })
        .collect()
}

/// Catalog size and the numbers behind the default ranking
pub fn stats(catalog: &Catalog) -> PopularityStats {
    let baseline = Baseline::compute(catalog, DEFAULT_PERCENTILE);
    let qualified = catalog
        .records()
        .iter()
        .filter(|r| baseline.meets_threshold(r))
        .count();

    PopularityStats {
        total_movies: catalog.len(),
        qualified_movies: qualified,
        min_vote_threshold: round_to(baseline.min_votes, 2),
        mean_vote_average: round_to(baseline.mean_rating, 2),
    }
}
