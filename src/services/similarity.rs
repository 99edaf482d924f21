//! Nearest-neighbour lookups over the fitted vector space.
//!
//! Vectors are unit length, so cosine similarity is a plain dot product. Two
//! strategies answer the same queries:
//!
//! - [`EagerIndex`] materializes the full `N x N` matrix once (O(N²) memory,
//!   lookups only at query time).
//! - [`LazyIndex`] keeps only the vectors and computes one row per query
//!   (O(N) memory, O(N · terms) per query).

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::{
    models::{round_to, RowIndex},
    services::vectorizer::VectorSpaceModel,
};

/// Decimal places kept on returned scores
const SCORE_PRECISION: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityStrategy {
    #[default]
    Eager,
    Lazy,
}

/// A neighbour and its similarity to the query row
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredRow {
    pub row: RowIndex,
    pub score: f64,
}

pub trait SimilarityIndex: Send + Sync {
    /// Number of rows covered
    fn len(&self) -> usize;

    /// Cosine similarity in `[0, 1]`; a row is always 1.0 to itself
    fn similarity(&self, i: RowIndex, j: RowIndex) -> f64;

    /// Similarity of `i` against every row, in row order
    fn row_scores(&self, i: RowIndex) -> Vec<f64>;

    fn strategy(&self) -> SimilarityStrategy;

    /// The `k` rows most similar to `i`, excluding `i`.
    ///
    /// Ties keep row order. Fewer than `k` rows are returned when the catalog is
    /// smaller than `k + 1`.
    fn top_k(&self, i: RowIndex, k: usize) -> Vec<ScoredRow> {
        rank(self.row_scores(i), i, k)
    }
}

/// Builds the index for the configured strategy
pub fn build_index(
    model: Arc<VectorSpaceModel>,
    strategy: SimilarityStrategy,
) -> Box<dyn SimilarityIndex> {
    match strategy {
        SimilarityStrategy::Eager => Box::new(EagerIndex::build(&model)),
        SimilarityStrategy::Lazy => Box::new(LazyIndex::new(model)),
    }
}

fn cosine(model: &VectorSpaceModel, i: usize, j: usize) -> f64 {
    if i == j {
        return 1.0;
    }
    model.vectors()[i]
        .dot(&model.vectors()[j])
        .clamp(0.0, 1.0)
}

fn rank(scores: Vec<f64>, query: RowIndex, k: usize) -> Vec<ScoredRow> {
    let mut ranked: Vec<(usize, f64)> = scores
        .into_iter()
        .enumerate()
        .filter(|(row, _)| *row != query.get())
        .collect();

    // stable: equal scores stay in row order
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    ranked
        .into_iter()
        .take(k)
        .map(|(row, score)| ScoredRow {
            row: RowIndex(row),
            score: round_to(score, SCORE_PRECISION),
        })
        .collect()
}

/// Precomputed all-pairs matrix, row-major
pub struct EagerIndex {
    size: usize,
    matrix: Vec<f64>,
}

impl EagerIndex {
    pub fn build(model: &VectorSpaceModel) -> Self {
        let start = Instant::now();
        let size = model.len();
        let mut matrix = vec![0.0; size * size];

        for i in 0..size {
            matrix[i * size + i] = 1.0;
            for j in (i + 1)..size {
                let score = cosine(model, i, j);
                matrix[i * size + j] = score;
                matrix[j * size + i] = score;
            }
        }

        tracing::info!(
            rows = size,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Built similarity matrix"
        );

        Self { size, matrix }
    }
}

impl SimilarityIndex for EagerIndex {
    fn len(&self) -> usize {
        self.size
    }

    fn similarity(&self, i: RowIndex, j: RowIndex) -> f64 {
        self.matrix[i.get() * self.size + j.get()]
    }

    fn row_scores(&self, i: RowIndex) -> Vec<f64> {
        let start = i.get() * self.size;
        self.matrix[start..start + self.size].to_vec()
    }

    fn strategy(&self) -> SimilarityStrategy {
        SimilarityStrategy::Eager
    }
}

/// Computes similarities per query from the shared vectors
pub struct LazyIndex {
    model: Arc<VectorSpaceModel>,
}

impl LazyIndex {
    pub fn new(model: Arc<VectorSpaceModel>) -> Self {
        Self { model }
    }
}

impl SimilarityIndex for LazyIndex {
    fn len(&self) -> usize {
        self.model.len()
    }

    fn similarity(&self, i: RowIndex, j: RowIndex) -> f64 {
        cosine(&self.model, i.get(), j.get())
    }

    fn row_scores(&self, i: RowIndex) -> Vec<f64> {
        (0..self.model.len())
            .map(|j| cosine(&self.model, i.get(), j))
            .collect()
    }

    fn strategy(&self) -> SimilarityStrategy {
        SimilarityStrategy::Lazy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::models::MovieRecord;
    use crate::services::vectorizer::VectorizerParams;

    fn model() -> Arc<VectorSpaceModel> {
        let catalog = Catalog::new(vec![
            MovieRecord::new(1, "Spaceward").with_overview("space adventure epic"),
            MovieRecord::new(2, "Spark of Stars").with_overview("space opera adventure"),
            MovieRecord::new(3, "Kitchen Tales").with_overview("cooking documentary"),
            MovieRecord::new(4, "Orbit").with_overview("space station drama"),
            MovieRecord::new(5, "Bake Off").with_overview("cooking contest"),
        ])
        .unwrap();
        Arc::new(VectorSpaceModel::fit(&catalog, &VectorizerParams::default()).unwrap())
    }

    fn both() -> Vec<Box<dyn SimilarityIndex>> {
        let model = model();
        vec![
            build_index(model.clone(), SimilarityStrategy::Eager),
            build_index(model, SimilarityStrategy::Lazy),
        ]
    }

    fn rows(n: usize) -> impl Iterator<Item = RowIndex> {
        (0..n).map(RowIndex)
    }

    #[test]
    fn test_self_similarity_is_one() {
        for index in both() {
            for i in rows(index.len()) {
                assert_eq!(index.similarity(i, i), 1.0, "{:?}", index.strategy());
            }
        }
    }

    #[test]
    fn test_similarity_is_symmetric_and_bounded() {
        for index in both() {
            for i in rows(index.len()) {
                for j in rows(index.len()) {
                    let s = index.similarity(i, j);
                    assert_eq!(s, index.similarity(j, i));
                    assert!((0.0..=1.0).contains(&s));
                }
            }
        }
    }

    #[test]
    fn test_strategies_agree() {
        let model = model();
        let eager = EagerIndex::build(&model);
        let lazy = LazyIndex::new(model.clone());
        for i in rows(model.len()) {
            assert_eq!(eager.row_scores(i), lazy.row_scores(i));
            assert_eq!(eager.top_k(i, 10), lazy.top_k(i, 10));
        }
    }

    #[test]
    fn test_top_k_excludes_query_and_is_sorted() {
        for index in both() {
            for i in rows(index.len()) {
                let top = index.top_k(i, 10);
                assert_eq!(top.len(), index.len() - 1);
                assert!(top.iter().all(|s| s.row != i));
                assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
            }
        }
    }

    #[test]
    fn test_top_k_prefix_property() {
        for index in both() {
            for i in rows(index.len()) {
                let full = index.top_k(i, 4);
                for k in 0..4 {
                    assert_eq!(index.top_k(i, k), full[..k].to_vec());
                }
            }
        }
    }

    #[test]
    fn test_ties_keep_row_order() {
        for index in both() {
            // "Spaceward" shares nothing with either cooking title, both score 0
            let top = index.top_k(RowIndex(0), 4);
            let zeros: Vec<RowIndex> = top
                .iter()
                .filter(|s| s.score == 0.0)
                .map(|s| s.row)
                .collect();
            assert_eq!(zeros, vec![RowIndex(2), RowIndex(4)]);
        }
    }

    #[test]
    fn test_nearest_neighbour() {
        for index in both() {
            let top = index.top_k(RowIndex(0), 1);
            assert_eq!(top[0].row, RowIndex(1));
            let top = index.top_k(RowIndex(2), 1);
            assert_eq!(top[0].row, RowIndex(4));
        }
    }

    #[test]
    fn test_keywords_and_genres_change_neighbour() {
        use crate::services::vectorizer::FeatureWeights;

        let catalog = Catalog::new(vec![
            MovieRecord::new(1, "Alpha")
                .with_overview("heist")
                .with_keywords("vault")
                .with_genres("crime"),
            MovieRecord::new(2, "Beta")
                .with_overview("heist")
                .with_keywords("wedding")
                .with_genres("romance"),
            MovieRecord::new(3, "Gamma")
                .with_overview("caper")
                .with_keywords("vault")
                .with_genres("crime"),
        ])
        .unwrap();

        let nearest = |weights: FeatureWeights| {
            let params = VectorizerParams {
                weights,
                ..Default::default()
            };
            let model = Arc::new(VectorSpaceModel::fit(&catalog, &params).unwrap());
            build_index(model, SimilarityStrategy::Eager).top_k(RowIndex(0), 1)[0].row
        };

        assert_eq!(nearest(FeatureWeights::overview_only()), RowIndex(1));
        assert_eq!(nearest(FeatureWeights::full()), RowIndex(2));
    }

    #[test]
    fn test_scores_are_rounded() {
        let index = build_index(model(), SimilarityStrategy::Lazy);
        for scored in index.top_k(RowIndex(0), 4) {
            assert_eq!(scored.score, round_to(scored.score, 4));
        }
    }
}
