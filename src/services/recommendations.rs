use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OnceCell;
use tracing::instrument;

use crate::{
    catalog::Catalog,
    error::{AppError, AppResult},
    models::{Recommendation, RowIndex, SearchHit, SimilarMoviesResult},
    services::{
        resolver,
        similarity::{build_index, ScoredRow, SimilarityIndex, SimilarityStrategy},
        title_search,
        vectorizer::{ModelError, VectorSpaceModel, VectorizerParams},
    },
};

/// How the content model is built
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSettings {
    pub vectorizer: VectorizerParams,
    pub strategy: SimilarityStrategy,
}

/// Fitted vector space plus the similarity index over it. Immutable once built.
pub struct ContentModel {
    space: Arc<VectorSpaceModel>,
    index: Box<dyn SimilarityIndex>,
}

impl ContentModel {
    pub fn build(catalog: &Catalog, settings: &EngineSettings) -> Result<Self, ModelError> {
        let space = Arc::new(VectorSpaceModel::fit(catalog, &settings.vectorizer)?);

        if space.len() != catalog.len() {
            return Err(ModelError::RowCountMismatch {
                model: space.len(),
                catalog: catalog.len(),
            });
        }

        let index = build_index(space.clone(), settings.strategy);
        Ok(Self { space, index })
    }

    pub fn space(&self) -> &VectorSpaceModel {
        &self.space
    }

    pub fn strategy(&self) -> SimilarityStrategy {
        self.index.strategy()
    }

    pub fn similarity(&self, i: RowIndex, j: RowIndex) -> f64 {
        self.index.similarity(i, j)
    }

    pub fn top_k(&self, i: RowIndex, k: usize) -> Vec<ScoredRow> {
        self.index.top_k(i, k)
    }
}

/// Single-assignment cell for the content model plus what it is built from
struct ModelGate {
    catalog: Arc<Catalog>,
    settings: EngineSettings,
    cell: OnceCell<Arc<ContentModel>>,
    builds: AtomicUsize,
}

impl ModelGate {
    /// Holds the cell's init permit until the build settles. Must run on a
    /// detached task so a cancelled caller cannot release the permit early.
    async fn get_or_build(&self) -> AppResult<Arc<ContentModel>> {
        let model = self
            .cell
            .get_or_try_init(|| async {
                self.builds.fetch_add(1, Ordering::SeqCst);
                let start = Instant::now();
                tracing::info!(
                    movies = self.catalog.len(),
                    strategy = ?self.settings.strategy,
                    "Initializing content model"
                );

                let catalog = self.catalog.clone();
                let settings = self.settings.clone();
                let built = tokio::task::spawn_blocking(move || ContentModel::build(&catalog, &settings))
                    .await
                    .map_err(|e| ModelError::Aborted(e.to_string()))?;

                let model = built.map_err(|e| {
                    tracing::error!(error = %e, "Content model initialization failed");
                    AppError::from(e)
                })?;

                tracing::info!(
                    vocabulary = model.space().vocabulary().len(),
                    strategy = ?model.strategy(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Content model ready"
                );

                Ok::<_, AppError>(Arc::new(model))
            })
            .await?;

        Ok(model.clone())
    }
}

/// Content-based recommendations over a fixed catalog.
///
/// The model is built at most once. Concurrent first callers wait on the same
/// build, and the build keeps running if the caller that started it goes away.
/// A failed build publishes nothing and the next caller retries.
pub struct RecommendationEngine {
    catalog: Arc<Catalog>,
    gate: Arc<ModelGate>,
}

impl RecommendationEngine {
    pub fn new(catalog: Arc<Catalog>, settings: EngineSettings) -> Self {
        let gate = Arc::new(ModelGate {
            catalog: catalog.clone(),
            settings,
            cell: OnceCell::new(),
            builds: AtomicUsize::new(0),
        });
        Self { catalog, gate }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.gate.settings
    }

    pub fn is_ready(&self) -> bool {
        self.gate.cell.initialized()
    }

    /// Number of model builds started so far
    pub fn build_count(&self) -> usize {
        self.gate.builds.load(Ordering::SeqCst)
    }

    /// Builds the model if needed and returns it. Idempotent.
    pub async fn initialize(&self) -> AppResult<Arc<ContentModel>> {
        if let Some(model) = self.gate.cell.get() {
            return Ok(model.clone());
        }

        let gate = self.gate.clone();
        tokio::spawn(async move { gate.get_or_build().await })
            .await
            .map_err(|e| AppError::from(ModelError::Aborted(e.to_string())))?
    }

    /// The ready model, without triggering a build
    pub fn model(&self) -> AppResult<Arc<ContentModel>> {
        self.gate.cell.get().cloned().ok_or(AppError::NotInitialized)
    }

    /// Movies most similar in content to the one `title` resolves to
    #[instrument(skip(self))]
    pub async fn similar_movies(&self, title: &str, count: usize) -> AppResult<SimilarMoviesResult> {
        let model = self.initialize().await?;
        let row = resolver::resolve(&self.catalog, title)?;
        let query_movie = self.catalog.get(row).title_text().to_string();

        let recommendations: Vec<Recommendation> = model
            .top_k(row, count)
            .into_iter()
            .map(|scored| Recommendation::from_record(self.catalog.get(scored.row), scored.score))
            .collect();

        tracing::info!(
            matched = %query_movie,
            returned = recommendations.len(),
            "Computed similar movies"
        );

        Ok(SimilarMoviesResult {
            query_movie,
            recommendations,
        })
    }

    /// Title search for autocomplete
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        title_search::search_titles(&self.catalog, query, limit)
    }
}
