use std::sync::Arc;

use crate::catalog::Catalog;
use crate::services::{EngineSettings, RecommendationEngine};

/// Shared application state. Everything behind it is read-only once built.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub engine: Arc<RecommendationEngine>,
    /// Model is built on the first similarity request instead of at startup
    pub lazy_model: bool,
}

impl AppState {
    pub fn new(catalog: Catalog, settings: EngineSettings) -> Self {
        let catalog = Arc::new(catalog);
        let engine = Arc::new(RecommendationEngine::new(catalog.clone(), settings));
        Self {
            catalog,
            engine,
            lazy_model: false,
        }
    }

    pub fn with_lazy_model(mut self, lazy_model: bool) -> Self {
        self.lazy_model = lazy_model;
        self
    }
}
