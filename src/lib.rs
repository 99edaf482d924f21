//! Movie recommendations over a static in-memory catalog.
//!
//! Three query modes are served:
//!
//! - **popularity**: Bayesian-average weighted rating over the whole catalog
//! - **content similarity**: TF-IDF vectors over overview, keywords, genres and
//!   title, compared by cosine similarity
//! - **title search**: case-insensitive substring match for autocomplete
//!
//! The catalog is loaded once; the content model is fitted once behind a
//! one-time gate and is read-only afterwards.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;

pub use catalog::Catalog;
pub use error::{AppError, AppResult};
pub use models::{MovieRecord, RowIndex};
pub use services::{EngineSettings, RecommendationEngine};
