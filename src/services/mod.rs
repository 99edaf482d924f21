pub mod popularity;
pub mod recommendations;
pub mod resolver;
pub mod similarity;
pub mod stopwords;
pub mod title_search;
pub mod vectorizer;

pub use recommendations::{ContentModel, EngineSettings, RecommendationEngine};
