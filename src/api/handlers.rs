use std::ops::RangeInclusive;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::RequestId;
use crate::models::{PopularMovie, PopularityStats, Recommendation, SearchHit};
use crate::services::popularity::{self, DEFAULT_PERCENTILE};

use super::AppState;

const POPULAR_LIMIT: RangeInclusive<usize> = 1..=20;
const PERCENTILE_RANGE: RangeInclusive<f64> = 0.5..=0.99;
const SIMILAR_COUNT: RangeInclusive<usize> = 1..=50;
const SEARCH_LIMIT: RangeInclusive<usize> = 1..=50;

fn default_limit() -> usize {
    10
}

fn default_percentile() -> f64 {
    DEFAULT_PERCENTILE
}

fn check_range<T>(name: &str, value: T, range: &RangeInclusive<T>) -> AppResult<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if range.contains(&value) {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!(
            "{} must be between {} and {}",
            name,
            range.start(),
            range.end()
        )))
    }
}

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_percentile")]
    pub percentile: f64,
}

#[derive(Debug, Serialize)]
pub struct PopularResponse {
    pub success: bool,
    pub count: usize,
    pub movies: Vec<PopularMovie>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: PopularityStats,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub movie_title: String,
    #[serde(default = "default_limit")]
    pub num_recommendations: usize,
}

#[derive(Debug, Serialize)]
pub struct SimilarMoviesResponse {
    pub success: bool,
    pub query: String,
    pub matched_movie: String,
    pub count: usize,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub count: usize,
    pub results: Vec<SearchHit>,
}

// Handlers

/// Service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Movie Recommender API is running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "popular": "/api/popular",
            "similar": "/api/similar/movies",
            "search": "/api/search",
            "stats": "/api/stats"
        }
    }))
}

/// Ready once the content model is built. With a lazily built model the
/// catalog alone is enough, since the first similarity request builds it.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let model_ready = state.engine.is_ready();
    let model = if model_ready { "ready" } else { "pending" };
    let body = |status: &str| {
        Json(json!({
            "status": status,
            "model": model,
            "similarity": state.engine.settings().strategy,
            "movies": state.catalog.len(),
        }))
    };

    if model_ready || state.lazy_model {
        (StatusCode::OK, body("ready"))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, body("initializing"))
    }
}

/// Popular movies by weighted rating
pub async fn popular(
    State(state): State<AppState>,
    Query(params): Query<PopularQuery>,
) -> AppResult<Json<PopularResponse>> {
    check_range("limit", params.limit, &POPULAR_LIMIT)?;
    check_range("percentile", params.percentile, &PERCENTILE_RANGE)?;

    let movies = popularity::top_popular(&state.catalog, params.limit, params.percentile);

    Ok(Json(PopularResponse {
        success: true,
        count: movies.len(),
        movies,
    }))
}

/// Numbers behind the popularity ranking
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        success: true,
        stats: popularity::stats(&state.catalog),
    })
}

/// Content-based recommendations for a title
pub async fn similar_movies(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<SimilarMoviesResponse>> {
    check_range("num_recommendations", request.num_recommendations, &SIMILAR_COUNT)?;

    tracing::info!(
        request_id = %request_id,
        title = %request.movie_title,
        count = request.num_recommendations,
        "Processing similar movies request"
    );

    let result = state
        .engine
        .similar_movies(&request.movie_title, request.num_recommendations)
        .await?;

    Ok(Json(SimilarMoviesResponse {
        success: true,
        query: request.movie_title,
        matched_movie: result.query_movie,
        count: result.recommendations.len(),
        recommendations: result.recommendations,
    }))
}

/// Title search for autocomplete
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<SearchResponse>> {
    if params.query.is_empty() {
        return Err(AppError::InvalidInput("query must not be empty".to_string()));
    }
    check_range("limit", params.limit, &SEARCH_LIMIT)?;

    let results = state.engine.search(&params.query, params.limit);

    Ok(Json(SearchResponse {
        success: true,
        query: params.query,
        count: results.len(),
        results,
    }))
}
