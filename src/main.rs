use std::time::Duration;

use anyhow::Context;
use tower_http::timeout::TimeoutLayer;
use tracing_subscriber::EnvFilter;

use movie_recommender::{
    api::{create_router, AppState},
    catalog::{Catalog, CatalogSource, CsvFileSource, HttpCsvSource},
    config::Config,
    services::EngineSettings,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("movie_recommender=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let source: Box<dyn CatalogSource> = match &config.catalog_url {
        Some(url) => Box::new(HttpCsvSource::new(url.clone())),
        None => Box::new(CsvFileSource::new(config.catalog_path.clone())),
    };
    let catalog = Catalog::load(source.as_ref())
        .await
        .context("Failed to load movie catalog")?;

    let settings = EngineSettings {
        vectorizer: config.vectorizer_params(),
        strategy: config.similarity_strategy,
    };
    let state = AppState::new(catalog, settings).with_lazy_model(!config.eager_init);

    if config.eager_init {
        state
            .engine
            .initialize()
            .await
            .context("Failed to initialize content model")?;
    } else {
        tracing::info!("Content model will be built on the first similarity request");
    }

    let app = create_router(state).layer(TimeoutLayer::new(Duration::from_secs(
        config.request_timeout_secs,
    )));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!(address = %address, "Movie recommender API ready");

    axum::serve(listener, app).await?;

    Ok(())
}
