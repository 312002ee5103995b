use reelmark::{
    api::{create_router, AppState},
    config::Config,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("reelmark=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    if config.tmdb_api_key.is_none() {
        tracing::warn!("TMDB_API_KEY is not set; the catalog will report a configuration error");
    }

    // Initialize application state
    let state = AppState::from_config(&config);

    // Initial page load runs in the background so the server is up immediately
    let store = state.store.clone();
    tokio::spawn(async move {
        store.mount().await;
    });

    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(address = %address, "Server running");
    axum::serve(listener, app).await?;

    Ok(())
}
