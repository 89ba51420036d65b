use awas::{AppState, config::Config, create_router, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("awas=debug,tower_http=info,axum::rejection=trace");

    let config = Config::from_env()?;
    let state = AppState::from_config(&config)?;
    tracing::info!(
        "routing providers: {}",
        state.engine.provider_names().join(" -> ")
    );
    tracing::info!("store at {}", config.store_dir.display());
    if !state.assistant.is_configured() {
        tracing::warn!("CHAT_API_KEY not set; assistant endpoints will answer 503");
    }

    let app = create_router(state);

    tracing::info!("starting awas on http://{}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
