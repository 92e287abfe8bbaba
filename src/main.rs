use mapview::config::Config;
use mapview::routes;
use mapview::state::AppState;

#[tokio::main]
async fn main() {
    // A missing .env is fine; the process environment still applies.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let config = Config::from_env().expect("invalid configuration");
    let port = config.port;
    if config.api_key.is_empty() {
        tracing::warn!("MAPS_API_KEY not set, widgets will load without a key");
    }

    let state = AppState::new(config);
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "mapview listening");
    axum::serve(listener, app).await.expect("server failed");
}
