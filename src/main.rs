use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drawphone_rs::config::ServerConfig;
use drawphone_rs::presence::spawn_presence_logger;
use drawphone_rs::{router, AppState, DrawphoneError};

#[tokio::main]
async fn main() -> Result<(), DrawphoneError> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drawphone_rs=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    config.validate()?;
    let addr = config.bind_address();

    info!(
        "Game settings: {}-{} players, {} rounds, {}s drawing time",
        config.game.min_players,
        config.game.max_players,
        config.game.total_rounds,
        config.game.drawing_time_seconds
    );

    let state = Arc::new(AppState::new(config));
    spawn_presence_logger(Arc::clone(&state));

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Drawphone server running on http://{}", addr);
    info!("   WebSocket endpoint: ws://{}/ws", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
