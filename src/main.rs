use advert_board::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    init_config()?;
    let config = get_config()?;

    let pool = create_pool(config).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    if config.bitly_access_token.is_none() {
        warn!("BITLY_ACCESS_TOKEN not set, short links fall back to canonical URLs");
    }
    info!(
        time_multiplier = config.time_multiplier,
        "Advert lifecycle windows configured"
    );

    let app_state = AppState::new(pool, config)?;

    let app = routes::router()
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
