use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use ragserve::config::Settings;
use ragserve::logging;
use ragserve::server::router::router;
use ragserve::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env();
    logging::init(&settings.log_dir);

    let bind_addr = format!("{}:{}", settings.app_host, settings.app_port);
    let state = AppState::initialize(settings).await?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    let app: Router = router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
