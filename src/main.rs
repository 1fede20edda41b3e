use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cropcare::{router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    if config.uses_placeholder_secret() {
        tracing::warn!("SECRET_KEY is not set, flash cookies are signed with a placeholder secret");
    }

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("creating upload dir {}", config.upload_dir.display()))?;

    let app = router(AppState::new(&config), config.body_limit_bytes);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(
        %addr,
        upload_dir = %config.upload_dir.display(),
        body_limit_bytes = config.body_limit_bytes,
        "listening"
    );
    axum::Server::try_bind(&addr)
        .with_context(|| format!("binding {addr}"))?
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
