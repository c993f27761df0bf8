use crate::config::settings::AppConfig;
use crate::infrastructure::db::pool::{connect_to_db, run_migrations};
use crate::infrastructure::media::ffmpeg::FfmpegToolkit;
use crate::infrastructure::storage::s3::StorageService;
use crate::modules::video::repository::PgVideoStore;
use crate::state::AppState;
use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod common;
mod config;
mod docs;
mod infrastructure;
mod middleware;
mod modules;
mod routes;
mod state;
#[cfg(test)]
mod test_support;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tubely=info,tower_http=info")),
        )
        .init();

    info!("Starting server...");

    let config = AppConfig::new()?;

    let pool = connect_to_db(&config.database_url).await?;
    run_migrations(&pool).await?;

    tokio::fs::create_dir_all(&config.staging_dir)
        .await
        .with_context(|| format!("creating staging dir {}", config.staging_dir.display()))?;

    let storage = StorageService::new(
        config.s3_endpoint.as_deref(),
        &config.s3_region,
        &config.s3_bucket,
        &config.s3_access_key,
        &config.s3_secret_key,
    );
    let media = FfmpegToolkit::new(
        config.ffmpeg_path.as_str(),
        config.ffprobe_path.as_str(),
        config.media_tool_timeout(),
    );

    let port = config.server_port;
    let state = AppState::new(
        config,
        Arc::new(PgVideoStore::new(pool)),
        Arc::new(storage),
        Arc::new(media),
    );

    let app = app::create_app(state).await;

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Server running on http://0.0.0.0:{port}");

    axum::serve(listener, app).await?;
    Ok(())
}
