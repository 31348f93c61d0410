mod api;
mod config;
mod db;
mod error;
mod oracle;
mod retention;
mod scoring;
mod state;
mod types;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::config::{Config, ACTIVITY_LOG_CAPACITY, CHANNEL_CAPACITY};
use crate::db::models::PlayerRow;
use crate::db::writer::SnapshotWriter;
use crate::error::Result;
use crate::oracle::{HttpOracle, NullOracle, TextOracle};
use crate::retention::RetentionPruner;
use crate::state::{ActivityLog, PlayerIndex};
use crate::types::PlayerProfile;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let pool = sqlx::SqlitePool::connect(&format!("sqlite:{}?mode=rwc", cfg.db_path)).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database ready at {}", cfg.db_path);

    // --- In-memory state ---
    let players = PlayerIndex::new();
    let hydrated = hydrate_players(&pool, &players).await?;
    info!("Hydrated {hydrated} player profiles into the index");

    let activity = ActivityLog::new(ACTIVITY_LOG_CAPACITY);
    let health = Arc::new(HealthState::new());
    let latency = Arc::new(LatencyStats::new());

    // --- Oracle ---
    let oracle: Arc<dyn TextOracle> = if cfg.oracle_url.is_empty() {
        warn!("ORACLE_URL not set — risk forecasts will always degrade to defaults");
        Arc::new(NullOracle)
    } else {
        health.set_oracle_configured(true);
        info!("Oracle endpoint configured: {}", cfg.oracle_url);
        Arc::new(HttpOracle::new(
            cfg.oracle_url.clone(),
            cfg.oracle_api_key.clone(),
            cfg.oracle_model.clone(),
            cfg.oracle_timeout_secs,
        )?)
    };

    // --- Channels ---
    let (snapshot_tx, snapshot_rx) = mpsc::channel(CHANNEL_CAPACITY);

    // --- Spawn tasks ---

    // Snapshot writer (background, drains the channel)
    let writer = SnapshotWriter::new(pool.clone(), snapshot_rx, Arc::clone(&health));
    tokio::spawn(async move { writer.run().await });

    // Snapshot retention pruner (background, hourly)
    let pruner = RetentionPruner::new(pool.clone(), cfg.snapshot_retention_days);
    tokio::spawn(async move { pruner.run().await });

    // --- HTTP API server ---
    let api_state = ApiState {
        pool,
        oracle,
        players,
        activity,
        health,
        latency,
        snapshot_tx,
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Load persisted player profiles into the in-memory index. Rows whose
/// averages no longer parse are skipped with a warning.
async fn hydrate_players(pool: &sqlx::SqlitePool, index: &PlayerIndex) -> Result<usize> {
    let rows = sqlx::query_as::<_, PlayerRow>(
        "SELECT name, team, averages, updated_at FROM players",
    )
    .fetch_all(pool)
    .await?;

    let mut hydrated = 0usize;
    for row in rows {
        match serde_json::from_str(&row.averages) {
            Ok(averages) => {
                index.upsert(PlayerProfile {
                    name: row.name,
                    team: row.team,
                    averages,
                });
                hydrated += 1;
            }
            Err(e) => warn!(player = %row.name, "skipping player with unparseable averages: {e}"),
        }
    }
    Ok(hydrated)
}
