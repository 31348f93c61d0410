use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::error;

use crate::api::health::HealthState;
use crate::error::Result;
use crate::types::SnapshotEvent;

/// Receives score snapshots from the API handlers and appends them to
/// SQLite. Runs as a dedicated background task so persistence never blocks
/// the scoring path.
pub struct SnapshotWriter {
    pool: sqlx::SqlitePool,
    snapshot_rx: mpsc::Receiver<SnapshotEvent>,
    health: Arc<HealthState>,
}

impl SnapshotWriter {
    pub fn new(
        pool: sqlx::SqlitePool,
        snapshot_rx: mpsc::Receiver<SnapshotEvent>,
        health: Arc<HealthState>,
    ) -> Self {
        Self { pool, snapshot_rx, health }
    }

    pub async fn run(mut self) {
        while let Some(event) = self.snapshot_rx.recv().await {
            if let Err(e) = self.write_snapshot(&event).await {
                error!("snapshot write error: {e}");
            }
            self.health.dec_snapshots_pending();
        }
    }

    async fn write_snapshot(&self, s: &SnapshotEvent) -> Result<()> {
        let engine = s.engine.to_string();
        sqlx::query(
            r#"
            INSERT INTO score_snapshots (engine, entity, score, tier, summary, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&engine)
        .bind(&s.entity)
        .bind(s.score)
        .bind(&s.tier)
        .bind(&s.summary)
        .bind(s.created_at_ns)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
