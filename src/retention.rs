use std::time::Duration;

use tracing::{error, info};

use crate::config::PRUNE_INTERVAL_SECS;
use crate::error::Result;
use crate::types::now_ns;

const DAY_NS: i64 = 24 * 3_600 * 1_000_000_000;

/// Background task that deletes score snapshots older than the configured
/// retention window.
pub struct RetentionPruner {
    pool: sqlx::SqlitePool,
    retention_days: i64,
}

impl RetentionPruner {
    pub fn new(pool: sqlx::SqlitePool, retention_days: i64) -> Self {
        Self { pool, retention_days }
    }

    pub async fn run(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(PRUNE_INTERVAL_SECS));
        interval.tick().await; // consume immediate first tick

        loop {
            interval.tick().await;
            if let Err(e) = self.prune().await {
                error!("retention prune error: {e}");
            }
        }
    }

    async fn prune(&self) -> Result<()> {
        let cutoff = now_ns() - self.retention_days.saturating_mul(DAY_NS);

        let result = sqlx::query("DELETE FROM score_snapshots WHERE created_at < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            info!(
                pruned = result.rows_affected(),
                retention_days = self.retention_days,
                "pruned expired score snapshots",
            );
        }
        Ok(())
    }
}
