//! Database row types matching the schema in migrations/0001_init.sql.
//! Used by sqlx for typed queries.

use serde::Serialize;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SnapshotRow {
    pub id: i64,
    pub engine: String,
    pub entity: String,
    pub score: f64,
    pub tier: Option<String>,
    pub summary: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct WorkerRow {
    pub id: String,
    pub display_name: Option<String>,
    pub tier: i64,
    pub composite_score: Option<f64>,
    pub updated_at: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct WorkerHistoryRow {
    pub id: i64,
    pub worker_id: String,
    pub score: f64,
    pub tier: i64,
    pub created_at: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub struct PlayerRow {
    pub name: String,
    pub team: Option<String>,
    /// JSON map of stat -> rolling average.
    pub averages: String,
    pub updated_at: i64,
}
