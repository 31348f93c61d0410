use crate::error::{AppError, Result};

/// Channel capacity for snapshot routing to the DB writer.
pub const CHANNEL_CAPACITY: usize = 1024;

/// Activity ring buffer capacity. Oldest events are evicted past this.
pub const ACTIVITY_LOG_CAPACITY: usize = 500;

/// Snapshot retention pruner interval (seconds).
pub const PRUNE_INTERVAL_SECS: u64 = 3600;

/// Default lookback window for single-entity health scoring (days).
pub const DEFAULT_HEALTH_WINDOW_DAYS: i64 = 90;

/// An unpaid balance with no invoice activity for this many days marks a
/// customer at risk.
pub const AT_RISK_STALE_DAYS: i64 = 30;

/// Default top-N cutoff for the high-value customer bucket.
pub const DEFAULT_TOP_CUSTOMERS: usize = 5;

/// Relationship health components. Each component contributes at most
/// COMPONENT_CAP points; the sum is clamped to [0,100].
pub mod health_weights {
    pub const COMPONENT_CAP: f64 = 25.0;
    pub const INTERACTION_POINTS: f64 = 3.0;
    pub const ORDER_POINTS: f64 = 5.0;
    pub const REVENUE_DIVISOR: f64 = 200.0;
    pub const BASE: f64 = 25.0;
    pub const RED_FLAG_PENALTY: f64 = 5.0;
    pub const RED_FLAG_PENALTY_CAP: f64 = 15.0;
    pub const OPPORTUNITY_BONUS: f64 = 3.0;
    pub const OPPORTUNITY_BONUS_CAP: f64 = 15.0;
}

/// Health tier breakpoints: <40 fragile, 40-59 neutral, 60-79 strong,
/// >=80 elite.
pub mod health_tiers {
    pub const NEUTRAL_MIN: f64 = 40.0;
    pub const STRONG_MIN: f64 = 60.0;
    pub const ELITE_MIN: f64 = 80.0;
}

/// Edge model parameters. Model probability is
/// `sigmoid(STEEPNESS * (projection - line) / (LINE_SPREAD_FACTOR * line))`.
pub mod edge_model {
    pub const STEEPNESS: f64 = 1.7;
    pub const LINE_SPREAD_FACTOR: f64 = 0.15;
    /// Edge (percentage points) beyond which a side is recommended.
    pub const EDGE_THRESHOLD_PCT: f64 = 5.0;
}

/// Tier evaluator weights (sum to 1.0) and ratchet thresholds.
pub mod tier_model {
    pub const W_CONTACT: f64 = 0.20;
    pub const W_CONVERSATION: f64 = 0.20;
    pub const W_APPOINTMENT: f64 = 0.15;
    pub const W_CONTRACT: f64 = 0.15;
    pub const W_TASK: f64 = 0.15;
    pub const W_LESSON: f64 = 0.15;

    pub const MIN_TIER: u8 = 1;
    pub const MAX_TIER: u8 = 5;

    pub const PROMOTE_TO_5: f64 = 90.0;
    pub const PROMOTE_TO_4: f64 = 75.0;
    pub const PROMOTE_TO_3: f64 = 60.0;
    pub const PROMOTE_TO_2: f64 = 50.0;
    pub const DEMOTE_BELOW: f64 = 40.0;
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Generative-text oracle endpoint (ORACLE_URL). Empty disables the
    /// oracle; risk requests then always return the fallback forecast.
    pub oracle_url: String,
    /// Bearer token for the oracle (ORACLE_API_KEY).
    pub oracle_api_key: Option<String>,
    /// Model identifier forwarded with each prompt (ORACLE_MODEL).
    pub oracle_model: String,
    /// Oracle request timeout in seconds (ORACLE_TIMEOUT_SECS).
    pub oracle_timeout_secs: u64,
    /// Days of score snapshots to keep (SNAPSHOT_RETENTION_DAYS).
    pub snapshot_retention_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "scores.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            oracle_url: std::env::var("ORACLE_URL").unwrap_or_default(),
            oracle_api_key: std::env::var("ORACLE_API_KEY").ok(),
            oracle_model: std::env::var("ORACLE_MODEL")
                .unwrap_or_else(|_| "text-default".to_string()),
            oracle_timeout_secs: std::env::var("ORACLE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "15".to_string())
                .parse::<u64>()
                .unwrap_or(15),
            snapshot_retention_days: std::env::var("SNAPSHOT_RETENTION_DAYS")
                .unwrap_or_else(|_| "90".to_string())
                .parse::<i64>()
                .unwrap_or(90),
        })
    }
}
