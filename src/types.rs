use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Engagement records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// A single customer touchpoint. Read-only input to scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub occurred_at: DateTime<Utc>,
    pub direction: Direction,
    pub channel: String,
}

// ---------------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Paid,
    Sent,
    Draft,
    Void,
}

impl InvoiceStatus {
    pub fn is_paid(self) -> bool {
        self == InvoiceStatus::Paid
    }
}

/// An order/invoice row. Aggregated by date-window filters, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: String,
    pub customer: String,
    pub amount: f64,
    pub status: InvoiceStatus,
    pub due_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Market lines and players
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    Points,
    Rebounds,
    Assists,
    Threes,
    Steals,
    Blocks,
    Turnovers,
}

impl std::fmt::Display for StatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StatKind::Points => "points",
            StatKind::Rebounds => "rebounds",
            StatKind::Assists => "assists",
            StatKind::Threes => "threes",
            StatKind::Steals => "steals",
            StatKind::Blocks => "blocks",
            StatKind::Turnovers => "turnovers",
        };
        write!(f, "{s}")
    }
}

/// A posted market line for one player and stat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketLine {
    pub player: String,
    pub stat: StatKind,
    pub line: f64,
    /// American odds for the over side.
    pub over_odds: i32,
    /// American odds for the under side.
    pub under_odds: i32,
}

/// A player's rolling stat averages, keyed by stat kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub name: String,
    pub team: Option<String>,
    pub averages: HashMap<StatKind, f64>,
}

/// How a line's player name resolved against the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchQuality {
    /// Normalized full name matched an indexed player.
    Exact,
    /// Exactly one indexed player carried the name's last token.
    LastToken,
    /// Two or more indexed players carried the last token.
    Ambiguous,
    /// No indexed player matched at all.
    Unmatched,
}

impl std::fmt::Display for MatchQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MatchQuality::Exact => "exact",
            MatchQuality::LastToken => "last_token",
            MatchQuality::Ambiguous => "ambiguous",
            MatchQuality::Unmatched => "unmatched",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Over,
    Under,
    Pass,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Recommendation::Over => "OVER",
            Recommendation::Under => "UNDER",
            Recommendation::Pass => "PASS",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Health tiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthTier {
    Fragile,
    Neutral,
    Strong,
    Elite,
}

impl HealthTier {
    pub fn from_score(score: f64) -> Self {
        use crate::config::health_tiers::*;
        if score < NEUTRAL_MIN {
            HealthTier::Fragile
        } else if score < STRONG_MIN {
            HealthTier::Neutral
        } else if score < ELITE_MIN {
            HealthTier::Strong
        } else {
            HealthTier::Elite
        }
    }
}

impl std::fmt::Display for HealthTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HealthTier::Fragile => "fragile",
            HealthTier::Neutral => "neutral",
            HealthTier::Strong => "strong",
            HealthTier::Elite => "elite",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Worker period stats
// ---------------------------------------------------------------------------

/// Funnel and outcome counts for one worker over one evaluation period.
/// Missing fields deserialize as zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerPeriodStats {
    pub calls: u32,
    pub contacts: u32,
    pub conversations: u32,
    pub appointments: u32,
    pub contracts: u32,
    pub tasks_assigned: u32,
    pub tasks_completed: u32,
    pub lesson_scores: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Engines and snapshot events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Health,
    Risk,
    Edge,
    Tier,
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Engine::Health => "health",
            Engine::Risk => "risk",
            Engine::Edge => "edge",
            Engine::Tier => "tier",
        };
        write!(f, "{s}")
    }
}

/// Routed from API handlers to the snapshot writer.
#[derive(Debug, Clone)]
pub struct SnapshotEvent {
    pub engine: Engine,
    pub entity: String,
    pub score: f64,
    pub tier: Option<String>,
    pub summary: Option<String>,
    /// Nanosecond UTC epoch timestamp.
    pub created_at_ns: i64,
}

/// Nanosecond UTC epoch timestamp.
pub fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as i64
}
