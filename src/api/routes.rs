use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::config::{DEFAULT_HEALTH_WINDOW_DAYS, DEFAULT_TOP_CUSTOMERS};
use crate::db::models::{SnapshotRow, WorkerHistoryRow, WorkerRow};
use crate::error::AppError;
use crate::oracle::{fetch_forecast, SalesForecast, TextOracle};
use crate::scoring::edge::{simulate, SimulatedEdge};
use crate::scoring::health::{
    score_batch, score_engagement, EngagementWindow, EntityAggregates, HealthComponents,
};
use crate::scoring::risk::{aggregate_risk, forecast_prompt, AtRiskCustomer, CustomerRevenue};
use crate::scoring::tier::{composite_score, funnel_rates, next_tier, FunnelRates};
use crate::state::player_index::normalize;
use crate::state::{ActivityEvent, ActivityLog, NameMatch, PlayerIndex};
use crate::types::{
    now_ns, Engine, HealthTier, InteractionRecord, InvoiceRecord, MarketLine, PlayerProfile,
    SnapshotEvent, WorkerPeriodStats,
};

#[derive(Clone)]
pub struct ApiState {
    pub pool: sqlx::SqlitePool,
    pub oracle: Arc<dyn TextOracle>,
    pub players: Arc<PlayerIndex>,
    pub activity: Arc<ActivityLog>,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
    pub snapshot_tx: mpsc::Sender<SnapshotEvent>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/score/health", post(post_score_health))
        .route("/score/health/batch", post(post_score_health_batch))
        .route("/score/risk", post(post_score_risk))
        .route("/simulate/edges", post(post_simulate_edges))
        .route("/evaluate/tier", post(post_evaluate_tier))
        .route("/players", post(post_players))
        .route("/snapshots/recent", get(get_recent_snapshots))
        .route("/workers/:id/history", get(get_worker_history))
        .route("/activity", get(get_activity))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .with_state(state)
}

/// Enqueue a snapshot for the background writer. A full channel drops the
/// snapshot with a warning; scoring output never blocks on persistence.
fn enqueue_snapshot(state: &ApiState, event: SnapshotEvent) {
    match state.snapshot_tx.try_send(event) {
        Ok(()) => state.health.inc_snapshots_pending(),
        Err(e) => warn!("snapshot channel full, dropping snapshot: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Relationship health
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct HealthScoreRequest {
    pub entity_id: String,
    /// Anchor for the lookback window; defaults to now.
    pub as_of: Option<DateTime<Utc>>,
    pub window_days: Option<i64>,
    #[serde(default)]
    pub interactions: Vec<InteractionRecord>,
    #[serde(default)]
    pub orders: Vec<InvoiceRecord>,
    #[serde(default)]
    pub red_flags: u32,
    #[serde(default)]
    pub opportunities: u32,
}

#[derive(Serialize)]
pub struct HealthScoreResponse {
    pub entity_id: String,
    pub score: u8,
    pub tier: HealthTier,
    pub summary: String,
    pub components: HealthComponents,
    pub window: EngagementWindow,
}

async fn post_score_health(
    State(state): State<ApiState>,
    Json(req): Json<HealthScoreRequest>,
) -> Result<Json<HealthScoreResponse>, AppError> {
    let started = Instant::now();
    let as_of = req.as_of.unwrap_or_else(Utc::now);
    let window_days = req.window_days.unwrap_or(DEFAULT_HEALTH_WINDOW_DAYS);
    if !(1..=36_500).contains(&window_days) {
        return Err(AppError::BadRequest(
            "window_days must be between 1 and 36500".to_string(),
        ));
    }
    let since = as_of - Duration::days(window_days);

    let interactions = req
        .interactions
        .iter()
        .filter(|i| i.occurred_at > since && i.occurred_at <= as_of)
        .count() as u32;
    let in_window: Vec<&InvoiceRecord> = req
        .orders
        .iter()
        .filter(|o| o.created_at > since && o.created_at <= as_of)
        .collect();
    let window = EngagementWindow {
        interactions,
        orders: in_window.len() as u32,
        revenue: in_window.iter().map(|o| o.amount).sum(),
        red_flags: req.red_flags,
        opportunities: req.opportunities,
    };

    let scored = score_engagement(&window);
    let created_at_ns = now_ns();

    state.activity.record(Engine::Health, &req.entity_id, scored.summary.clone());
    enqueue_snapshot(
        &state,
        SnapshotEvent {
            engine: Engine::Health,
            entity: req.entity_id.clone(),
            score: f64::from(scored.score),
            tier: Some(scored.tier.to_string()),
            summary: Some(scored.summary.clone()),
            created_at_ns,
        },
    );
    state.health.set_last_score_at_ns(created_at_ns);
    state.latency.record(started.elapsed());

    Ok(Json(HealthScoreResponse {
        entity_id: req.entity_id,
        score: scored.score,
        tier: scored.tier,
        summary: scored.summary,
        components: scored.components,
        window,
    }))
}

#[derive(Deserialize)]
pub struct HealthBatchRequest {
    pub entities: Vec<EntityAggregates>,
}

#[derive(Serialize)]
pub struct HealthBatchEntry {
    pub entity_id: String,
    pub score: u8,
    pub tier: HealthTier,
    pub summary: String,
}

#[derive(Serialize)]
pub struct HealthBatchResponse {
    pub scored: usize,
    pub results: Vec<HealthBatchEntry>,
}

async fn post_score_health_batch(
    State(state): State<ApiState>,
    Json(req): Json<HealthBatchRequest>,
) -> Result<Json<HealthBatchResponse>, AppError> {
    let started = Instant::now();
    let created_at_ns = now_ns();

    let results: Vec<HealthBatchEntry> = score_batch(&req.entities)
        .into_iter()
        .map(|(entity_id, scored)| {
            enqueue_snapshot(
                &state,
                SnapshotEvent {
                    engine: Engine::Health,
                    entity: entity_id.clone(),
                    score: f64::from(scored.score),
                    tier: Some(scored.tier.to_string()),
                    summary: Some(scored.summary.clone()),
                    created_at_ns,
                },
            );
            HealthBatchEntry {
                entity_id,
                score: scored.score,
                tier: scored.tier,
                summary: scored.summary,
            }
        })
        .collect();

    state.activity.record(
        Engine::Health,
        "batch",
        format!("scored {} entities", results.len()),
    );
    state.health.set_last_score_at_ns(created_at_ns);
    state.latency.record(started.elapsed());

    Ok(Json(HealthBatchResponse { scored: results.len(), results }))
}

// ---------------------------------------------------------------------------
// Financial risk
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct RiskRequest {
    /// Anchor for date comparisons; defaults to today (UTC).
    pub as_of: Option<NaiveDate>,
    pub top_n: Option<usize>,
    pub invoices: Vec<InvoiceRecord>,
}

#[derive(Serialize)]
pub struct RiskReport {
    pub as_of: NaiveDate,
    pub overdue: Vec<InvoiceRecord>,
    pub high_value: Vec<CustomerRevenue>,
    pub at_risk: Vec<AtRiskCustomer>,
    pub forecast: SalesForecast,
    /// True when the oracle failed or replied unparseably and the forecast
    /// fields are the defaults.
    pub forecast_degraded: bool,
}

async fn post_score_risk(
    State(state): State<ApiState>,
    Json(req): Json<RiskRequest>,
) -> Result<Json<RiskReport>, AppError> {
    let started = Instant::now();
    let as_of = req.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let top_n = req.top_n.unwrap_or(DEFAULT_TOP_CUSTOMERS);

    let buckets = aggregate_risk(&req.invoices, as_of, top_n);

    let prompt = forecast_prompt(&buckets, req.invoices.len());
    let forecast = fetch_forecast(state.oracle.as_ref(), &prompt).await;
    let forecast_degraded = forecast.is_none();
    if forecast_degraded {
        state.health.inc_oracle_failures();
    }

    let created_at_ns = now_ns();
    state.activity.record(
        Engine::Risk,
        "tenant",
        format!(
            "{} overdue, {} high-value, {} at-risk{}",
            buckets.overdue.len(),
            buckets.high_value.len(),
            buckets.at_risk.len(),
            if forecast_degraded { "; forecast degraded" } else { "" },
        ),
    );
    state.health.set_last_score_at_ns(created_at_ns);
    state.latency.record(started.elapsed());

    Ok(Json(RiskReport {
        as_of,
        overdue: buckets.overdue,
        high_value: buckets.high_value,
        at_risk: buckets.at_risk,
        forecast: forecast.unwrap_or_default(),
        forecast_degraded,
    }))
}

// ---------------------------------------------------------------------------
// Edge simulation
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct EdgeRequest {
    pub lines: Vec<MarketLine>,
}

#[derive(Serialize)]
pub struct EdgeSimulationResponse {
    pub scored: usize,
    pub unscored: usize,
    pub results: Vec<SimulatedEdge>,
}

async fn post_simulate_edges(
    State(state): State<ApiState>,
    Json(req): Json<EdgeRequest>,
) -> Result<Json<EdgeSimulationResponse>, AppError> {
    let started = Instant::now();
    let created_at_ns = now_ns();

    let mut results = Vec::with_capacity(req.lines.len());
    for line in &req.lines {
        let resolution = state.players.resolve(&line.player);
        if let NameMatch::Ambiguous(count) = &resolution {
            warn!(
                player = %line.player,
                candidates = count,
                "ambiguous player name, line not scored",
            );
        }
        let result = simulate(line, resolution);
        if result.valid {
            let entity = result.matched_player.clone().unwrap_or_else(|| line.player.clone());
            let summary = format!(
                "{} {} {} edge {:+.2}",
                result.stat,
                result.line,
                result.recommendation.map(|r| r.to_string()).unwrap_or_default(),
                result.edge_pct.unwrap_or_default(),
            );
            state.activity.record(Engine::Edge, &entity, summary.clone());
            enqueue_snapshot(
                &state,
                SnapshotEvent {
                    engine: Engine::Edge,
                    entity,
                    score: result.edge_pct.unwrap_or_default(),
                    tier: result.recommendation.map(|r| r.to_string()),
                    summary: Some(summary),
                    created_at_ns,
                },
            );
        } else {
            state.activity.record(
                Engine::Edge,
                &line.player,
                format!("{} line not scored ({})", line.stat, result.match_quality),
            );
        }
        results.push(result);
    }

    let scored = results.iter().filter(|r| r.valid).count();
    let unscored = results.len() - scored;

    state.health.set_last_score_at_ns(created_at_ns);
    state.latency.record(started.elapsed());

    Ok(Json(EdgeSimulationResponse { scored, unscored, results }))
}

// ---------------------------------------------------------------------------
// Player registration
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct PlayersRequest {
    pub players: Vec<PlayerProfile>,
}

#[derive(Serialize)]
pub struct PlayersResponse {
    pub loaded: usize,
}

async fn post_players(
    State(state): State<ApiState>,
    Json(req): Json<PlayersRequest>,
) -> Result<Json<PlayersResponse>, AppError> {
    let mut loaded = 0usize;
    let updated_at = now_ns();

    for profile in req.players {
        let key = normalize(&profile.name);
        if key.is_empty() {
            warn!("skipping player profile with empty name");
            continue;
        }
        let averages = serde_json::to_string(&profile.averages)?;
        sqlx::query(
            r#"
            INSERT INTO players (name, team, averages, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                team = excluded.team,
                averages = excluded.averages,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&key)
        .bind(&profile.team)
        .bind(&averages)
        .bind(updated_at)
        .execute(&state.pool)
        .await?;

        state.players.upsert(profile);
        loaded += 1;
    }

    Ok(Json(PlayersResponse { loaded }))
}

// ---------------------------------------------------------------------------
// Tier evaluation
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct TierRequest {
    pub worker_id: String,
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub stats: WorkerPeriodStats,
}

#[derive(Serialize)]
pub struct TierEvaluationResponse {
    pub worker_id: String,
    pub composite_score: f64,
    pub rates: FunnelRates,
    pub previous_tier: u8,
    pub new_tier: u8,
}

async fn post_evaluate_tier(
    State(state): State<ApiState>,
    Json(req): Json<TierRequest>,
) -> Result<Json<TierEvaluationResponse>, AppError> {
    let started = Instant::now();

    let existing = sqlx::query_as::<_, WorkerRow>(
        "SELECT id, display_name, tier, composite_score, updated_at FROM workers WHERE id = ?",
    )
    .bind(&req.worker_id)
    .fetch_optional(&state.pool)
    .await?;
    let previous_tier = existing.as_ref().map(|w| w.tier as u8).unwrap_or(1);

    let rates = funnel_rates(&req.stats);
    let composite = composite_score(&rates);
    let new_tier = next_tier(previous_tier, composite);
    let created_at_ns = now_ns();

    sqlx::query(
        r#"
        INSERT INTO workers (id, display_name, tier, composite_score, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            display_name = COALESCE(excluded.display_name, workers.display_name),
            tier = excluded.tier,
            composite_score = excluded.composite_score,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&req.worker_id)
    .bind(&req.display_name)
    .bind(i64::from(new_tier))
    .bind(composite)
    .bind(created_at_ns)
    .execute(&state.pool)
    .await?;

    sqlx::query(
        "INSERT INTO worker_score_history (worker_id, score, tier, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&req.worker_id)
    .bind(composite)
    .bind(i64::from(new_tier))
    .bind(created_at_ns)
    .execute(&state.pool)
    .await?;

    let summary = format!(
        "composite {composite:.1}, tier {previous_tier} -> {new_tier}",
    );
    state.activity.record(Engine::Tier, &req.worker_id, summary.clone());
    enqueue_snapshot(
        &state,
        SnapshotEvent {
            engine: Engine::Tier,
            entity: req.worker_id.clone(),
            score: composite,
            tier: Some(new_tier.to_string()),
            summary: Some(summary),
            created_at_ns,
        },
    );
    state.health.set_last_score_at_ns(created_at_ns);
    state.latency.record(started.elapsed());

    Ok(Json(TierEvaluationResponse {
        worker_id: req.worker_id,
        composite_score: composite,
        rates,
        previous_tier,
        new_tier,
    }))
}

// ---------------------------------------------------------------------------
// Read endpoints
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct RecentSnapshotsQuery {
    pub engine: Option<String>,
    pub limit: Option<i64>,
}

async fn get_recent_snapshots(
    State(state): State<ApiState>,
    Query(params): Query<RecentSnapshotsQuery>,
) -> Result<Json<Vec<SnapshotRow>>, AppError> {
    let limit = params.limit.unwrap_or(50);

    let rows = if let Some(engine) = params.engine {
        sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT id, engine, entity, score, tier, summary, created_at
            FROM score_snapshots
            WHERE engine = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(engine)
        .bind(limit)
        .fetch_all(&state.pool)
        .await?
    } else {
        sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT id, engine, entity, score, tier, summary, created_at
            FROM score_snapshots
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&state.pool)
        .await?
    };

    Ok(Json(rows))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

async fn get_worker_history(
    State(state): State<ApiState>,
    Path(worker_id): Path<String>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<WorkerHistoryRow>>, AppError> {
    let limit = params.limit.unwrap_or(50);

    let rows = sqlx::query_as::<_, WorkerHistoryRow>(
        r#"
        SELECT id, worker_id, score, tier, created_at
        FROM worker_score_history
        WHERE worker_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(worker_id)
    .bind(limit)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(rows))
}

#[derive(Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<usize>,
}

async fn get_activity(
    State(state): State<ApiState>,
    Query(params): Query<ActivityQuery>,
) -> Json<Vec<ActivityEvent>> {
    let limit = params.limit.unwrap_or(100);
    Json(state.activity.recent(limit))
}

async fn get_health(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "oracle_configured": state.health.oracle_configured(),
        "oracle_failures": state.health.oracle_failures(),
        "last_score_at_ns": state.health.last_score_at_ns(),
        "snapshots_pending": state.health.snapshots_pending(),
    }))
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<serde_json::Value> {
    match state.latency.summary() {
        Some(summary) => Json(serde_json::json!({
            "samples": summary.samples,
            "p50_us": summary.p50_us,
            "p95_us": summary.p95_us,
            "p99_us": summary.p99_us,
        })),
        None => Json(serde_json::json!({
            "samples": 0,
            "p50_us": null,
            "p95_us": null,
            "p99_us": null,
        })),
    }
}
