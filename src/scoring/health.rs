//! Relationship health scoring: windowed engagement aggregates in, a 0-100
//! score plus an urgency tier out.

use serde::{Deserialize, Serialize};

use crate::config::health_weights as w;
use crate::types::HealthTier;

/// Aggregated engagement counts for one entity over the scoring window.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngagementWindow {
    pub interactions: u32,
    pub orders: u32,
    pub revenue: f64,
    pub red_flags: u32,
    pub opportunities: u32,
}

/// Point contribution of each component, pre-clamp.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HealthComponents {
    pub interaction_points: f64,
    pub order_points: f64,
    pub revenue_points: f64,
    pub base_points: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthScore {
    pub score: u8,
    pub tier: HealthTier,
    pub summary: String,
    pub components: HealthComponents,
}

/// Pre-grouped aggregates for one entity in a batch request.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityAggregates {
    pub entity_id: String,
    #[serde(flatten)]
    pub window: EngagementWindow,
}

/// Score one entity's engagement window.
///
/// Four additive components, each capped at 25 points. Zero activity leaves
/// only the base component: score 25, fragile. Inactivity is penalized, not
/// special-cased.
pub fn score_engagement(window: &EngagementWindow) -> HealthScore {
    let interaction_points =
        (f64::from(window.interactions) * w::INTERACTION_POINTS).min(w::COMPONENT_CAP);
    let order_points = (f64::from(window.orders) * w::ORDER_POINTS).min(w::COMPONENT_CAP);
    let revenue_points = (window.revenue / w::REVENUE_DIVISOR).min(w::COMPONENT_CAP);

    let risk_penalty = (f64::from(window.red_flags) * w::RED_FLAG_PENALTY)
        .min(w::RED_FLAG_PENALTY_CAP);
    let opportunity_bonus = (f64::from(window.opportunities) * w::OPPORTUNITY_BONUS)
        .min(w::OPPORTUNITY_BONUS_CAP);
    let base_points = w::BASE - risk_penalty + opportunity_bonus;

    let raw = interaction_points + order_points + revenue_points + base_points;
    let clamped = raw.clamp(0.0, 100.0);
    let tier = HealthTier::from_score(clamped);

    let summary = format!(
        "{tier} relationship: {} interactions, {} orders (${:.0} revenue), {} red flags, {} opportunities in window",
        window.interactions, window.orders, window.revenue, window.red_flags, window.opportunities,
    );

    HealthScore {
        score: clamped.round() as u8,
        tier,
        summary,
        components: HealthComponents {
            interaction_points,
            order_points,
            revenue_points,
            base_points,
        },
    }
}

/// Batch variant: the identical computation across many entities from
/// pre-grouped aggregates, one in-memory pass.
pub fn score_batch(entities: &[EntityAggregates]) -> Vec<(String, HealthScore)> {
    entities
        .iter()
        .map(|e| (e.entity_id.clone(), score_engagement(&e.window)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(
        interactions: u32,
        orders: u32,
        revenue: f64,
        red_flags: u32,
        opportunities: u32,
    ) -> EngagementWindow {
        EngagementWindow { interactions, orders, revenue, red_flags, opportunities }
    }

    #[test]
    fn zero_activity_scores_base_only() {
        let result = score_engagement(&window(0, 0, 0.0, 0, 0));
        assert_eq!(result.score, 25);
        assert_eq!(result.tier, HealthTier::Fragile);
    }

    #[test]
    fn capped_components_clamp_to_elite() {
        // 10 interactions -> 30 capped 25; 6 orders -> 30 capped 25;
        // $6000 -> 30 capped 25; base 25 + 15 opportunity bonus.
        let result = score_engagement(&window(10, 6, 6000.0, 0, 5));
        assert_eq!(result.score, 100);
        assert_eq!(result.tier, HealthTier::Elite);
    }

    #[test]
    fn red_flag_penalty_caps_at_fifteen() {
        let result = score_engagement(&window(0, 0, 0.0, 10, 0));
        assert_eq!(result.score, 10);
        assert_eq!(result.tier, HealthTier::Fragile);
    }

    #[test]
    fn tier_breakpoints_are_exact() {
        assert_eq!(HealthTier::from_score(39.0), HealthTier::Fragile);
        assert_eq!(HealthTier::from_score(40.0), HealthTier::Neutral);
        assert_eq!(HealthTier::from_score(59.0), HealthTier::Neutral);
        assert_eq!(HealthTier::from_score(60.0), HealthTier::Strong);
        assert_eq!(HealthTier::from_score(79.0), HealthTier::Strong);
        assert_eq!(HealthTier::from_score(80.0), HealthTier::Elite);
    }

    #[test]
    fn score_stays_in_range_for_extreme_inputs() {
        let extremes = [
            window(u32::MAX, u32::MAX, f64::MAX / 4.0, 0, u32::MAX),
            window(0, 0, 0.0, u32::MAX, 0),
            window(1, 1, 1.0, 1, 1),
        ];
        for wnd in &extremes {
            let result = score_engagement(wnd);
            assert!(result.score <= 100, "score={} for {wnd:?}", result.score);
        }
    }

    #[test]
    fn rescoring_is_idempotent() {
        let wnd = window(4, 2, 900.0, 1, 2);
        let first = score_engagement(&wnd);
        let second = score_engagement(&wnd);
        assert_eq!(first.score, second.score);
        assert_eq!(first.tier, second.tier);
    }

    #[test]
    fn batch_matches_single() {
        let entities = vec![
            EntityAggregates { entity_id: "a".into(), window: window(10, 6, 6000.0, 0, 5) },
            EntityAggregates { entity_id: "b".into(), window: window(0, 0, 0.0, 0, 0) },
        ];
        let scored = score_batch(&entities);
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].0, "a");
        assert_eq!(scored[0].1.score, 100);
        assert_eq!(scored[1].1.score, 25);
    }
}
