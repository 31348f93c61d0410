//! VA tier evaluation: funnel conversion rates, a weighted composite, and a
//! one-level-per-evaluation tier ratchet.

use serde::Serialize;

use crate::config::tier_model as m;
use crate::types::WorkerPeriodStats;

/// Funnel conversion rates and outcome components, each on a 0-100 scale.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FunnelRates {
    pub contact_rate: f64,
    pub conversation_rate: f64,
    pub appointment_rate: f64,
    pub contract_rate: f64,
    pub task_success_rate: f64,
    pub lesson_average: f64,
}

/// Percentage of `num` over `den`, capped at 100. Zero denominator yields 0.
fn rate(num: u32, den: u32) -> f64 {
    if den == 0 {
        return 0.0;
    }
    (f64::from(num) / f64::from(den) * 100.0).min(100.0)
}

pub fn funnel_rates(stats: &WorkerPeriodStats) -> FunnelRates {
    let lesson_average = if stats.lesson_scores.is_empty() {
        0.0
    } else {
        let sum: f64 = stats.lesson_scores.iter().sum();
        (sum / stats.lesson_scores.len() as f64).clamp(0.0, 100.0)
    };

    FunnelRates {
        contact_rate: rate(stats.contacts, stats.calls),
        conversation_rate: rate(stats.conversations, stats.contacts),
        appointment_rate: rate(stats.appointments, stats.conversations),
        contract_rate: rate(stats.contracts, stats.appointments),
        task_success_rate: rate(stats.tasks_completed, stats.tasks_assigned),
        lesson_average,
    }
}

/// Weighted composite of the six components. Weights sum to 1.0, so the
/// composite stays on the same 0-100 scale as its inputs.
pub fn composite_score(rates: &FunnelRates) -> f64 {
    m::W_CONTACT * rates.contact_rate
        + m::W_CONVERSATION * rates.conversation_rate
        + m::W_APPOINTMENT * rates.appointment_rate
        + m::W_CONTRACT * rates.contract_rate
        + m::W_TASK * rates.task_success_rate
        + m::W_LESSON * rates.lesson_average
}

/// Tier ratchet. Each promotion branch guards the current tier, so one
/// evaluation moves at most one level in either direction: a score of 95
/// promotes a tier-3 worker to 4, never to 5.
pub fn next_tier(current: u8, score: f64) -> u8 {
    let current = current.clamp(m::MIN_TIER, m::MAX_TIER);
    if score >= m::PROMOTE_TO_5 && current < 5 {
        current + 1
    } else if score >= m::PROMOTE_TO_4 && current < 4 {
        current + 1
    } else if score >= m::PROMOTE_TO_3 && current < 3 {
        current + 1
    } else if score >= m::PROMOTE_TO_2 && current < 2 {
        current + 1
    } else if score < m::DEMOTE_BELOW && current > m::MIN_TIER {
        current - 1
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_rates(value: f64) -> FunnelRates {
        FunnelRates {
            contact_rate: value,
            conversation_rate: value,
            appointment_rate: value,
            contract_rate: value,
            task_success_rate: value,
            lesson_average: value,
        }
    }

    #[test]
    fn zero_denominators_produce_zero_rates() {
        let rates = funnel_rates(&WorkerPeriodStats::default());
        assert_eq!(rates.contact_rate, 0.0);
        assert_eq!(rates.conversation_rate, 0.0);
        assert_eq!(rates.appointment_rate, 0.0);
        assert_eq!(rates.contract_rate, 0.0);
        assert_eq!(rates.task_success_rate, 0.0);
        assert_eq!(rates.lesson_average, 0.0);
        assert_eq!(composite_score(&rates), 0.0);
    }

    #[test]
    fn rates_cap_at_one_hundred() {
        // More contracts than appointments should not push a rate past 100.
        let stats = WorkerPeriodStats {
            calls: 10,
            contacts: 10,
            conversations: 10,
            appointments: 2,
            contracts: 5,
            tasks_assigned: 4,
            tasks_completed: 4,
            lesson_scores: vec![120.0],
        };
        let rates = funnel_rates(&stats);
        assert_eq!(rates.contract_rate, 100.0);
        assert_eq!(rates.lesson_average, 100.0);
        assert!(composite_score(&rates) <= 100.0);
    }

    #[test]
    fn perfect_funnel_scores_one_hundred() {
        let composite = composite_score(&flat_rates(100.0));
        assert!((composite - 100.0).abs() < 1e-9);
    }

    #[test]
    fn composite_of_ninety_promotes_exactly_one_level() {
        let composite = composite_score(&flat_rates(90.0));
        assert!((composite - 90.0).abs() < 1e-9);
        assert_eq!(next_tier(3, composite), 4);
    }

    #[test]
    fn high_score_never_skips_tiers() {
        assert_eq!(next_tier(1, 95.0), 2);
        assert_eq!(next_tier(3, 95.0), 4);
        assert_eq!(next_tier(4, 95.0), 5);
    }

    #[test]
    fn top_tier_holds_at_five() {
        assert_eq!(next_tier(5, 99.0), 5);
    }

    #[test]
    fn low_score_demotes_one_level_with_floor() {
        assert_eq!(next_tier(3, 39.9), 2);
        assert_eq!(next_tier(1, 10.0), 1);
    }

    #[test]
    fn middle_band_holds_tier() {
        // The >=75 branch only applies below tier 4, so an 80 holds at 4.
        assert_eq!(next_tier(4, 80.0), 4);
        // Between the demotion floor and the next promotion threshold.
        assert_eq!(next_tier(2, 45.0), 2);
    }

    #[test]
    fn promotion_thresholds_match_cascade() {
        assert_eq!(next_tier(1, 50.0), 2);
        assert_eq!(next_tier(2, 60.0), 3);
        assert_eq!(next_tier(3, 75.0), 4);
        assert_eq!(next_tier(4, 89.9), 4);
        assert_eq!(next_tier(4, 90.0), 5);
    }

    #[test]
    fn out_of_range_tier_is_clamped_before_moving() {
        assert_eq!(next_tier(0, 10.0), 1);
        assert_eq!(next_tier(9, 95.0), 5);
    }
}
