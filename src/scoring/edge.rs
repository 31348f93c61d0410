//! Betting edge simulation: implied probability from American odds against a
//! logistic model probability built from a player's rolling average.

use serde::Serialize;

use crate::config::edge_model;
use crate::state::player_index::NameMatch;
use crate::types::{MarketLine, MatchQuality, Recommendation, StatKind};

/// One simulated line. Unmatched or malformed lines are still recorded,
/// with `valid: false` and no edge fields.
#[derive(Debug, Clone, Serialize)]
pub struct SimulatedEdge {
    pub player: String,
    pub stat: StatKind,
    pub line: f64,
    pub over_odds: i32,
    pub under_odds: i32,
    pub match_quality: MatchQuality,
    pub matched_player: Option<String>,
    pub projection: Option<f64>,
    pub implied_prob: Option<f64>,
    pub model_prob: Option<f64>,
    pub edge_pct: Option<f64>,
    pub recommendation: Option<Recommendation>,
    pub valid: bool,
}

/// Probability implied by American odds: `|o|/(|o|+100)` for negative odds,
/// `100/(o+100)` for positive.
pub fn implied_probability(odds: i32) -> f64 {
    let o = f64::from(odds);
    if o < 0.0 {
        -o / (-o + 100.0)
    } else {
        100.0 / (o + 100.0)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Model probability of the over: a logistic transform of the projection's
/// distance from the line, scaled by a fixed fraction of the line itself.
/// Callers must ensure `line > 0`.
pub fn model_probability(projection: f64, line: f64) -> f64 {
    let z = edge_model::STEEPNESS * (projection - line) / (edge_model::LINE_SPREAD_FACTOR * line);
    sigmoid(z)
}

/// Edge threshold classification: OVER above +5, UNDER below -5, else PASS.
pub fn recommend(edge_pct: f64) -> Recommendation {
    if edge_pct > edge_model::EDGE_THRESHOLD_PCT {
        Recommendation::Over
    } else if edge_pct < -edge_model::EDGE_THRESHOLD_PCT {
        Recommendation::Under
    } else {
        Recommendation::Pass
    }
}

/// Simulate one line given the outcome of the player-name resolution.
///
/// The resolution is passed in rather than looked up here so the edge math
/// stays a pure function of its inputs.
pub fn simulate(line: &MarketLine, resolution: NameMatch) -> SimulatedEdge {
    let mut out = SimulatedEdge {
        player: line.player.clone(),
        stat: line.stat,
        line: line.line,
        over_odds: line.over_odds,
        under_odds: line.under_odds,
        match_quality: MatchQuality::Unmatched,
        matched_player: None,
        projection: None,
        implied_prob: None,
        model_prob: None,
        edge_pct: None,
        recommendation: None,
        valid: false,
    };

    let (profile, quality) = match resolution {
        NameMatch::Exact(p) => (p, MatchQuality::Exact),
        NameMatch::LastToken(p) => (p, MatchQuality::LastToken),
        NameMatch::Ambiguous(_) => {
            out.match_quality = MatchQuality::Ambiguous;
            return out;
        }
        NameMatch::Miss => return out,
    };
    out.match_quality = quality;
    out.matched_player = Some(profile.name.clone());

    let Some(&projection) = profile.averages.get(&line.stat) else {
        return out;
    };
    out.projection = Some(projection);

    if line.line <= 0.0 {
        return out;
    }

    let implied = implied_probability(line.over_odds);
    let model = model_probability(projection, line.line);
    let edge_pct = (model - implied) * 100.0;

    out.implied_prob = Some(implied);
    out.model_prob = Some(model);
    out.edge_pct = Some(edge_pct);
    out.recommendation = Some(recommend(edge_pct));
    out.valid = true;
    out
}
