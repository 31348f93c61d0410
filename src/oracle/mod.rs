//! Generative-text oracle: an injectable capability with the contract
//! "given a prompt, return a string that should parse as JSON, or fail".
//! Failures never fail the surrounding request.

mod client;

pub use client::HttpOracle;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AppError, Result};

#[async_trait]
pub trait TextOracle: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Stand-in when no oracle endpoint is configured. Every call fails, which
/// callers degrade to their fallback value.
pub struct NullOracle;

#[async_trait]
impl TextOracle for NullOracle {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(AppError::Oracle("no oracle endpoint configured".to_string()))
    }
}

/// Parsed forecast reply. `Default` is the degraded value substituted when
/// the oracle fails or replies with something unparseable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesForecast {
    #[serde(default)]
    pub predicted_orders: u32,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub forecast: String,
}

/// Parse an oracle reply into a forecast. Models often wrap the JSON in
/// prose or code fences, so after a direct parse fails we retry on the
/// outermost brace-delimited slice.
pub fn parse_forecast(raw: &str) -> Option<SalesForecast> {
    if let Ok(forecast) = serde_json::from_str(raw) {
        return Some(forecast);
    }
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

/// Ask the oracle for a forecast. Any failure is logged and returned as
/// `None` so the caller can substitute the default.
pub async fn fetch_forecast(oracle: &dyn TextOracle, prompt: &str) -> Option<SalesForecast> {
    match oracle.complete(prompt).await {
        Ok(raw) => {
            let parsed = parse_forecast(&raw);
            if parsed.is_none() {
                warn!(reply_len = raw.len(), "oracle reply was not parseable as a forecast");
            }
            parsed
        }
        Err(e) => {
            warn!("oracle request failed: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticOracle(&'static str);

    #[async_trait]
    impl TextOracle for StaticOracle {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingOracle;

    #[async_trait]
    impl TextOracle for FailingOracle {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Err(AppError::Oracle("boom".to_string()))
        }
    }

    #[test]
    fn parses_a_plain_json_reply() {
        let reply = r#"{"predicted_orders": 12, "recommendations": ["call acme"], "forecast": "steady"}"#;
        let forecast = parse_forecast(reply).unwrap();
        assert_eq!(forecast.predicted_orders, 12);
        assert_eq!(forecast.recommendations, vec!["call acme".to_string()]);
        assert_eq!(forecast.forecast, "steady");
    }

    #[test]
    fn parses_json_wrapped_in_prose_and_fences() {
        let reply = "Here is the forecast:\n```json\n{\"predicted_orders\": 3, \"recommendations\": [], \"forecast\": \"slow month\"}\n```";
        let forecast = parse_forecast(reply).unwrap();
        assert_eq!(forecast.predicted_orders, 3);
        assert_eq!(forecast.forecast, "slow month");
    }

    #[test]
    fn missing_fields_default() {
        let forecast = parse_forecast(r#"{"predicted_orders": 7}"#).unwrap();
        assert_eq!(forecast.predicted_orders, 7);
        assert!(forecast.recommendations.is_empty());
        assert!(forecast.forecast.is_empty());
    }

    #[test]
    fn garbage_reply_is_none() {
        assert!(parse_forecast("no json here").is_none());
        assert!(parse_forecast("}{").is_none());
    }

    #[tokio::test]
    async fn oracle_failure_degrades_to_none() {
        assert!(fetch_forecast(&FailingOracle, "prompt").await.is_none());
    }

    #[tokio::test]
    async fn unparseable_reply_degrades_to_none() {
        assert!(fetch_forecast(&StaticOracle("i refuse"), "prompt").await.is_none());
    }

    #[tokio::test]
    async fn good_reply_round_trips() {
        let oracle = StaticOracle(r#"{"predicted_orders": 5, "recommendations": ["a"], "forecast": "up"}"#);
        let forecast = fetch_forecast(&oracle, "prompt").await.unwrap();
        assert_eq!(forecast.predicted_orders, 5);
    }

    #[tokio::test]
    async fn null_oracle_always_fails() {
        assert!(NullOracle.complete("prompt").await.is_err());
    }
}
