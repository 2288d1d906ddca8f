use std::sync::Mutex;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::{
    RiskLevel,
    error::{Result, RiskError},
    features,
    model::Scorer,
};

/// Payload accepted on the command line.
///
/// `vector` is passed to the model untouched; its length is the model's concern.
/// `threshold` may be omitted, but an explicit `null` is rejected.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RiskRequest {
    pub vector: Vec<f64>,
    #[serde(default, deserialize_with = "present_threshold")]
    pub threshold: Option<f64>,
}

fn present_threshold<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(Some)
}

impl RiskRequest {
    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(RiskError::PayloadJson)
    }
}

/// Result line written to stdout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub risk: f64,
    pub risk_level: RiskLevel,
    pub threshold: f64,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackNotice>,
}

/// Marks an assessment produced by the heuristic instead of the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FallbackNotice {
    pub mock: bool,
    pub fallback: bool,
    pub error: String,
}

impl RiskAssessment {
    #[must_use]
    pub fn new(risk: f64, threshold: f64) -> Self {
        Self {
            risk,
            risk_level: RiskLevel::classify(risk, threshold),
            threshold,
            fallback: None,
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, error: impl Into<String>) -> Self {
        self.fallback = Some(FallbackNotice {
            mock: true,
            fallback: true,
            error: error.into(),
        });
        self
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Run one vector through the scorer behind `model`.
pub fn predict(model: &Mutex<Box<dyn Scorer>>, vector: &[f64]) -> Result<f64> {
    for (name, value) in features::named(vector) {
        debug!(feature = name, value, "input feature");
    }

    let mut scorer = model
        .lock()
        .map_err(|_| RiskError::inference("model lock poisoned by an earlier panic"))?;
    let risk = scorer.score(vector)?;
    debug!(risk, kind = %scorer.kind(), "model scored vector");
    Ok(risk)
}
