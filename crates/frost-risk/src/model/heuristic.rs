use super::{Scorer, ScorerKind};
use crate::{
    error::{Result, RiskError},
    features::{DEW_POINT, HUMIDITY, TEMPERATURE_LAG_6H},
};

const BASE_RISK: f64 = 0.1;
const COLD_CELSIUS: f64 = 5.0;
const CRITICAL_CELSIUS: f64 = 2.0;
const HUMID_PERCENT: f64 = 85.0;

/// Rule-of-thumb frost estimate from temperature, humidity and dew point.
///
/// Used only when the model cannot produce a score and the caller opted in.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicScorer;

impl HeuristicScorer {
    pub fn estimate(features: &[f64]) -> Result<f64> {
        let slot = |idx: usize| {
            features.get(idx).copied().ok_or_else(|| {
                RiskError::InvalidPayload(format!(
                    "heuristic needs at least {} features, got {}",
                    TEMPERATURE_LAG_6H + 1,
                    features.len()
                ))
            })
        };
        let temperature = slot(TEMPERATURE_LAG_6H)?;
        let humidity = slot(HUMIDITY)?;
        let dew_point = slot(DEW_POINT)?;

        let mut risk = BASE_RISK;
        if temperature < COLD_CELSIUS {
            risk += 0.3;
        }
        if temperature < CRITICAL_CELSIUS {
            risk += 0.3;
        }
        if humidity > HUMID_PERCENT {
            risk += 0.2;
        }
        if dew_point < 0.0 {
            risk += 0.2;
        }
        Ok(risk.min(1.0))
    }
}

impl Scorer for HeuristicScorer {
    fn kind(&self) -> ScorerKind {
        ScorerKind::Heuristic
    }

    fn score(&mut self, features: &[f64]) -> Result<f64> {
        Self::estimate(features)
    }
}
