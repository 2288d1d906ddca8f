//! # frost-risk
//!
//! Scores the frost risk of one weather feature vector with a pre-trained
//! binary classifier and buckets it into `bajo`, `medio` or `alto`.
//!
//! The model artifact is read from disk the first time a score is requested
//! and reused afterwards.
//!
//! ## Quick Start
//!
//! ```no_run
//! use frost_risk::{Predictor, RiskLevel};
//!
//! let predictor = Predictor::new("case_models/GradientBoosting_final_optuna.onnx");
//! let assessment = predictor.assess_json(r#"{"vector": [92, 3.1, 1012, -0.4, -1.2, 0, 1, 0.5, 0.87, 1, 1.5, 88]}"#)?;
//! if assessment.risk_level == RiskLevel::Alto {
//!     println!("frost expected: {:.2}", assessment.risk);
//! }
//! # Ok::<(), frost_risk::RiskError>(())
//! ```
//!
//! ## Custom Scorer
//!
//! Anything implementing [`Scorer`] can stand in for the on-disk model:
//!
//! ```rust
//! use frost_risk::{Predictor, Scorer, ScorerKind};
//!
//! struct Constant;
//!
//! impl Scorer for Constant {
//!     fn kind(&self) -> ScorerKind {
//!         ScorerKind::Probabilistic
//!     }
//!     fn score(&mut self, _features: &[f64]) -> frost_risk::Result<f64> {
//!         Ok(0.95)
//!     }
//! }
//!
//! let predictor = Predictor::with_scorer(Box::new(Constant));
//! let assessment = predictor.assess_json(r#"{"vector": [0,0,0,0,0,0,0,0,0,0,0,0]}"#)?;
//! assert_eq!(assessment.risk_level.as_str(), "alto");
//! # Ok::<(), frost_risk::RiskError>(())
//! ```

#[cfg(feature = "cli")]
pub mod cli;

mod error;
pub mod features;
pub mod model;
mod pipeline;
mod risk;

use std::path::PathBuf;

use tracing::{info, warn};

pub use error::{Result, RiskError};
pub use model::{DEFAULT_MODEL_PATH, MODEL_PATH_ENV, ModelHandle, Scorer, ScorerKind};
pub use pipeline::{FallbackNotice, RiskAssessment, RiskRequest};
pub use risk::{DEFAULT_THRESHOLD, MEDIUM_RISK_FLOOR, RiskLevel};

use crate::model::HeuristicScorer;

/// Builder struct for configuring and running assessments.
///
/// # Examples
///
/// ```no_run
/// use frost_risk::Predictor;
///
/// // Model path from FROST_MODEL_PATH, or the default artifact
/// let predictor = Predictor::from_env();
///
/// // Explicit path, stricter default threshold, rule-based fallback
/// let predictor = Predictor::new("models/frost.json")
///     .with_default_threshold(0.95)
///     .with_heuristic_fallback(true);
/// ```
#[derive(Debug)]
pub struct Predictor {
    model: ModelHandle,
    default_threshold: f64,
    heuristic_fallback: bool,
}

impl Predictor {
    /// Predictor reading its model from `path` on first use.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::from_handle(ModelHandle::new(path))
    }

    /// Predictor using [`MODEL_PATH_ENV`] if set, else [`DEFAULT_MODEL_PATH`].
    #[must_use]
    pub fn from_env() -> Self {
        let path = std::env::var_os(MODEL_PATH_ENV)
            .map_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH), PathBuf::from);
        Self::new(path)
    }

    /// Predictor around an in-memory scorer.
    #[must_use]
    pub fn with_scorer(scorer: Box<dyn Scorer>) -> Self {
        Self::from_handle(ModelHandle::preloaded(scorer))
    }

    fn from_handle(model: ModelHandle) -> Self {
        Self {
            model,
            default_threshold: DEFAULT_THRESHOLD,
            heuristic_fallback: false,
        }
    }

    /// Threshold applied when a request carries none.
    #[must_use]
    pub fn with_default_threshold(mut self, threshold: f64) -> Self {
        self.default_threshold = threshold;
        self
    }

    /// Answer with [`HeuristicScorer`] when the model fails to load or score.
    ///
    /// Payload errors are never masked.
    #[must_use]
    pub fn with_heuristic_fallback(mut self, enabled: bool) -> Self {
        self.heuristic_fallback = enabled;
        self
    }

    #[must_use]
    pub fn default_threshold(&self) -> f64 {
        self.default_threshold
    }

    #[must_use]
    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    /// Raw risk for one vector, loading the model if needed.
    pub fn score(&self, vector: &[f64]) -> Result<f64> {
        pipeline::predict(self.model.get()?, vector)
    }

    /// Score and bucket one request.
    pub fn assess(&self, request: &RiskRequest) -> Result<RiskAssessment> {
        let threshold = request.threshold.unwrap_or(self.default_threshold);

        let assessment = match self.score(&request.vector) {
            Ok(risk) => RiskAssessment::new(risk, threshold),
            Err(err) if self.heuristic_fallback && !err.is_input_error() => {
                warn!(error = %err, "model unavailable, falling back to heuristic estimate");
                let risk = HeuristicScorer::estimate(&request.vector)?;
                RiskAssessment::new(risk, threshold).with_fallback(err.to_string())
            }
            Err(err) => return Err(err),
        };

        info!(
            risk = assessment.risk,
            risk_level = %assessment.risk_level,
            threshold,
            fallback = assessment.is_fallback(),
            "frost risk assessed"
        );
        Ok(assessment)
    }

    /// Parse a JSON payload and assess it.
    pub fn assess_json(&self, payload: &str) -> Result<RiskAssessment> {
        self.assess(&RiskRequest::from_json(payload)?)
    }
}

impl Default for Predictor {
    fn default() -> Self {
        Self::from_env()
    }
}
