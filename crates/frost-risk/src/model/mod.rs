use core::fmt;
use std::{
    path::{Path, PathBuf},
    sync::{Mutex, OnceLock},
};

use tracing::{info, warn};

use crate::error::{Result, RiskError};

mod ensemble;
mod heuristic;
mod onnx;

pub use ensemble::{EnsembleError, Node, Tree, TreeEnsemble};
pub use heuristic::HeuristicScorer;
pub use onnx::{OnnxLabelOnly, OnnxProbabilistic};

/// Artifact path used when neither `--model` nor [`MODEL_PATH_ENV`] is set.
pub const DEFAULT_MODEL_PATH: &str = "case_models/GradientBoosting_final_optuna.onnx";

/// Environment variable overriding [`DEFAULT_MODEL_PATH`].
pub const MODEL_PATH_ENV: &str = "FROST_MODEL_PATH";

/// How a scorer turns a feature vector into a risk value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerKind {
    /// Probability of the positive class.
    Probabilistic,
    /// Hard 0/1 label coerced to a float. Not a probability.
    LabelOnly,
    /// Rule-based estimate, no model involved.
    Heuristic,
}

impl fmt::Display for ScorerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Probabilistic => write!(f, "probabilistic"),
            Self::LabelOnly => write!(f, "label-only"),
            Self::Heuristic => write!(f, "heuristic"),
        }
    }
}

impl ScorerKind {
    /// Warning owed to operators when the risk is not a probability.
    #[must_use]
    pub fn degraded_notice(&self) -> Option<&'static str> {
        match self {
            Self::LabelOnly => Some(
                "model has no probability output; risk will be the raw 0/1 label, not a probability",
            ),
            Self::Probabilistic | Self::Heuristic => None,
        }
    }
}

/// A loaded model able to score one feature vector.
pub trait Scorer: Send {
    fn kind(&self) -> ScorerKind;

    /// Risk for a single sample.
    fn score(&mut self, features: &[f64]) -> Result<f64>;
}

/// Load the artifact at `path`, picking the scorer from its extension.
///
/// - `.onnx`: ONNX runtime session; probabilistic when the graph has a probability output
/// - `.json`: serialized [`TreeEnsemble`]
pub fn load(path: &Path) -> Result<Box<dyn Scorer>> {
    if !path.is_file() {
        return Err(RiskError::model_load(path, "file not found"));
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let scorer: Box<dyn Scorer> = match extension.as_deref() {
        Some("onnx") => onnx::load(path)?,
        Some("json") => Box::new(TreeEnsemble::from_file(path)?),
        _ => return Err(RiskError::UnsupportedArtifact(path.to_path_buf())),
    };

    if let Some(notice) = scorer.kind().degraded_notice() {
        warn!(path = %path.display(), "{notice}");
    }
    info!(path = %path.display(), kind = %scorer.kind(), "model loaded");
    Ok(scorer)
}

/// Model artifact loaded on first use and kept for the life of the handle.
pub struct ModelHandle {
    path: PathBuf,
    scorer: OnceLock<Mutex<Box<dyn Scorer>>>,
}

impl ModelHandle {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            scorer: OnceLock::new(),
        }
    }

    /// Handle around an already-built scorer; nothing is read from disk.
    #[must_use]
    pub fn preloaded(scorer: Box<dyn Scorer>) -> Self {
        Self {
            path: PathBuf::new(),
            scorer: OnceLock::from(Mutex::new(scorer)),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.scorer.get().is_some()
    }

    /// The scorer, loading it from disk if this is the first call.
    pub fn get(&self) -> Result<&Mutex<Box<dyn Scorer>>> {
        if let Some(scorer) = self.scorer.get() {
            return Ok(scorer);
        }
        let scorer = load(&self.path)?;
        Ok(self.scorer.get_or_init(|| Mutex::new(scorer)))
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("path", &self.path)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const ONE_SPLIT_MODEL: &str = r#"{
        "n_features": 2,
        "learning_rate": 1.0,
        "init_score": 0.0,
        "trees": [{"nodes": [
            {"type": "split", "feature": 0, "threshold": 0.5, "left": 1, "right": 2},
            {"type": "leaf", "value": -2.0},
            {"type": "leaf", "value": 2.0}
        ]}]
    }"#;

    #[test]
    fn test_only_label_scores_are_flagged() {
        let notice = ScorerKind::LabelOnly.degraded_notice().unwrap();
        assert!(notice.contains("not a probability"));
        assert_eq!(ScorerKind::Probabilistic.degraded_notice(), None);
        assert_eq!(ScorerKind::Heuristic.degraded_notice(), None);
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("absent.onnx")).err().unwrap();
        assert!(matches!(err, RiskError::ModelLoad { .. }), "got {err}");
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("GradientBoosting_final_optuna.joblib");
        fs::write(&path, b"pickle bytes").unwrap();

        let err = load(&path).err().unwrap();
        assert!(matches!(err, RiskError::UnsupportedArtifact(_)), "got {err}");
    }

    #[test]
    fn test_json_artifact_selects_ensemble() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.JSON");
        fs::write(&path, ONE_SPLIT_MODEL).unwrap();

        let mut scorer = load(&path).unwrap();
        assert_eq!(scorer.kind(), ScorerKind::Probabilistic);
        assert!(scorer.score(&[1.0, 0.0]).unwrap() > 0.5);
        assert!(scorer.score(&[0.0, 0.0]).unwrap() < 0.5);
    }

    #[test]
    fn test_handle_loads_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, ONE_SPLIT_MODEL).unwrap();

        let handle = ModelHandle::new(&path);
        assert!(!handle.is_loaded());
        handle.get().unwrap();
        assert!(handle.is_loaded());

        // The cached scorer survives the artifact disappearing.
        fs::remove_file(&path).unwrap();
        let scorer = handle.get().unwrap();
        let risk = scorer.lock().unwrap().score(&[1.0, 0.0]).unwrap();
        assert!(risk > 0.5);
    }

    #[test]
    fn test_handle_load_failure_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let handle = ModelHandle::new(&path);
        assert!(handle.get().is_err());
        assert!(!handle.is_loaded());

        fs::write(&path, ONE_SPLIT_MODEL).unwrap();
        assert!(handle.get().is_ok());
    }
}
