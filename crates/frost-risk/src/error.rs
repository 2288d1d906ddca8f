use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = RiskError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("invalid payload JSON: {0}")]
    PayloadJson(#[source] serde_json::Error),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("failed to load model from {}: {reason}", path.display())]
    ModelLoad { path: PathBuf, reason: String },
    #[error("unsupported model artifact {}: expected a .onnx or .json file", .0.display())]
    UnsupportedArtifact(PathBuf),
    #[error("feature vector has {got} values, model expects {expected}")]
    ShapeMismatch { expected: usize, got: usize },
    #[error("inference failed: {0}")]
    Inference(String),
}

impl RiskError {
    /// True when the caller's payload is at fault rather than the model.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::PayloadJson(_) | Self::InvalidPayload(_))
    }

    pub(crate) fn model_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ModelLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn inference(reason: impl ToString) -> Self {
        Self::Inference(reason.to_string())
    }
}
