//! ONNX runtime scorers.
//!
//! A classifier exported with `zipmap=False` has two outputs: the predicted
//! label and a `[n, 2]` probability tensor. A graph with only the label output
//! can still be scored, but the risk is then the label itself.

use std::path::Path;

use ndarray::{Array2, ArrayView2, ArrayViewD};
use ort::{
    session::{Session, SessionOutputs, builder::GraphOptimizationLevel},
    value::Tensor,
};
use tracing::debug;

use super::{Scorer, ScorerKind};
use crate::error::{Result, RiskError};

/// Index of the probability output in a two-output classifier graph.
const PROBABILITY_OUTPUT: usize = 1;
/// Column of the positive class in the probability output.
const POSITIVE_CLASS: usize = 1;

fn build_session(path: &Path) -> ort::Result<Session> {
    Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(1)?
        .commit_from_file(path)
}

pub(super) fn load(path: &Path) -> Result<Box<dyn Scorer>> {
    let session = build_session(path).map_err(|e| RiskError::model_load(path, e))?;
    debug!(
        inputs = ?session.inputs.iter().map(|i| i.name.as_str()).collect::<Vec<_>>(),
        outputs = ?session.outputs.iter().map(|o| o.name.as_str()).collect::<Vec<_>>(),
        "ONNX session ready"
    );

    if session.inputs.is_empty() {
        return Err(RiskError::model_load(path, "graph declares no inputs"));
    }
    match scorer_kind(session.outputs.len()) {
        Some(ScorerKind::Probabilistic) => Ok(Box::new(OnnxProbabilistic { session })),
        Some(_) => Ok(Box::new(OnnxLabelOnly { session })),
        None => Err(RiskError::model_load(path, "graph declares no outputs")),
    }
}

/// Capability of a classifier graph, from how many outputs it declares.
fn scorer_kind(output_count: usize) -> Option<ScorerKind> {
    match output_count {
        0 => None,
        n if n > PROBABILITY_OUTPUT => Some(ScorerKind::Probabilistic),
        _ => Some(ScorerKind::LabelOnly),
    }
}

/// Positive-class probability of the first row.
fn positive_class(probs: ArrayView2<'_, f32>) -> Result<f64> {
    probs
        .get((0, POSITIVE_CLASS))
        .map(|&p| f64::from(p))
        .ok_or_else(|| {
            RiskError::inference(format!(
                "probability output has shape {:?}, expected [1, 2]",
                probs.shape()
            ))
        })
}

/// First predicted label as a float.
fn first_label<T: Copy + Into<Label>>(labels: ArrayViewD<'_, T>) -> Result<f64> {
    labels
        .iter()
        .next()
        .map(|&l| Into::<Label>::into(l).0)
        .ok_or_else(|| RiskError::inference("model returned no label"))
}

/// Label value of either integer or float label outputs.
struct Label(f64);

impl From<i64> for Label {
    #[allow(clippy::cast_precision_loss)]
    fn from(label: i64) -> Self {
        Self(label as f64)
    }
}

impl From<f32> for Label {
    fn from(label: f32) -> Self {
        Self(f64::from(label))
    }
}

/// One sample as a `[1, n]` matrix; ONNX classifiers exported from sklearn take f32.
#[allow(clippy::cast_possible_truncation)]
fn single_row(features: &[f64]) -> Array2<f32> {
    Array2::from_shape_fn((1, features.len()), |(_, col)| features[col] as f32)
}

fn single_row_tensor(features: &[f64]) -> ort::Result<Tensor<f32>> {
    let row = single_row(features);
    let shape = row.shape().to_vec();
    let data = row.into_raw_vec_and_offset().0.into_boxed_slice();
    Tensor::from_array((shape, data))
}

fn run_model_inference<'s>(
    session: &'s mut Session,
    features: &[f64],
) -> Result<SessionOutputs<'s>> {
    let input = single_row_tensor(features).map_err(RiskError::inference)?;
    let input_name = session.inputs[0].name.clone();
    session
        .run(ort::inputs![input_name => input])
        .map_err(RiskError::inference)
}

/// Scores with the positive-class probability.
pub struct OnnxProbabilistic {
    session: Session,
}

impl Scorer for OnnxProbabilistic {
    fn kind(&self) -> ScorerKind {
        ScorerKind::Probabilistic
    }

    fn score(&mut self, features: &[f64]) -> Result<f64> {
        let outputs = run_model_inference(&mut self.session, features)?;
        let probs = outputs[PROBABILITY_OUTPUT]
            .try_extract_array::<f32>()
            .map_err(|e| {
                RiskError::inference(format!(
                    "probability output is not a float tensor (was the model exported with zipmap?): {e}"
                ))
            })?
            .into_dimensionality::<ndarray::Ix2>()
            .map_err(RiskError::inference)?;
        positive_class(probs.view())
    }
}

/// Scores with the predicted label coerced to `f64`.
pub struct OnnxLabelOnly {
    session: Session,
}

impl Scorer for OnnxLabelOnly {
    fn kind(&self) -> ScorerKind {
        ScorerKind::LabelOnly
    }

    fn score(&mut self, features: &[f64]) -> Result<f64> {
        let outputs = run_model_inference(&mut self.session, features)?;
        match outputs[0].try_extract_array::<i64>() {
            Ok(labels) => first_label(labels.view()),
            Err(_) => first_label(
                outputs[0]
                    .try_extract_array::<f32>()
                    .map_err(RiskError::inference)?
                    .view(),
            ),
        }
    }
}
