use serde::Serialize;
use tracing::debug;

use super::domain::ModelVariant;
use super::features::FeatureVector;
use super::model::ModelRegistry;

/// Failures raised while invoking a model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("{variant} is not loaded")]
    ModelUnavailable { variant: ModelVariant },
    #[error("{variant} expects {expected} features, received {actual}")]
    ShapeMismatch {
        variant: ModelVariant,
        expected: usize,
        actual: usize,
    },
    #[error("{variant} feature columns differ from the engineered vector at column {column}")]
    ColumnMismatch { variant: ModelVariant, column: usize },
    #[error("{variant} produced an invalid probability {probability}")]
    InvalidOutput {
        variant: ModelVariant,
        probability: f64,
    },
}

/// Raw model output and the decision taken on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreResult {
    pub variant: ModelVariant,
    pub score: f64,
    pub probability: f64,
    pub decision: bool,
}

/// Route a feature vector to the model trained for its variant.
pub fn score(registry: &ModelRegistry, features: &FeatureVector) -> Result<ScoreResult, ScoringError> {
    let variant = features.variant;
    let model = registry
        .get(variant)
        .ok_or(ScoringError::ModelUnavailable { variant })?;

    let expected = model.feature_names();
    if expected.len() != features.len() {
        return Err(ScoringError::ShapeMismatch {
            variant,
            expected: expected.len(),
            actual: features.len(),
        });
    }
    if let Some(column) = expected
        .iter()
        .zip(&features.names)
        .position(|(expected, actual)| expected != actual)
    {
        return Err(ScoringError::ColumnMismatch { variant, column });
    }

    let prediction = model.predict(&features.values)?;
    let probability = prediction.probability;
    if !(0.0..=1.0).contains(&probability) {
        return Err(ScoringError::InvalidOutput {
            variant,
            probability,
        });
    }

    let decision = probability >= model.decision_threshold();
    debug!(
        variant = %variant,
        score = prediction.raw,
        probability,
        decision,
        "model scored"
    );

    Ok(ScoreResult {
        variant,
        score: prediction.raw,
        probability,
        decision,
    })
}
