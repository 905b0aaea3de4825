//! Pre-trained scoring models and the registry that holds them for the
//! lifetime of the process.
//!
//! Artifacts are gradient-boosted tree dumps in JSON:
//!
//! ```json
//! {
//!   "variant": "bureau",
//!   "features": ["age", "age_band", "log_income"],
//!   "base_score": -0.1,
//!   "decision_threshold": 0.5,
//!   "trees": [
//!     {"nodes": [
//!       {"feature": 2, "threshold": 14.5, "left": 1, "right": 2},
//!       {"leaf": -0.4},
//!       {"leaf": 0.6}
//!     ]}
//!   ]
//! }
//! ```
//!
//! A split sends `value < threshold` left. Children always point forward, so
//! traversal terminates without cycle tracking.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use super::domain::ModelVariant;
use super::features::feature_names;
use super::scorer::ScoringError;
use crate::config::ModelConfig;

/// Raw margin and the probability derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub raw: f64,
    pub probability: f64,
}

/// Capability the scorer needs from a loaded model.
pub trait ScoringModel: Send + Sync {
    fn variant(&self) -> ModelVariant;

    /// Column names in the order `predict` expects them.
    fn feature_names(&self) -> &[String];

    /// Probability at or above which the applicant is approved.
    fn decision_threshold(&self) -> f64;

    fn predict(&self, features: &[f64]) -> Result<Prediction, ScoringError>;
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        leaf: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct Tree {
    nodes: Vec<TreeNode>,
}

impl Tree {
    fn evaluate(&self, features: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { leaf } => return *leaf,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[*feature] < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    fn validate(&self, tree_index: usize, feature_count: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err(format!("tree {tree_index} has no nodes"));
        }

        let node_count = self.nodes.len();
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Leaf { leaf } if !leaf.is_finite() => {
                    return Err(format!("tree {tree_index} node {index} has a non-finite leaf"));
                }
                TreeNode::Leaf { .. } => {}
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= feature_count {
                        return Err(format!(
                            "tree {tree_index} node {index} splits on feature {feature} of {feature_count}"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!(
                            "tree {tree_index} node {index} has a non-finite threshold"
                        ));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= node_count {
                            return Err(format!(
                                "tree {tree_index} node {index} points to invalid child {child}"
                            ));
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

/// On-disk shape of an artifact, before validation.
#[derive(Deserialize)]
struct Artifact {
    variant: ModelVariant,
    features: Vec<String>,
    #[serde(default)]
    base_score: f64,
    decision_threshold: f64,
    trees: Vec<Tree>,
}

/// Gradient-boosted tree ensemble with a logistic link.
///
/// Only built through [`TreeEnsemble::from_json`] or [`TreeEnsemble::from_path`],
/// so every split index has been bounds-checked before `margin` runs.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeEnsemble {
    variant: ModelVariant,
    features: Vec<String>,
    base_score: f64,
    decision_threshold: f64,
    trees: Vec<Tree>,
}

impl TreeEnsemble {
    pub fn from_path(
        path: impl AsRef<Path>,
        expected: ModelVariant,
    ) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw, expected).map_err(|err| match err {
            ModelLoadError::Parse { source, .. } => ModelLoadError::Parse {
                origin: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    pub fn from_json(raw: &str, expected: ModelVariant) -> Result<Self, ModelLoadError> {
        let artifact: Artifact =
            serde_json::from_str(raw).map_err(|source| ModelLoadError::Parse {
                origin: "inline".to_string(),
                source,
            })?;
        let model = TreeEnsemble {
            variant: artifact.variant,
            features: artifact.features,
            base_score: artifact.base_score,
            decision_threshold: artifact.decision_threshold,
            trees: artifact.trees,
        };

        if model.variant != expected {
            return Err(ModelLoadError::VariantMismatch {
                expected,
                found: model.variant,
            });
        }
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ModelLoadError> {
        let invalid = |reason: String| ModelLoadError::Invalid {
            variant: self.variant,
            reason,
        };

        if self.features.is_empty() {
            return Err(invalid("artifact declares no features".to_string()));
        }
        if self.trees.is_empty() {
            return Err(invalid("artifact contains no trees".to_string()));
        }
        if !self.base_score.is_finite() {
            return Err(invalid("base_score must be finite".to_string()));
        }
        if !(0.0..=1.0).contains(&self.decision_threshold) {
            return Err(invalid(format!(
                "decision_threshold {} outside [0, 1]",
                self.decision_threshold
            )));
        }

        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate(index, self.features.len()).map_err(invalid)?;
        }
        Ok(())
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    fn margin(&self, features: &[f64]) -> f64 {
        self.trees
            .iter()
            .fold(self.base_score, |sum, tree| sum + tree.evaluate(features))
    }
}

impl ScoringModel for TreeEnsemble {
    fn variant(&self) -> ModelVariant {
        self.variant
    }

    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn decision_threshold(&self) -> f64 {
        self.decision_threshold
    }

    fn predict(&self, features: &[f64]) -> Result<Prediction, ScoringError> {
        if features.len() != self.features.len() {
            return Err(ScoringError::ShapeMismatch {
                variant: self.variant,
                expected: self.features.len(),
                actual: features.len(),
            });
        }

        let raw = self.margin(features);
        Ok(Prediction {
            raw,
            probability: sigmoid(raw),
        })
    }
}

pub fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}

/// The two models, loaded once and shared read-only by every request.
#[derive(Clone, Default)]
pub struct ModelRegistry {
    bureau: Option<Arc<dyn ScoringModel>>,
    no_bureau: Option<Arc<dyn ScoringModel>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: Arc<dyn ScoringModel>) -> Self {
        match model.variant() {
            ModelVariant::Bureau => self.bureau = Some(model),
            ModelVariant::NoBureau => self.no_bureau = Some(model),
        }
        self
    }

    pub fn get(&self, variant: ModelVariant) -> Option<&Arc<dyn ScoringModel>> {
        match variant {
            ModelVariant::Bureau => self.bureau.as_ref(),
            ModelVariant::NoBureau => self.no_bureau.as_ref(),
        }
    }

    pub fn loaded_variants(&self) -> Vec<ModelVariant> {
        ModelVariant::ALL
            .into_iter()
            .filter(|variant| self.get(*variant).is_some())
            .collect()
    }

    /// Load both artifacts. A slot that fails stays empty and requests for
    /// it fail with `ModelUnavailable`; failing both is fatal.
    pub fn load(config: &ModelConfig) -> Result<Self, ModelLoadError> {
        let mut registry = Self::new();
        let mut failures = Vec::new();

        for (variant, path) in [
            (ModelVariant::Bureau, &config.bureau_path),
            (ModelVariant::NoBureau, &config.no_bureau_path),
        ] {
            match load_artifact(variant, path) {
                Ok(model) => {
                    info!(
                        variant = %variant,
                        path = %path.display(),
                        trees = model.tree_count(),
                        features = model.features.len(),
                        "model loaded"
                    );
                    registry = registry.with_model(Arc::new(model));
                }
                Err(err) => {
                    warn!(variant = %variant, path = %path.display(), error = %err, "model unavailable");
                    failures.push(err.to_string());
                }
            }
        }

        if registry.loaded_variants().is_empty() {
            return Err(ModelLoadError::NoModelsLoaded { failures });
        }
        Ok(registry)
    }
}

fn load_artifact(variant: ModelVariant, path: &Path) -> Result<TreeEnsemble, ModelLoadError> {
    let model = TreeEnsemble::from_path(path, variant)?;
    let expected = feature_names(variant);
    if model.features.iter().map(String::as_str).ne(expected.iter().copied()) {
        return Err(ModelLoadError::FeatureMismatch {
            variant,
            expected: expected.iter().map(|name| name.to_string()).collect(),
            found: model.features,
        });
    }
    Ok(model)
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("loaded", &self.loaded_variants())
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("unable to read model artifact {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("model artifact {origin} is not valid JSON: {source}")]
    Parse {
        origin: String,
        source: serde_json::Error,
    },
    #[error("artifact for {found} loaded into the {expected} slot")]
    VariantMismatch {
        expected: ModelVariant,
        found: ModelVariant,
    },
    #[error("{variant} artifact is malformed: {reason}")]
    Invalid {
        variant: ModelVariant,
        reason: String,
    },
    #[error("{variant} artifact features {found:?} do not match the pipeline columns {expected:?}")]
    FeatureMismatch {
        variant: ModelVariant,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("no scoring model could be loaded: {}", .failures.join("; "))]
    NoModelsLoaded { failures: Vec<String> },
}
