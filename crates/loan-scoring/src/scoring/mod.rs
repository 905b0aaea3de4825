//! Applicant scoring pipeline.
//!
//! `normalizer` validates loose input into an [`ApplicantRecord`], `features`
//! evaluates the declarative rule table, `scorer` routes the vector to the
//! model trained for its variant, and `grade` bins the probability. The
//! `service` composes those steps and `router` exposes them over HTTP.

pub mod domain;
pub mod features;
pub mod grade;
pub mod model;
pub mod normalizer;
pub mod pages;
pub mod router;
pub mod scorer;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{ApplicantRecord, BureauRecord, Education, Gender, ModelVariant, Purpose};
pub use features::{engineer, feature_names, FeatureVector};
pub use grade::{grade_for, Grade};
pub use model::{ModelLoadError, ModelRegistry, Prediction, ScoringModel, TreeEnsemble};
pub use normalizer::{normalize_form, normalize_json, FieldIssue, ValidationError};
pub use pages::{Page, PageContext, PageError, PageRenderer, TemplatePages};
pub use router::{scoring_router, ScoringState};
pub use scorer::{ScoreResult, ScoringError};
pub use service::{LoanAssessment, LoanScoringError, LoanScoringService, ResultPage};
