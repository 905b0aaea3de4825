use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use super::domain::{ApplicantRecord, ModelVariant};
use super::features::engineer;
use super::grade::{grade_for, Grade};
use super::model::ModelRegistry;
use super::normalizer::{normalize_form, normalize_json, ValidationError};
use super::scorer::{score, ScoreResult, ScoringError};

/// Result page shown to a human applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultPage {
    Approve,
    Reject,
}

/// Score plus the grade band derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoanAssessment {
    pub score: ScoreResult,
    pub grade: Grade,
}

impl LoanAssessment {
    pub fn variant(&self) -> ModelVariant {
        self.score.variant
    }

    pub fn decision(&self) -> bool {
        self.score.decision
    }

    pub fn page(&self) -> ResultPage {
        if self.grade.is_approved() {
            ResultPage::Approve
        } else {
            ResultPage::Reject
        }
    }
}

/// Runs normalize → engineer → score → grade against the shared models.
#[derive(Debug, Clone)]
pub struct LoanScoringService {
    models: ModelRegistry,
}

impl LoanScoringService {
    pub fn new(models: ModelRegistry) -> Self {
        Self { models }
    }

    /// Score an already validated applicant.
    pub fn assess(&self, record: &ApplicantRecord) -> Result<LoanAssessment, ScoringError> {
        let features = engineer(record);
        let result = score(&self.models, &features).map_err(|err| {
            error!(
                variant = %features.variant,
                feature_count = features.len(),
                error = %err,
                "scoring failed"
            );
            err
        })?;
        let grade = grade_for(result.probability, result.variant);

        info!(
            variant = %result.variant,
            score = result.score,
            decision = result.decision,
            grade = %grade,
            "loan assessed"
        );

        Ok(LoanAssessment {
            score: result,
            grade,
        })
    }

    pub fn assess_json(&self, payload: &Value) -> Result<LoanAssessment, LoanScoringError> {
        let record = normalize_json(payload).map_err(log_rejection)?;
        Ok(self.assess(&record)?)
    }

    pub fn assess_form(
        &self,
        form: &HashMap<String, String>,
    ) -> Result<LoanAssessment, LoanScoringError> {
        let record = normalize_form(form).map_err(log_rejection)?;
        Ok(self.assess(&record)?)
    }
}

fn log_rejection(err: ValidationError) -> ValidationError {
    warn!(
        fields = ?err.fields().collect::<Vec<_>>(),
        reason = %err.summary(),
        "applicant payload rejected"
    );
    err
}

#[derive(Debug, thiserror::Error)]
pub enum LoanScoringError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
}
