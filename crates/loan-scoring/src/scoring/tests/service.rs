use std::sync::Arc;

use serde_json::json;

use super::common::*;
use crate::scoring::domain::ModelVariant;
use crate::scoring::grade::Grade;
use crate::scoring::model::{Prediction, ScoringModel, TreeEnsemble};
use crate::scoring::scorer::ScoringError;
use crate::scoring::service::{LoanScoringError, ResultPage};

/// Answers every request with the same probability.
struct FixedModel {
    variant: ModelVariant,
    features: Vec<String>,
    probability: f64,
}

impl FixedModel {
    fn new(variant: ModelVariant, probability: f64) -> Self {
        Self {
            variant,
            features: crate::scoring::features::feature_names(variant)
                .into_iter()
                .map(str::to_string)
                .collect(),
            probability,
        }
    }
}

impl ScoringModel for FixedModel {
    fn variant(&self) -> ModelVariant {
        self.variant
    }

    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn decision_threshold(&self) -> f64 {
        0.5
    }

    fn predict(&self, _features: &[f64]) -> Result<Prediction, ScoringError> {
        Ok(Prediction {
            raw: 0.0,
            probability: self.probability,
        })
    }
}

#[test]
fn bureau_scenario_routes_to_bureau_model() {
    let service = service();
    let assessment = service
        .assess_json(&scenario_payload(json!({"loanWithDelay": 0, "loanNoDelay": 0})))
        .expect("scores");

    assert_eq!(assessment.variant(), ModelVariant::Bureau);
    assert!((assessment.score.probability - 0.437_823_499).abs() < 1e-6);
    assert!(!assessment.decision());
    assert_eq!(assessment.grade, Grade::D);
    assert_eq!(assessment.page(), ResultPage::Reject);
}

#[test]
fn missing_bureau_routes_to_no_bureau_model() {
    let service = service();
    let assessment = service
        .assess_json(&scenario_payload(json!(null)))
        .expect("absent bureau still scores");

    assert_eq!(assessment.variant(), ModelVariant::NoBureau);
    assert!((assessment.score.score + 0.6).abs() < 1e-9);
    assert_eq!(assessment.grade, Grade::E);
}

#[test]
fn strong_applicant_is_approved_with_top_grade() {
    let assessment = service().assess(&strong_record()).expect("scores");

    assert!(assessment.decision());
    assert_eq!(assessment.grade, Grade::A);
    assert_eq!(assessment.page(), ResultPage::Approve);
}

#[test]
fn decision_uses_model_threshold_inclusively() {
    let service = service_with(&[Arc::new(FixedModel::new(ModelVariant::NoBureau, 0.5))]);
    let assessment = service.assess(&scenario_record(None)).expect("scores");
    assert!(assessment.decision());
    assert_eq!(assessment.grade, Grade::D);
}

#[test]
fn never_cross_routes_when_a_variant_is_missing() {
    let service = service_with(&[Arc::new(FixedModel::new(ModelVariant::NoBureau, 0.9))]);

    let err = service
        .assess(&scenario_record(empty_bureau()))
        .expect_err("bureau model missing");
    assert_eq!(
        err,
        ScoringError::ModelUnavailable {
            variant: ModelVariant::Bureau
        }
    );

    let assessment = service.assess(&scenario_record(None)).expect("other slot works");
    assert_eq!(assessment.variant(), ModelVariant::NoBureau);
}

#[test]
fn routing_follows_bureau_presence_for_every_model_pairing() {
    let service = service_with(&[
        Arc::new(FixedModel::new(ModelVariant::Bureau, 0.9)),
        Arc::new(FixedModel::new(ModelVariant::NoBureau, 0.1)),
    ]);

    for bureau in [empty_bureau(), strong_record().bureau] {
        let assessment = service.assess(&scenario_record(bureau)).expect("scores");
        assert_eq!(assessment.variant(), ModelVariant::Bureau);
        assert_eq!(assessment.score.probability, 0.9);
    }
    let assessment = service.assess(&scenario_record(None)).expect("scores");
    assert_eq!(assessment.variant(), ModelVariant::NoBureau);
    assert_eq!(assessment.score.probability, 0.1);
}

#[test]
fn mismatched_model_shape_is_a_scoring_error() {
    let narrow = TreeEnsemble::from_json(
        r#"{
            "variant": "no_bureau",
            "features": ["age"],
            "decision_threshold": 0.5,
            "trees": [{"nodes": [{"leaf": 0.0}]}]
        }"#,
        ModelVariant::NoBureau,
    )
    .expect("narrow artifact parses");
    let service = service_with(&[Arc::new(narrow)]);

    let err = service
        .assess(&scenario_record(None))
        .expect_err("shape mismatch");
    assert!(matches!(
        err,
        ScoringError::ShapeMismatch {
            variant: ModelVariant::NoBureau,
            expected: 1,
            ..
        }
    ));
}

#[test]
fn out_of_range_probability_is_rejected() {
    let service = service_with(&[Arc::new(FixedModel::new(ModelVariant::NoBureau, 1.2))]);
    let err = service
        .assess(&scenario_record(None))
        .expect_err("invalid probability");
    assert!(matches!(err, ScoringError::InvalidOutput { .. }));
}

#[test]
fn validation_failures_surface_before_scoring() {
    let service = service_with(&[]);
    let mut payload = scenario_payload(json!(null));
    payload.as_object_mut().expect("object").remove("age");

    match service.assess_json(&payload) {
        Err(LoanScoringError::Validation(error)) => {
            assert_eq!(error.fields().collect::<Vec<_>>(), vec!["age"]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn identical_submissions_are_idempotent() {
    let service = service();
    let payload = scenario_payload(json!({"loanWithDelay": 2, "loanNoDelay": 1}));

    let first = service.assess_json(&payload).expect("scores");
    let second = service.assess_json(&payload).expect("scores");
    assert_eq!(first, second);
    assert_eq!(first.score.probability.to_bits(), second.score.probability.to_bits());
}
