use std::sync::Arc;

use serde_json::{json, Value};

use crate::scoring::domain::{ApplicantRecord, BureauRecord, Education, Gender, Purpose};
use crate::scoring::model::{ModelRegistry, ScoringModel, TreeEnsemble};
use crate::scoring::service::LoanScoringService;
use crate::scoring::ModelVariant;

pub(crate) const BUREAU_ARTIFACT: &str = include_str!("../../../../../assets/model_bureau.json");
pub(crate) const NO_BUREAU_ARTIFACT: &str =
    include_str!("../../../../../assets/model_no_bureau.json");

pub(crate) fn bureau_model() -> TreeEnsemble {
    TreeEnsemble::from_json(BUREAU_ARTIFACT, ModelVariant::Bureau).expect("bureau artifact parses")
}

pub(crate) fn no_bureau_model() -> TreeEnsemble {
    TreeEnsemble::from_json(NO_BUREAU_ARTIFACT, ModelVariant::NoBureau)
        .expect("no-bureau artifact parses")
}

pub(crate) fn registry() -> ModelRegistry {
    ModelRegistry::new()
        .with_model(Arc::new(bureau_model()))
        .with_model(Arc::new(no_bureau_model()))
}

pub(crate) fn service() -> LoanScoringService {
    LoanScoringService::new(registry())
}

pub(crate) fn service_with(models: &[Arc<dyn ScoringModel>]) -> LoanScoringService {
    let registry = models
        .iter()
        .cloned()
        .fold(ModelRegistry::new(), ModelRegistry::with_model);
    LoanScoringService::new(registry)
}

/// The bureau example applicant from the API documentation.
pub(crate) fn scenario_payload(bureau: Value) -> Value {
    json!({
        "age": 20,
        "income": 1000000,
        "gender": "Male",
        "hasApplied": "Yes",
        "hasIncome": "Yes",
        "education": "Diploma",
        "purpose": "Working Capital",
        "bureau": bureau,
    })
}

pub(crate) fn scenario_record(bureau: Option<BureauRecord>) -> ApplicantRecord {
    ApplicantRecord {
        age: 20,
        income: 1_000_000.0,
        gender: Gender::Male,
        has_applied: true,
        has_income: true,
        education: Education::Diploma,
        purpose: Purpose::WorkingCapital,
        bureau,
    }
}

pub(crate) fn empty_bureau() -> Option<BureauRecord> {
    Some(BureauRecord {
        loan_with_delay: 0,
        loan_no_delay: 0,
    })
}

/// Established borrower with a clean repayment history.
pub(crate) fn strong_record() -> ApplicantRecord {
    ApplicantRecord {
        age: 40,
        income: 15_000_000.0,
        gender: Gender::Female,
        has_applied: true,
        has_income: true,
        education: Education::Master,
        purpose: Purpose::Investment,
        bureau: Some(BureauRecord {
            loan_with_delay: 0,
            loan_no_delay: 4,
        }),
    }
}

pub(crate) async fn read_json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub(crate) async fn read_text_body(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
