use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::error;

use super::normalizer::ValidationError;
use super::pages::{Page, PageContext, PageError, PageRenderer};
use super::scorer::ScoringError;
use super::service::{LoanScoringError, LoanScoringService};

/// Shared, read-only dependencies of the scoring routes.
#[derive(Clone)]
pub struct ScoringState {
    pub service: Arc<LoanScoringService>,
    pub pages: Arc<dyn PageRenderer>,
}

/// Router exposing the applicant form flow and the JSON decision API.
pub fn scoring_router(service: Arc<LoanScoringService>, pages: Arc<dyn PageRenderer>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/home", get(home_handler))
        .route("/predict", post(predict_handler))
        .route("/apiTest", post(decision_handler))
        .route("/api/v1/loan/score", post(score_handler))
        .with_state(ScoringState { service, pages })
}

pub(crate) async fn root_handler() -> Redirect {
    Redirect::temporary("/home")
}

pub(crate) async fn home_handler(State(state): State<ScoringState>) -> Response {
    render(&*state.pages, Page::ApplicationForm, PageContext::default())
}

pub(crate) async fn predict_handler(State(state): State<ScoringState>, request: Request) -> Response {
    let fields = match read_form_fields(request).await {
        Ok(fields) => fields,
        Err(err) => return validation_response(&err),
    };

    match state.service.assess_form(&fields) {
        Ok(assessment) => render(
            &*state.pages,
            assessment.page().into(),
            PageContext {
                grade: Some(assessment.grade),
            },
        ),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn decision_handler(
    State(state): State<ScoringState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return validation_response(&ValidationError::single("body", rejection.body_text()))
        }
    };

    match state.service.assess_json(&payload) {
        Ok(assessment) => (
            StatusCode::OK,
            Json(json!({ "LoanDecision": assessment.decision() })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn score_handler(
    State(state): State<ScoringState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return validation_response(&ValidationError::single("body", rejection.body_text()))
        }
    };

    match state.service.assess_json(&payload) {
        Ok(assessment) => {
            let body = json!({
                "variant": assessment.variant(),
                "score": assessment.score.score,
                "probability": assessment.score.probability,
                "decision": assessment.decision(),
                "grade": assessment.grade,
                "page": assessment.page(),
                "scoredAt": Utc::now().to_rfc3339(),
            });
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => error_response(err),
    }
}

/// Collects a browser form posted either urlencoded or as `multipart/form-data`.
async fn read_form_fields(request: Request) -> Result<HashMap<String, String>, ValidationError> {
    let multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        });

    if !multipart {
        return Form::<HashMap<String, String>>::from_request(request, &())
            .await
            .map(|Form(fields)| fields)
            .map_err(|rejection| ValidationError::single("body", rejection.body_text()));
    }

    let mut parts = Multipart::from_request(request, &())
        .await
        .map_err(|rejection| ValidationError::single("body", rejection.body_text()))?;

    let mut fields = HashMap::new();
    while let Some(field) = parts
        .next_field()
        .await
        .map_err(|err| ValidationError::single("body", err.body_text()))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let value = field
            .text()
            .await
            .map_err(|err| ValidationError::single(name.clone(), err.body_text()))?;
        fields.insert(name, value);
    }
    Ok(fields)
}

fn render(pages: &dyn PageRenderer, page: Page, context: PageContext) -> Response {
    match pages.render(page, &context) {
        Ok(html) => Html(html).into_response(),
        Err(err) => page_error_response(err),
    }
}

fn page_error_response(err: PageError) -> Response {
    error!(error = %err, "page rendering failed");
    let payload = json!({ "error": "unable to render page" });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}

pub(crate) fn validation_response(err: &ValidationError) -> Response {
    let payload = json!({
        "error": err.summary(),
        "detail": err.issues,
    });
    (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
}

pub(crate) fn error_response(err: LoanScoringError) -> Response {
    match err {
        LoanScoringError::Validation(err) => validation_response(&err),
        LoanScoringError::Scoring(err @ ScoringError::ModelUnavailable { .. }) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::SERVICE_UNAVAILABLE, Json(payload)).into_response()
        }
        LoanScoringError::Scoring(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
