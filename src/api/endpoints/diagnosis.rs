//! Diagnosis intake and result endpoints — the two halves of the pipeline.
//!
//! `submit` drives intake → inference → normalization → care routing →
//! session store and answers with the finished record. `result` is the
//! display read path: it reconstructs the stored case by id.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::{DiagnosisRecord, EncodedImage};
use crate::triage::{
    cancel_pair, intake, normalize_response, routing, CaseSession, ResultViewState,
    SpecialtyRoute, ViewErrorKind,
};

/// Intake wire shape, as posted by the browser form.
#[derive(Debug, Deserialize)]
pub struct DiagnosisSubmission {
    #[serde(default)]
    pub symptoms: String,
    #[serde(default)]
    pub images: Vec<EncodedImage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResponse {
    pub case_id: String,
    pub analysis: DiagnosisRecord,
    pub route: SpecialtyRoute,
}

/// `POST /api/diagnosis` — run one submission through the full pipeline.
pub async fn submit(
    State(ctx): State<ApiContext>,
    Json(submission): Json<DiagnosisSubmission>,
) -> Result<Json<DiagnosisResponse>, ApiError> {
    let request = intake::build_request_preencoded(&submission.symptoms, submission.images)?;

    // Dropping the handle (client disconnect drops this future) aborts the
    // outbound inference call instead of leaking it.
    let (_cancel_handle, cancel) = cancel_pair();
    let raw = ctx.inference.diagnose(&request, &cancel).await?;

    let analysis = normalize_response(&raw);
    let route = routing::route(&analysis);
    let case_id = ctx.store.create(&request.narrative, &analysis, &route)?;

    tracing::info!(
        %case_id,
        emergency = analysis.emergency,
        care_route = %route.label,
        "diagnosis complete"
    );

    Ok(Json(DiagnosisResponse {
        case_id,
        analysis,
        route,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ResultQuery {
    pub case: Option<String>,
}

/// `GET /api/diagnosis/result?case=<id>` — display read path.
pub async fn result(
    State(ctx): State<ApiContext>,
    Query(query): Query<ResultQuery>,
) -> Result<Json<CaseSession>, ApiError> {
    match ResultViewState::resolve(query.case.as_deref(), &ctx.store) {
        ResultViewState::Ready(session) => Ok(Json(session)),
        ResultViewState::Error(kind) => Err(kind.into()),
        // resolve() always lands in a terminal state; treat the impossible
        // as a missing id rather than panicking.
        ResultViewState::Loading => Err(ViewErrorKind::MissingCaseId.into()),
    }
}
