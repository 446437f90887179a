//! API error responses — `{ "error": string }` bodies with status mapping.
//!
//! Only validation, gateway, and session-lookup failures are user-visible.
//! Schema-nonconforming model output never reaches this layer: the
//! normalizer absorbs it into a fallback record.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::triage::{GatewayError, SessionLookupError, ValidationError, ViewErrorKind};

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Session(#[from] SessionLookupError),
    #[error("result view unavailable")]
    View(ViewErrorKind),
}

impl From<ViewErrorKind> for ApiError {
    fn from(kind: ViewErrorKind) -> Self {
        Self::View(kind)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(error) => (StatusCode::BAD_REQUEST, error.to_string()),
            ApiError::Gateway(error) => {
                tracing::error!(error = %error, "inference gateway failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "We couldn't reach Herb right now. Please try again.".to_string(),
                )
            }
            ApiError::Session(error) => session_response(error),
            ApiError::View(kind) => view_response(*kind),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

fn session_response(error: &SessionLookupError) -> (StatusCode, String) {
    match error {
        SessionLookupError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            "That diagnosis session expired. Please start a new assessment.".to_string(),
        ),
        SessionLookupError::Corrupted(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "We couldn't load those results. Please start a new assessment.".to_string(),
        ),
        SessionLookupError::MissingId => (
            StatusCode::BAD_REQUEST,
            "We couldn't find that diagnosis session. Please start a new assessment."
                .to_string(),
        ),
        SessionLookupError::LockPoisoned => {
            tracing::error!("session store lock poisoned");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal error occurred".to_string(),
            )
        }
    }
}

fn view_response(kind: ViewErrorKind) -> (StatusCode, String) {
    match kind {
        ViewErrorKind::NotFound => session_response(&SessionLookupError::NotFound(String::new())),
        ViewErrorKind::Corrupted => {
            session_response(&SessionLookupError::Corrupted(String::new()))
        }
        ViewErrorKind::MissingCaseId => session_response(&SessionLookupError::MissingId),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_error(response: Response) -> (StatusCode, String) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 4096).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, json["error"].as_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn validation_error_is_400_with_message() {
        let response = ApiError::from(ValidationError::EmptyNarrative).into_response();
        let (status, error) = body_error(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error.contains("describe your symptoms"));
    }

    #[tokio::test]
    async fn gateway_errors_are_502_and_generic() {
        for error in [
            GatewayError::Connect("http://localhost:1".into()),
            GatewayError::Timeout(60),
            GatewayError::EmptyResponse,
            GatewayError::Http {
                status: 500,
                body: "secret upstream detail".into(),
            },
        ] {
            let response = ApiError::from(error).into_response();
            let (status, message) = body_error(response).await;
            assert_eq!(status, StatusCode::BAD_GATEWAY);
            // Upstream detail never leaks to the caller.
            assert_eq!(message, "We couldn't reach Herb right now. Please try again.");
        }
    }

    #[tokio::test]
    async fn session_not_found_is_404() {
        let response =
            ApiError::from(SessionLookupError::NotFound("abc".into())).into_response();
        let (status, message) = body_error(response).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(message.contains("expired"));
    }

    #[tokio::test]
    async fn session_corrupted_is_422() {
        let response =
            ApiError::from(SessionLookupError::Corrupted("abc".into())).into_response();
        let (status, _) = body_error(response).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn missing_case_id_is_400() {
        let response = ApiError::from(ViewErrorKind::MissingCaseId).into_response();
        let (status, message) = body_error(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("find that diagnosis session"));
    }

    #[tokio::test]
    async fn view_kinds_match_session_mapping() {
        let via_view = body_error(ApiError::from(ViewErrorKind::NotFound).into_response()).await;
        let via_session =
            body_error(ApiError::from(SessionLookupError::NotFound("x".into())).into_response())
                .await;
        assert_eq!(via_view, via_session);
    }

    #[tokio::test]
    async fn lock_poison_hides_details() {
        let response = ApiError::from(SessionLookupError::LockPoisoned).into_response();
        let (status, message) = body_error(response).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "An internal error occurred");
    }
}
