//! Diagnosis request builder — validates and assembles the outbound request.

use futures_util::future;

use super::encode::encode_image;
use crate::models::{DiagnosisRequest, EncodedImage, ImageAttachment};

/// Bad caller input. Recoverable — the user is re-prompted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please describe your symptoms or attach at least one photo before submitting")]
    EmptyNarrative,
}

/// Build a request from a raw narrative plus raw attachments.
///
/// The narrative is trimmed; submission is rejected only when the trimmed
/// narrative is empty AND no attachment is present. Attachments encode
/// concurrently and are collected in original order.
pub async fn build_request(
    narrative: &str,
    attachments: Vec<ImageAttachment>,
) -> Result<DiagnosisRequest, ValidationError> {
    let narrative = narrative.trim();
    if narrative.is_empty() && attachments.is_empty() {
        return Err(ValidationError::EmptyNarrative);
    }

    let images = future::join_all(
        attachments
            .into_iter()
            .map(|attachment| async move { encode_image(attachment) }),
    )
    .await;

    Ok(DiagnosisRequest {
        narrative: narrative.to_string(),
        images,
    })
}

/// Build a request from images the browser already encoded.
/// Same narrative rule as [`build_request`]; the encoded payloads pass
/// through verbatim.
pub fn build_request_preencoded(
    narrative: &str,
    images: Vec<EncodedImage>,
) -> Result<DiagnosisRequest, ValidationError> {
    let narrative = narrative.trim();
    if narrative.is_empty() && images.is_empty() {
        return Err(ValidationError::EmptyNarrative);
    }

    Ok(DiagnosisRequest {
        narrative: narrative.to_string(),
        images,
    })
}
