//! Response validator/normalizer — repairs raw model output into a
//! canonical [`DiagnosisRecord`].
//!
//! The inference service is non-deterministic and occasionally violates its
//! output contract. This boundary absorbs every violation: whatever text
//! comes in, a structurally valid record comes out, and nothing is thrown.
//! When structured extraction fails the raw text is preserved verbatim in
//! `summary`, so no information is silently dropped.

use serde_json::Value;

use crate::models::DiagnosisRecord;

/// Canonical envelope key. The model has returned both shapes — fields
/// nested under "analysis" and flattened at the top level — and this
/// boundary unifies them under the envelope.
const ENVELOPE_KEY: &str = "analysis";

pub const FALLBACK_CARE_LEVEL: &str = "Unknown";
pub const FALLBACK_FOLLOW_UP: &str = "Unable to parse structured details.";

/// Normalize raw model output. Total — never fails outward.
///
/// - Valid canonical record (enveloped or top-level) → returned as-is.
/// - Anything else → fallback record wrapping the raw text.
pub fn normalize_response(raw: &str) -> DiagnosisRecord {
    match parse_record(raw) {
        Some(record) => record,
        None => {
            tracing::warn!(
                raw_len = raw.len(),
                "model output failed structured parse, falling back to raw summary"
            );
            fallback_record(raw)
        }
    }
}

/// Fallback record for unparseable output.
pub fn fallback_record(raw: &str) -> DiagnosisRecord {
    DiagnosisRecord {
        summary: raw.to_string(),
        emergency: false,
        emergency_reason: String::new(),
        conditions: vec![],
        recommended_care_level: FALLBACK_CARE_LEVEL.to_string(),
        follow_up: Some(FALLBACK_FOLLOW_UP.to_string()),
        self_care_tips: vec![],
    }
}

fn parse_record(raw: &str) -> Option<DiagnosisRecord> {
    let value: Value = serde_json::from_str(strip_code_fences(raw)).ok()?;
    let object = value.as_object()?;

    // Re-wrap: prefer the canonical envelope, else treat the top level as
    // the record itself. Field values are never altered.
    let payload = match object.get(ENVELOPE_KEY) {
        Some(inner) if inner.is_object() => inner.clone(),
        _ => value,
    };

    serde_json::from_value(payload).ok()
}

/// Strip a Markdown code fence the model sometimes wraps its JSON in.
/// Text without a fence passes through untouched.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    match rest.rfind("```") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}
