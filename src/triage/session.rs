//! Case session store — ephemeral per-submission records for the display step.
//!
//! Server-side stand-in for the browser's session storage: an in-memory map
//! of JSON payloads keyed by `"case-" + caseId`. One writer (the submission
//! flow, once) and one reader (the display flow) per key; entries are never
//! mutated after creation and die with the process.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::routing::{self, SpecialtyRoute};
use crate::models::DiagnosisRecord;

const CASE_KEY_PREFIX: &str = "case-";

/// Failures on the session read path.
#[derive(Debug, thiserror::Error)]
pub enum SessionLookupError {
    #[error("No diagnosis session stored under case id \"{0}\"")]
    NotFound(String),

    #[error("Stored diagnosis for case \"{0}\" is corrupted")]
    Corrupted(String),

    #[error("No case identifier was supplied")]
    MissingId,

    #[error("Internal lock error")]
    LockPoisoned,
}

/// One finished submission, reconstructed for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSession {
    pub case_id: String,
    /// RFC-3339 UTC timestamp.
    pub generated_at: String,
    pub narrative: String,
    #[serde(rename = "analysis")]
    pub diagnosis: DiagnosisRecord,
    pub route: SpecialtyRoute,
}

/// Persisted value shape. `analysis` stays a raw JSON value so a structurally
/// invalid payload is detected on read instead of crashing it.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredCase {
    generated_at: String,
    narrative: String,
    #[serde(default)]
    analysis: Option<Value>,
    #[serde(default)]
    route: Option<SpecialtyRoute>,
}

/// In-memory case session store. Write-once per key.
pub struct CaseSessionStore {
    cases: Mutex<HashMap<String, String>>,
}

impl CaseSessionStore {
    pub fn new() -> Self {
        Self {
            cases: Mutex::new(HashMap::new()),
        }
    }

    /// Store a finished submission under a fresh case id.
    pub fn create(
        &self,
        narrative: &str,
        diagnosis: &DiagnosisRecord,
        route: &SpecialtyRoute,
    ) -> Result<String, SessionLookupError> {
        let case_id = Uuid::new_v4().to_string();
        let stored = StoredCase {
            generated_at: chrono::Utc::now().to_rfc3339(),
            narrative: narrative.to_string(),
            analysis: Some(
                serde_json::to_value(diagnosis).expect("serializing a diagnosis cannot fail"),
            ),
            route: Some(route.clone()),
        };
        let payload =
            serde_json::to_string(&stored).expect("serializing a case session cannot fail");

        let mut cases = self
            .cases
            .lock()
            .map_err(|_| SessionLookupError::LockPoisoned)?;
        cases.insert(storage_key(&case_id), payload);

        tracing::info!(%case_id, "case session stored");
        Ok(case_id)
    }

    /// Look up a case by id. Idempotent; recomputes the route for legacy
    /// records that were stored without one.
    pub fn read(&self, case_id: &str) -> Result<CaseSession, SessionLookupError> {
        let payload = {
            let cases = self
                .cases
                .lock()
                .map_err(|_| SessionLookupError::LockPoisoned)?;
            cases.get(&storage_key(case_id)).cloned()
        }
        .ok_or_else(|| SessionLookupError::NotFound(case_id.to_string()))?;

        let stored: StoredCase = serde_json::from_str(&payload)
            .map_err(|_| SessionLookupError::Corrupted(case_id.to_string()))?;

        let analysis = stored
            .analysis
            .ok_or_else(|| SessionLookupError::Corrupted(case_id.to_string()))?;
        let diagnosis: DiagnosisRecord = serde_json::from_value(analysis)
            .map_err(|_| SessionLookupError::Corrupted(case_id.to_string()))?;

        let route = match stored.route {
            Some(route) => route,
            None => {
                tracing::debug!(%case_id, "legacy record without route, recomputing");
                routing::route(&diagnosis)
            }
        };

        Ok(CaseSession {
            case_id: case_id.to_string(),
            generated_at: stored.generated_at,
            narrative: stored.narrative,
            diagnosis,
            route,
        })
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.cases.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all sessions. Shutdown hygiene only — never called per-case.
    pub fn clear(&self) {
        if let Ok(mut cases) = self.cases.lock() {
            cases.clear();
        }
    }

    /// Insert a raw payload under a given case id, bypassing `create`.
    #[cfg(test)]
    fn insert_raw(&self, case_id: &str, payload: &str) {
        self.cases
            .lock()
            .unwrap()
            .insert(storage_key(case_id), payload.to_string());
    }
}

impl Default for CaseSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn storage_key(case_id: &str) -> String {
    format!("{CASE_KEY_PREFIX}{case_id}")
}
