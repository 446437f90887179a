//! Result-display state machine, driven by the case session store.
//!
//! `Loading` is the initial state; one `resolve` call lands in a terminal
//! state (`Ready` or `Error`) and stays there. There is no automatic retry —
//! the only recovery path is a fresh submission with a new case id.

use serde::Serialize;

use super::session::{CaseSession, CaseSessionStore, SessionLookupError};

/// Why the result view cannot be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewErrorKind {
    NotFound,
    Corrupted,
    MissingCaseId,
}

impl From<SessionLookupError> for ViewErrorKind {
    fn from(error: SessionLookupError) -> Self {
        match error {
            SessionLookupError::NotFound(_) => Self::NotFound,
            SessionLookupError::MissingId => Self::MissingCaseId,
            // Lock poisoning means the stored payload can no longer be
            // trusted; surface it the same way as a bad record.
            SessionLookupError::Corrupted(_) | SessionLookupError::LockPoisoned => {
                Self::Corrupted
            }
        }
    }
}

/// Display state for one result page load.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResultViewState {
    #[default]
    Loading,
    Error(ViewErrorKind),
    Ready(CaseSession),
}

impl ResultViewState {
    /// Resolve the state for an optional case id. Total: every input lands
    /// in a terminal state.
    pub fn resolve(case_id: Option<&str>, store: &CaseSessionStore) -> Self {
        let Some(case_id) = case_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return Self::Error(ViewErrorKind::MissingCaseId);
        };

        match store.read(case_id) {
            Ok(session) => Self::Ready(session),
            Err(error) => Self::Error(error.into()),
        }
    }

    /// Error and Ready are terminal; only Loading is not.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Loading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Condition, DiagnosisRecord};
    use crate::triage::routing::default_route;

    fn store_with_case() -> (CaseSessionStore, String) {
        let store = CaseSessionStore::new();
        let diagnosis = DiagnosisRecord {
            summary: "s".into(),
            emergency: false,
            emergency_reason: String::new(),
            conditions: vec![Condition {
                name: "Common cold".into(),
                probability: "High".into(),
                description: String::new(),
                recommended_actions: vec![],
                medications: vec![],
                prevention_tips: vec![],
            }],
            recommended_care_level: "Home care".into(),
            follow_up: None,
            self_care_tips: vec![],
        };
        let case_id = store
            .create("sore throat", &diagnosis, &default_route())
            .unwrap();
        (store, case_id)
    }

    #[test]
    fn initial_state_is_loading_and_not_terminal() {
        let state = ResultViewState::default();
        assert_eq!(state, ResultViewState::Loading);
        assert!(!state.is_terminal());
    }

    #[test]
    fn successful_read_is_ready() {
        let (store, case_id) = store_with_case();
        let state = ResultViewState::resolve(Some(&case_id), &store);
        match &state {
            ResultViewState::Ready(session) => assert_eq!(session.case_id, case_id),
            other => panic!("Expected Ready, got: {other:?}"),
        }
        assert!(state.is_terminal());
    }

    #[test]
    fn missing_id_is_terminal_error() {
        let (store, _) = store_with_case();
        let state = ResultViewState::resolve(None, &store);
        assert_eq!(state, ResultViewState::Error(ViewErrorKind::MissingCaseId));
        assert!(state.is_terminal());
    }

    #[test]
    fn blank_id_counts_as_missing() {
        let (store, _) = store_with_case();
        let state = ResultViewState::resolve(Some("   "), &store);
        assert_eq!(state, ResultViewState::Error(ViewErrorKind::MissingCaseId));
    }

    #[test]
    fn unknown_id_is_not_found() {
        let (store, _) = store_with_case();
        let state = ResultViewState::resolve(Some("nope"), &store);
        assert_eq!(state, ResultViewState::Error(ViewErrorKind::NotFound));
    }

    #[test]
    fn lookup_errors_map_to_view_kinds() {
        assert_eq!(
            ViewErrorKind::from(SessionLookupError::NotFound("x".into())),
            ViewErrorKind::NotFound
        );
        assert_eq!(
            ViewErrorKind::from(SessionLookupError::Corrupted("x".into())),
            ViewErrorKind::Corrupted
        );
        assert_eq!(
            ViewErrorKind::from(SessionLookupError::MissingId),
            ViewErrorKind::MissingCaseId
        );
        assert_eq!(
            ViewErrorKind::from(SessionLookupError::LockPoisoned),
            ViewErrorKind::Corrupted
        );
    }

    #[test]
    fn error_kinds_serialize_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ViewErrorKind::NotFound).unwrap(),
            "\"not-found\""
        );
        assert_eq!(
            serde_json::to_string(&ViewErrorKind::MissingCaseId).unwrap(),
            "\"missing-case-id\""
        );
        assert_eq!(
            serde_json::to_string(&ViewErrorKind::Corrupted).unwrap(),
            "\"corrupted\""
        );
    }

    #[test]
    fn resolving_twice_yields_the_same_terminal_state() {
        let (store, case_id) = store_with_case();
        let first = ResultViewState::resolve(Some(&case_id), &store);
        let second = ResultViewState::resolve(Some(&case_id), &store);
        assert_eq!(first, second);
    }
}
