//! Shared state for the API router.

use std::sync::Arc;

use crate::triage::{CaseSessionStore, InferenceClient};

/// Shared context for all API routes: the inference seam plus the
/// session-scoped case store.
#[derive(Clone)]
pub struct ApiContext {
    pub inference: Arc<dyn InferenceClient>,
    pub store: Arc<CaseSessionStore>,
}

impl ApiContext {
    pub fn new(inference: Arc<dyn InferenceClient>, store: Arc<CaseSessionStore>) -> Self {
        Self { inference, store }
    }
}
