pub mod api;
pub mod config;
pub mod models;
pub mod triage;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::types::ApiContext;
use crate::config::Config;
use crate::triage::{CaseSessionStore, GeminiClient};

/// Initialize tracing from RUST_LOG, falling back to the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Wire the production API context from configuration.
pub fn build_context(config: &Config) -> ApiContext {
    ApiContext::new(
        Arc::new(GeminiClient::from_config(config)),
        Arc::new(CaseSessionStore::new()),
    )
}
