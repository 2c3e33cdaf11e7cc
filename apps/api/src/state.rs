use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::errors::AppError;
use crate::llm_client::CompletionClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    /// `None` when no OpenRouter credential is configured.
    pub llm: Option<Arc<dyn CompletionClient>>,
    pub config: Config,
}

impl AppState {
    /// The completion client, or a configuration error when the credential is missing.
    pub fn llm(&self) -> Result<&dyn CompletionClient, AppError> {
        self.llm.as_deref().ok_or_else(|| {
            AppError::Configuration("OPENROUTER_API_KEY not set in environment".to_string())
        })
    }
}
