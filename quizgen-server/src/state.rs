//! Application state shared across all request handlers.

use crate::config::runtime::{ConfigSections, SharedConfig};
use quizgen_core::framework::FunctionService;
use quizgen_core::realtime::RealtimeBroker;
use quizgen_core::speech_cache::SpeechCache;
use std::sync::Arc;

/// Application state that is shared across all request handlers.
///
/// This is cloneable and cheap to pass around (everything is behind Arc).
#[derive(Clone)]
pub struct AppState {
    /// Runtime configuration (can be reloaded via SIGHUP).
    pub config: SharedConfig,
    /// Outbound HTTP client, shared so connections are pooled.
    pub http: reqwest::Client,
    pub speech_cache: Arc<SpeechCache>,
}

impl AppState {
    pub fn new(sections: ConfigSections, http: reqwest::Client) -> Self {
        let speech_cache = Arc::new(SpeechCache::new(&sections.speech));
        Self {
            config: SharedConfig::new(sections),
            http,
            speech_cache,
        }
    }

    /// Function service client bound to the current configuration.
    pub async fn functions(&self) -> FunctionService {
        let config = self.config.function_service().await.clone();
        FunctionService::new(self.http.clone(), config)
    }

    /// Realtime broker bound to the current configuration.
    pub async fn broker(&self) -> RealtimeBroker {
        RealtimeBroker::new(self.config.pubsub().await.clone())
    }

    /// Swap in a freshly loaded configuration.
    pub async fn reload(&self, sections: ConfigSections) {
        self.speech_cache.reconfigure(&sections.speech).await;
        self.config.update_all(sections).await;
    }
}
