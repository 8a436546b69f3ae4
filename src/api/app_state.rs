use crate::classifier::Classifier;
use crate::observability::AppMetrics;
use crate::services::chat::ChatService;
use crate::services::session::SessionService;
use std::sync::Arc;

/// Application state shared by all handlers
#[derive(Clone)]
pub struct AppState {
    /// Session store
    pub session_service: Arc<dyn SessionService>,
    /// Chat orchestration (classifier + knowledge lookup)
    pub chat_service: Arc<dyn ChatService>,
    /// Keyword classifier for stateless classification
    pub classifier: Arc<Classifier>,
    /// Application metrics
    pub metrics: Arc<AppMetrics>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("session_service", &"Arc<dyn SessionService>")
            .field("chat_service", &"Arc<dyn ChatService>")
            .field("classifier", &self.classifier.category_names())
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl AppState {
    /// Create new application state
    pub fn new(
        session_service: Arc<dyn SessionService>,
        chat_service: Box<dyn ChatService>,
        classifier: Arc<Classifier>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            session_service,
            chat_service: Arc::from(chat_service),
            classifier,
            metrics,
        }
    }
}
