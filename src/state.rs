use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::db::DatabaseProxy;
use crate::services::feedback::FeedbackComposer;
use crate::services::provider::{AiConfig, ProviderRouter};
use crate::services::question_gen::QuestionGenerator;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    db_proxy: Option<Arc<DatabaseProxy>>,
    provider_router: Arc<ProviderRouter>,
    question_generator: Arc<QuestionGenerator>,
    feedback_composer: Arc<FeedbackComposer>,
}

impl AppState {
    pub fn new(db_proxy: Option<Arc<DatabaseProxy>>, ai_config: AiConfig) -> Self {
        let provider_router = Arc::new(ProviderRouter::new(ai_config));
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            db_proxy,
            question_generator: Arc::new(QuestionGenerator::new(Arc::clone(&provider_router))),
            feedback_composer: Arc::new(FeedbackComposer::new(Arc::clone(&provider_router))),
            provider_router,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn db_proxy(&self) -> Option<Arc<DatabaseProxy>> {
        self.db_proxy.clone()
    }

    pub fn provider_router(&self) -> Arc<ProviderRouter> {
        Arc::clone(&self.provider_router)
    }

    pub fn question_generator(&self) -> Arc<QuestionGenerator> {
        Arc::clone(&self.question_generator)
    }

    pub fn feedback_composer(&self) -> Arc<FeedbackComposer> {
        Arc::clone(&self.feedback_composer)
    }
}
