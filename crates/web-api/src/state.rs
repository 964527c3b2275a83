use std::sync::Arc;

use application::MessageRouter;
use config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub router: Arc<MessageRouter>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(router: Arc<MessageRouter>, config: Arc<AppConfig>) -> Self {
        Self { router, config }
    }
}
