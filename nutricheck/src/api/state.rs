use std::sync::Arc;

use crate::config::Config;
use crate::services::ClaimValidationService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub validation: ClaimValidationService,
}

impl AppState {
    pub fn new(config: Config, validation: ClaimValidationService) -> Self {
        Self {
            config: Arc::new(config),
            validation,
        }
    }
}
