//! Shared application state for the Waggle API server.

use std::sync::Arc;

use waggle_core::{SocialStore, TickDriver};

/// State shared by all API handlers.
pub struct ApiState {
    /// The round driver the trigger endpoint pokes.
    pub driver: Arc<TickDriver>,
    /// The store backing the notification read side.
    pub store: Arc<dyn SocialStore>,
    /// Shared-secret token required by `POST /api/tick`.
    pub trigger_token: String,
}

impl ApiState {
    /// Assemble state around a driver.
    pub fn new(driver: Arc<TickDriver>, trigger_token: &str) -> Self {
        let store = driver.scheduler().store();
        Self {
            driver,
            store,
            trigger_token: trigger_token.to_owned(),
        }
    }
}
