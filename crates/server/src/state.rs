use std::sync::Arc;

use secrecy::SecretString;

use tonecheck_core::clock::Clock;
use tonecheck_slack::WebhookRouter;

/// Shared by every request task; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub router: WebhookRouter,
    pub clock: Arc<dyn Clock>,
    pub signing_secret: SecretString,
    pub api_key: SecretString,
}

impl AppState {
    pub fn new(
        router: WebhookRouter,
        clock: Arc<dyn Clock>,
        signing_secret: SecretString,
        api_key: SecretString,
    ) -> Self {
        Self { router, clock, signing_secret, api_key }
    }
}
