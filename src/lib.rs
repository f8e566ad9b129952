pub mod api;
pub mod auth;
pub mod cloudcode;
pub mod config;
pub mod error;
pub mod net;

use std::sync::Arc;

use crate::cloudcode::CloudCodeClient;
use crate::config::Config;

/// Shared application state accessible from all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: Arc<CloudCodeClient>,
}

impl AppState {
    pub fn new(config: Config, client: CloudCodeClient) -> Self {
        Self {
            config: Arc::new(config),
            client: Arc::new(client),
        }
    }
}
