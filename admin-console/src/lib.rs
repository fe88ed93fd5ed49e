pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod session;
pub mod startup;

use services::api_client::ApiClient;
use session::{Clock, SystemClock};
use std::sync::Arc;

/// Shared application state: the platform API client and the wall clock
/// used for ban-window checks.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<ApiClient>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self {
            api,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(api: Arc<ApiClient>, clock: Arc<dyn Clock>) -> Self {
        Self { api, clock }
    }
}
