//! # API Context
//!
//! Shared state handed to every handler. All collaborators sit behind
//! trait objects so routers can be wired against in-memory fakes in
//! tests and real services in `main`.

use std::sync::Arc;

use hoverfly_persistence::MissionStore;

use crate::auth::AuthProvider;
use crate::config::Config;
use crate::realtime::Broadcaster;
use crate::services::analysis::ImageAnalyzer;
use crate::services::weather::WeatherProvider;

/// Shared application state.
#[derive(Clone)]
pub struct ApiContext {
    pub store: Arc<dyn MissionStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub analyzer: Arc<dyn ImageAnalyzer>,
    pub weather: Arc<dyn WeatherProvider>,
    pub broadcaster: Arc<Broadcaster>,
    pub config: Arc<Config>,
}

impl ApiContext {
    pub fn new(
        store: Arc<dyn MissionStore>,
        auth: Arc<dyn AuthProvider>,
        analyzer: Arc<dyn ImageAnalyzer>,
        weather: Arc<dyn WeatherProvider>,
        config: Config,
    ) -> Self {
        Self {
            store,
            auth,
            analyzer,
            weather,
            broadcaster: Arc::new(Broadcaster::new()),
            config: Arc::new(config),
        }
    }
}
