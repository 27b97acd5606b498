pub mod config;
pub mod handlers;
pub mod models;
pub mod notifications;
pub mod orchestrator;
pub mod presentation;
pub mod services;
pub mod startup;
pub mod state;

use orchestrator::LifecycleOrchestrator;
use state::PortalRegistry;
use std::sync::Arc;

/// Shared application state: the lifecycle orchestrator and the per-session
/// portal instances. No ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<LifecycleOrchestrator>,
    pub portals: PortalRegistry,
}

impl AppState {
    pub fn new(orchestrator: Arc<LifecycleOrchestrator>) -> Self {
        Self {
            orchestrator,
            portals: PortalRegistry::new(),
        }
    }
}
