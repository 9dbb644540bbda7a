use scorecast_core::SimulationService;
use scorecast_env::FeedContext;
use std::sync::Arc;

/// Shared handler state: the one feed service for this process.
pub struct AppState<C: FeedContext> {
    service: Arc<SimulationService<C>>,
}

impl<C: FeedContext> AppState<C> {
    pub fn new(service: Arc<SimulationService<C>>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &SimulationService<C> {
        &self.service
    }
}

// Derive would demand `C: Clone`
impl<C: FeedContext> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}
