//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the execution gateway; the gateway owns a clone of the scheduler
//! that the tick loop also drives.

use std::sync::Arc;

use crate::gateway::ExecutionGateway;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; the gateway is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ExecutionGateway>,
}

impl AppState {
    #[must_use]
    pub fn new(gateway: ExecutionGateway) -> Self {
        Self { gateway: Arc::new(gateway) }
    }
}
