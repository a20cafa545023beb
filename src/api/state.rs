//! Application state for the Leave Engine API.

use std::sync::Arc;

use crate::engine::LeaveEngine;

/// Shared application state.
///
/// Holds the engine every handler operates on.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<LeaveEngine>,
}

impl AppState {
    /// Creates a new application state around an engine.
    pub fn new(engine: Arc<LeaveEngine>) -> Self {
        Self { engine }
    }

    /// Returns the engine.
    pub fn engine(&self) -> &LeaveEngine {
        &self.engine
    }
}
