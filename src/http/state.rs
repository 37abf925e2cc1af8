use crate::session::SupervisorHandle;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub supervisor: SupervisorHandle,
}

impl AppState {
    pub fn new(supervisor: SupervisorHandle) -> Self {
        Self { supervisor }
    }
}
