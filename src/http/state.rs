use crate::session::SessionHandle;

/// Shared application state for HTTP handlers
///
/// Handlers only hold the orchestrator handle; all session state lives
/// behind it.
#[derive(Clone)]
pub struct AppState {
    pub session: SessionHandle,
}

impl AppState {
    pub fn new(session: SessionHandle) -> Self {
        Self { session }
    }
}
