use crate::infrastructure::TaskManager;
use crate::interaction::InteractionModeController;
use crate::session::SessionContext;

/// Consolidated mutable state for FleetClient
/// Using a single struct reduces lock contention
pub struct ClientState {
    /// The authenticated user, if any
    pub session: Option<SessionContext>,

    /// Armed-click placement state
    pub interaction: InteractionModeController,

    /// Task feeding push frames into the reconciler
    pub frame_pump: TaskManager,
}

impl ClientState {
    pub fn new() -> Self {
        Self {
            session: None,
            interaction: InteractionModeController::new(),
            frame_pump: TaskManager::new(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }
}

impl Default for ClientState {
    fn default() -> Self {
        Self::new()
    }
}
