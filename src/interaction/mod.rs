// Interaction module - the armed-click placement state machine
mod mode;

pub use mode::{InteractionMode, InteractionModeController, PlacementCommand, PlacementKind};
