// Sync module - canonical fleet state and the alert ledger
mod ledger;
mod reconciler;
mod snapshot;

pub use ledger::AlertLedger;
pub use reconciler::StateReconciler;
pub use snapshot::{FleetSnapshot, validate_bins};
