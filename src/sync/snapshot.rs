use super::ledger::AlertLedger;
use crate::types::{Bin, DashboardStats, FleetError, Result, RouteOptimization};
use std::collections::HashSet;

/// Immutable view of the canonical collections at one revision
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FleetSnapshot {
    pub bins: Vec<Bin>,
    pub alerts: AlertLedger,
    /// `None` until the first successful stats fetch
    pub stats: Option<DashboardStats>,
    /// Latest route optimization result, if one was requested
    pub route: Option<RouteOptimization>,
    /// Bumped on every canonical mutation
    pub revision: u64,
}

impl FleetSnapshot {
    pub fn bin(&self, id: &str) -> Option<&Bin> {
        self.bins.iter().find(|b| b.id == id)
    }
}

/// Checks the collection invariants: unique ids, fill level inside 0..=100
pub fn validate_bins(bins: &[Bin]) -> Result<()> {
    let mut seen = HashSet::with_capacity(bins.len());
    for bin in bins {
        if !seen.insert(bin.id.as_str()) {
            return Err(FleetError::InvalidSnapshot(format!(
                "duplicate bin id '{}'",
                bin.id
            )));
        }
        if !bin.has_valid_fill_level() {
            return Err(FleetError::InvalidSnapshot(format!(
                "bin '{}' has fill level {} outside 0..=100",
                bin.id, bin.fill_level
            )));
        }
    }
    Ok(())
}
