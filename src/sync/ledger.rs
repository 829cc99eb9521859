use crate::session::AdminGrant;
use crate::types::Alert;

/// Alerts in ledger order: newest arrival first, which is not necessarily `created_at` order.
///
/// Acknowledgment is one-directional. Entries are never deduplicated, so an id resent by
/// the server appears once per arrival.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertLedger {
    alerts: Vec<Alert>,
}

impl AlertLedger {
    pub fn new(alerts: Vec<Alert>) -> Self {
        Self { alerts }
    }

    pub fn list(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn unacknowledged_count(&self) -> usize {
        self.alerts.iter().filter(|a| !a.acknowledged).count()
    }

    pub fn get(&self, id: &str) -> Option<&Alert> {
        self.alerts.iter().find(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub(crate) fn replace(&mut self, alerts: Vec<Alert>) {
        self.alerts = alerts;
    }

    /// Puts `incoming` ahead of everything already held, keeping its internal order
    pub(crate) fn prepend(&mut self, incoming: Vec<Alert>) {
        if incoming.is_empty() {
            return;
        }
        let mut alerts = incoming;
        alerts.append(&mut self.alerts);
        self.alerts = alerts;
    }

    /// Flips every unacknowledged entry carrying `id`. Returns whether anything changed.
    pub(crate) fn mark_acknowledged(&mut self, _grant: AdminGrant<'_>, id: &str) -> bool {
        let mut flipped = false;
        for alert in self.alerts.iter_mut().filter(|a| a.id == id && !a.acknowledged) {
            alert.acknowledged = true;
            flipped = true;
        }
        flipped
    }
}
