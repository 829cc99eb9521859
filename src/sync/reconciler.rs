use super::ledger::AlertLedger;
use super::snapshot::{FleetSnapshot, validate_bins};
use crate::api::FleetApi;
use crate::infrastructure::TaskManager;
use crate::session::AdminGrant;
use crate::types::{BinUpdate, FleetError, PushFrame, Result, RouteOptimization};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{RwLock, watch};

/// Canonical state plus, per collection, the ticket of the write that produced it.
///
/// A fetch takes its ticket when it starts. Its payload is only applied if no write
/// with a later ticket has landed on that collection in the meantime.
#[derive(Default)]
struct Canonical {
    snapshot: Arc<FleetSnapshot>,
    bins_ticket: u64,
    alerts_ticket: u64,
    stats_ticket: u64,
    route_ticket: u64,
}

#[derive(Clone, Copy)]
enum Collection {
    Bins,
    Alerts,
    Stats,
    Route,
}

impl Collection {
    fn ticket(self, canonical: &mut Canonical) -> &mut u64 {
        match self {
            Self::Bins => &mut canonical.bins_ticket,
            Self::Alerts => &mut canonical.alerts_ticket,
            Self::Stats => &mut canonical.stats_ticket,
            Self::Route => &mut canonical.route_ticket,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Bins => "bins",
            Self::Alerts => "alerts",
            Self::Stats => "stats",
            Self::Route => "route",
        }
    }
}

/// Sole owner and writer of the bin, alert, stats and route collections.
///
/// Every write replaces a collection wholesale and publishes a new immutable
/// [`FleetSnapshot`]; observers only ever see complete revisions.
pub struct StateReconciler<A> {
    api: Arc<A>,
    canonical: RwLock<Canonical>,
    tickets: AtomicU64,
    revision_tx: watch::Sender<u64>,
    // At most one stats refresh scheduled by a push is in flight
    stats_refresh: tokio::sync::Mutex<TaskManager>,
}

impl<A: FleetApi> StateReconciler<A> {
    pub fn new(api: Arc<A>) -> Self {
        let (revision_tx, _) = watch::channel(0);
        Self {
            api,
            canonical: RwLock::new(Canonical::default()),
            tickets: AtomicU64::new(0),
            revision_tx,
            stats_refresh: tokio::sync::Mutex::new(TaskManager::new()),
        }
    }

    /// Current immutable view of the canonical collections
    pub async fn snapshot(&self) -> Arc<FleetSnapshot> {
        Arc::clone(&self.canonical.read().await.snapshot)
    }

    /// Receives the revision number after every canonical mutation
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision_tx.subscribe()
    }

    /// Fetches the full bin collection and replaces the local one.
    ///
    /// On failure the previous collection stays as it was and the error is returned.
    pub async fn refresh_bins(&self) -> Result<()> {
        let ticket = self.next_ticket();
        let bins = self.api.fetch_bins().await.inspect_err(|e| {
            tracing::error!("Failed to fetch bins: {}", e);
        })?;
        validate_bins(&bins).inspect_err(|e| {
            tracing::error!("Rejected fetched bins: {}", e);
        })?;

        self.commit(Collection::Bins, ticket, |snapshot| snapshot.bins = bins)
            .await;
        Ok(())
    }

    pub async fn refresh_alerts(&self) -> Result<()> {
        let ticket = self.next_ticket();
        let alerts = self.api.fetch_alerts().await.inspect_err(|e| {
            tracing::error!("Failed to fetch alerts: {}", e);
        })?;

        self.commit(Collection::Alerts, ticket, |snapshot| {
            snapshot.alerts.replace(alerts)
        })
        .await;
        Ok(())
    }

    pub async fn refresh_stats(&self) -> Result<()> {
        let ticket = self.next_ticket();
        let stats = self.api.fetch_stats().await.inspect_err(|e| {
            tracing::error!("Failed to fetch stats: {}", e);
        })?;

        self.commit(Collection::Stats, ticket, |snapshot| {
            snapshot.stats = Some(stats)
        })
        .await;
        Ok(())
    }

    /// Requests a collection route and keeps the result in the snapshot.
    /// Concurrent calls are not coalesced.
    pub async fn optimize_route(&self) -> Result<RouteOptimization> {
        let ticket = self.next_ticket();
        let route = self.api.optimize_route().await.inspect_err(|e| {
            tracing::error!("Failed to optimize route: {}", e);
        })?;

        let stored = route.clone();
        self.commit(Collection::Route, ticket, |snapshot| {
            snapshot.route = Some(stored)
        })
        .await;
        Ok(route)
    }

    /// Applies one push frame.
    ///
    /// For `bin_update` the bin collection becomes exactly `frame.bins`, `frame.alerts`
    /// go to the head of the ledger in their own order, and a stats refresh is scheduled
    /// in the background. Returns once bins and alerts are committed; a slow stats fetch
    /// never holds up the next frame. A snapshot that breaks the bin invariants is
    /// rejected and nothing changes.
    pub async fn apply_push(self: &Arc<Self>, frame: PushFrame) -> Result<()> {
        match frame {
            PushFrame::BinUpdate(update) => self.apply_bin_update(update).await,
        }
    }

    async fn apply_bin_update(self: &Arc<Self>, update: BinUpdate) -> Result<()> {
        validate_bins(&update.bins).inspect_err(|e| {
            tracing::warn!("Dropping bin_update frame: {}", e);
        })?;

        let BinUpdate { bins, alerts } = update;
        let new_alerts = alerts.len();
        let bin_count = bins.len();
        {
            let mut canonical = self.canonical.write().await;
            let ticket = self.next_ticket();
            canonical.bins_ticket = ticket;
            if !alerts.is_empty() {
                canonical.alerts_ticket = ticket;
            }
            let snapshot = Arc::make_mut(&mut canonical.snapshot);
            snapshot.bins = bins;
            snapshot.alerts.prepend(alerts);
            snapshot.revision += 1;
            self.revision_tx.send_replace(snapshot.revision);
        }
        tracing::debug!(
            "Applied bin_update: {} bins, {} new alerts",
            bin_count,
            new_alerts
        );

        self.schedule_stats_refresh().await;
        Ok(())
    }

    /// Replaces any pending push-driven stats refresh with a fresh one
    async fn schedule_stats_refresh(self: &Arc<Self>) {
        let this = Arc::clone(self);
        let mut tasks = self.stats_refresh.lock().await;
        // The newer fetch supersedes the older one
        tasks.abort_all();
        tasks.spawn(async move {
            if let Err(e) = this.refresh_stats().await {
                tracing::warn!("Stats refresh after bin_update failed: {}", e);
            }
        });
    }

    /// Acknowledges an alert, optimistically.
    ///
    /// Unknown or already acknowledged ids are a no-op returning `Ok(false)`. Otherwise the
    /// local flip happens first and stays even if the server call fails; the failure is
    /// returned as [`FleetError::AcknowledgeFailed`] and only a later
    /// [`refresh_alerts`](Self::refresh_alerts) reconciles it.
    pub async fn acknowledge(&self, grant: AdminGrant<'_>, id: &str) -> Result<bool> {
        let flipped = {
            let mut canonical = self.canonical.write().await;
            let snapshot = Arc::make_mut(&mut canonical.snapshot);
            let flipped = snapshot.alerts.mark_acknowledged(grant, id);
            if flipped {
                snapshot.revision += 1;
                self.revision_tx.send_replace(snapshot.revision);
                canonical.alerts_ticket = self.next_ticket();
            }
            flipped
        };

        if !flipped {
            tracing::debug!("Alert {} unknown or already acknowledged", id);
            return Ok(false);
        }

        match self.api.acknowledge_alert(id).await {
            Ok(()) => {
                tracing::info!("Alert {} acknowledged", id);
                Ok(true)
            }
            Err(e) => {
                tracing::warn!("Server did not confirm acknowledgment of {}: {}", id, e);
                Err(FleetError::AcknowledgeFailed {
                    id: id.to_string(),
                    source: Box::new(e),
                })
            }
        }
    }

    /// Drops all canonical state and cancels the scheduled stats refresh; fetches still
    /// in flight will be discarded
    pub async fn reset(&self) {
        self.stats_refresh.lock().await.shutdown().await;

        let mut canonical = self.canonical.write().await;
        let ticket = self.next_ticket();
        let revision = canonical.snapshot.revision + 1;
        *canonical = Canonical {
            snapshot: Arc::new(FleetSnapshot {
                revision,
                ..FleetSnapshot::default()
            }),
            bins_ticket: ticket,
            alerts_ticket: ticket,
            stats_ticket: ticket,
            route_ticket: ticket,
        };
        self.revision_tx.send_replace(revision);
    }

    fn next_ticket(&self) -> u64 {
        self.tickets.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn commit<F>(&self, collection: Collection, ticket: u64, apply: F)
    where
        F: FnOnce(&mut FleetSnapshot),
    {
        let mut canonical = self.canonical.write().await;
        let current = collection.ticket(&mut *canonical);
        if *current > ticket {
            tracing::debug!(
                "Discarding stale {} fetch (ticket {} < {})",
                collection.name(),
                ticket,
                current
            );
            return;
        }
        *current = ticket;

        let snapshot = Arc::make_mut(&mut canonical.snapshot);
        apply(snapshot);
        snapshot.revision += 1;
        self.revision_tx.send_replace(snapshot.revision);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Role, SessionContext, UserRecord};
    use crate::testing::FakeApi;
    use crate::types::model::fixtures::{alert, bin};
    use crate::types::{Alert, Bin};
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    fn reconciler(api: FakeApi) -> (Arc<FakeApi>, Arc<StateReconciler<FakeApi>>) {
        let api = Arc::new(api);
        (Arc::clone(&api), Arc::new(StateReconciler::new(api)))
    }

    /// Waits until the snapshot satisfies `done`, following published revisions
    async fn settle<F>(state: &StateReconciler<FakeApi>, done: F) -> Arc<FleetSnapshot>
    where
        F: Fn(&FleetSnapshot) -> bool,
    {
        let mut revisions = state.subscribe();
        timeout(WAIT, async {
            loop {
                let snapshot = state.snapshot().await;
                if done(&snapshot) {
                    return snapshot;
                }
                revisions.changed().await.unwrap();
            }
        })
        .await
        .unwrap()
    }

    fn admin() -> SessionContext {
        SessionContext::new(
            &UserRecord {
                id: "u1".to_string(),
                name: "Admin User".to_string(),
                email: "admin@swachhgrid.com".to_string(),
                role: Role::Admin,
                avatar: None,
                created_at: None,
            },
            "token",
        )
    }

    async fn acknowledged(state: &StateReconciler<FakeApi>, id: &str) -> bool {
        state.snapshot().await.alerts.get(id).unwrap().acknowledged
    }

    fn bin_update(bins: Vec<Bin>, alerts: Vec<Alert>) -> PushFrame {
        PushFrame::BinUpdate(BinUpdate { bins, alerts })
    }

    fn bin_ids(snapshot: &FleetSnapshot) -> Vec<&str> {
        snapshot.bins.iter().map(|b| b.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_refresh_replaces_wholesale() {
        let (api, state) = reconciler(FakeApi::with_bins(vec![bin("b1", 10.0), bin("b2", 20.0)]));
        state.refresh_bins().await.unwrap();
        assert_eq!(bin_ids(&*state.snapshot().await), ["b1", "b2"]);

        *api.bins.lock().unwrap() = vec![bin("b3", 30.0)];
        state.refresh_bins().await.unwrap();
        assert_eq!(bin_ids(&*state.snapshot().await), ["b3"]);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_state() {
        let (api, state) = reconciler(FakeApi::with_bins(vec![bin("b1", 10.0)]));
        *api.alerts.lock().unwrap() = vec![alert("a1", false)];
        state.refresh_bins().await.unwrap();
        state.refresh_alerts().await.unwrap();
        state.refresh_stats().await.unwrap();
        let before = state.snapshot().await;

        api.fail_fetches.store(true, Ordering::SeqCst);
        assert!(matches!(
            state.refresh_bins().await,
            Err(FleetError::Status { status: 503, .. })
        ));
        assert!(state.refresh_alerts().await.is_err());
        assert!(state.refresh_stats().await.is_err());

        assert_eq!(*state.snapshot().await, *before);
        // Not retried on its own
        assert_eq!(api.count("GET /bins"), 2);
    }

    #[tokio::test]
    async fn test_last_push_wins_for_bins() {
        let (_api, state) = reconciler(FakeApi::default());
        let frames = [
            vec![bin("b1", 10.0), bin("b2", 20.0), bin("b3", 30.0)],
            vec![bin("b4", 40.0)],
            vec![bin("b2", 55.0), bin("b5", 60.0)],
        ];

        for bins in frames.iter() {
            state
                .apply_push(bin_update(bins.clone(), vec![]))
                .await
                .unwrap();
            assert_eq!(state.snapshot().await.bins, *bins);
        }
        assert_eq!(bin_ids(&*state.snapshot().await), ["b2", "b5"]);
    }

    #[tokio::test]
    async fn test_push_with_alerts_prepends_and_refreshes_stats() {
        let (api, state) = reconciler(FakeApi::default());
        *api.alerts.lock().unwrap() = vec![alert("old", false)];
        state.refresh_alerts().await.unwrap();
        let unacknowledged = state.snapshot().await.alerts.unacknowledged_count();

        let a1: Alert = serde_json::from_value(serde_json::json!({
            "id": "a1",
            "message": "Bin X critical",
            "createdAt": "2024-05-01T09:00:00Z",
            "acknowledged": false
        }))
        .unwrap();
        state
            .apply_push(bin_update(vec![], vec![a1]))
            .await
            .unwrap();

        let snapshot = state.snapshot().await;
        assert!(snapshot.bins.is_empty());
        assert_eq!(snapshot.alerts.list()[0].id, "a1");
        assert_eq!(snapshot.alerts.list()[1].id, "old");
        assert_eq!(snapshot.alerts.unacknowledged_count(), unacknowledged + 1);

        // Stats follow in the background
        let snapshot = settle(&state, |s| s.stats.is_some()).await;
        assert_eq!(api.count("GET /dashboard/stats"), 1);
        assert_eq!(snapshot.stats.as_ref().unwrap().total_bins, 0);
    }

    #[tokio::test]
    async fn test_hanging_stats_fetch_does_not_block_later_frames() {
        let api = FakeApi::default();
        api.hang_stats.store(true, Ordering::SeqCst);
        let (api, state) = reconciler(api);

        let first = vec![bin("first", 10.0)];
        let second = vec![bin("second", 20.0)];
        for bins in [first, second.clone()] {
            timeout(WAIT, state.apply_push(bin_update(bins, vec![])))
                .await
                .expect("frame must not wait for stats")
                .unwrap();
        }

        assert_eq!(state.snapshot().await.bins, second);
        assert!(state.snapshot().await.stats.is_none());
        while api.count("GET /dashboard/stats") == 0 {
            tokio::task::yield_now().await;
        }

        // Reset cancels the refresh still hanging
        timeout(WAIT, state.reset()).await.unwrap();
        assert!(state.snapshot().await.bins.is_empty());
    }

    #[tokio::test]
    async fn test_redelivered_frame_duplicates_alerts_only() {
        let (_api, state) = reconciler(FakeApi::default());
        let frame = bin_update(vec![bin("b1", 50.0)], vec![alert("a1", false)]);

        state.apply_push(frame.clone()).await.unwrap();
        state.apply_push(frame).await.unwrap();

        let snapshot = state.snapshot().await;
        assert_eq!(bin_ids(&snapshot), ["b1"]);
        assert_eq!(snapshot.alerts.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_push_snapshot_is_rejected() {
        let (api, state) = reconciler(FakeApi::with_bins(vec![bin("b1", 10.0)]));
        state.refresh_bins().await.unwrap();

        let result = state
            .apply_push(bin_update(
                vec![bin("b2", 10.0), bin("b2", 20.0)],
                vec![alert("a1", false)],
            ))
            .await;
        assert!(matches!(result, Err(FleetError::InvalidSnapshot(_))));

        let snapshot = state.snapshot().await;
        assert_eq!(bin_ids(&snapshot), ["b1"]);
        assert!(snapshot.alerts.is_empty());
        assert_eq!(api.count("GET /dashboard/stats"), 0);
    }

    #[tokio::test]
    async fn test_fetch_started_before_push_is_discarded() {
        let (api, state) = reconciler(FakeApi::with_bins(vec![bin("stale", 10.0)]));
        let release = api.hold_next_bins_fetch();

        let refresh = tokio::spawn({
            let state = Arc::clone(&state);
            async move { state.refresh_bins().await }
        });
        while api.count("GET /bins") == 0 {
            tokio::task::yield_now().await;
        }

        state
            .apply_push(bin_update(vec![bin("fresh", 20.0)], vec![]))
            .await
            .unwrap();
        release.send(()).unwrap();
        refresh.await.unwrap().unwrap();

        assert_eq!(bin_ids(&*state.snapshot().await), ["fresh"]);

        // A refresh started after the push does apply
        state.refresh_bins().await.unwrap();
        assert_eq!(bin_ids(&*state.snapshot().await), ["stale"]);
    }

    #[tokio::test]
    async fn test_acknowledge_is_idempotent_and_confirmed() {
        let (api, state) = reconciler(FakeApi::default());
        *api.alerts.lock().unwrap() = vec![alert("a1", false), alert("a2", false)];
        state.refresh_alerts().await.unwrap();
        let session = admin();

        assert!(state.acknowledge(session.admin().unwrap(), "a1").await.unwrap());
        assert_eq!(state.snapshot().await.alerts.unacknowledged_count(), 1);
        assert!(acknowledged(&state, "a1").await);

        assert!(!state.acknowledge(session.admin().unwrap(), "a1").await.unwrap());
        assert_eq!(state.snapshot().await.alerts.unacknowledged_count(), 1);
        assert!(acknowledged(&state, "a1").await);

        assert!(!state.acknowledge(session.admin().unwrap(), "nope").await.unwrap());
        assert_eq!(api.count("PUT /alerts/a1/acknowledge"), 1);
        assert_eq!(api.count("PUT /alerts/nope/acknowledge"), 0);
    }

    #[tokio::test]
    async fn test_failed_acknowledge_stays_flipped_until_refresh() {
        let (api, state) = reconciler(FakeApi::default());
        *api.alerts.lock().unwrap() = vec![alert("a1", false)];
        state.refresh_alerts().await.unwrap();
        api.fail_acknowledge.store(true, Ordering::SeqCst);
        let session = admin();

        let result = state.acknowledge(session.admin().unwrap(), "a1").await;
        match result {
            Err(FleetError::AcknowledgeFailed { id, .. }) => assert_eq!(id, "a1"),
            other => panic!("expected AcknowledgeFailed, got {other:?}"),
        }
        assert!(acknowledged(&state, "a1").await);
        assert_eq!(state.snapshot().await.alerts.unacknowledged_count(), 0);

        // The server never recorded it, so a fresh fetch is what reconciles
        state.refresh_alerts().await.unwrap();
        assert!(!acknowledged(&state, "a1").await);
    }

    #[tokio::test]
    async fn test_revisions_are_published() {
        let (_api, state) = reconciler(FakeApi::with_bins(vec![bin("b1", 10.0)]));
        let mut revisions = state.subscribe();

        state.refresh_bins().await.unwrap();
        assert!(revisions.has_changed().unwrap());
        assert_eq!(*revisions.borrow_and_update(), 1);

        state.optimize_route().await.unwrap();
        assert_eq!(*revisions.borrow_and_update(), 2);
        assert_eq!(
            state.snapshot().await.route.as_ref().unwrap().bin_ids,
            ["b1"]
        );

        state.reset().await;
        let snapshot = state.snapshot().await;
        assert!(snapshot.bins.is_empty());
        assert!(snapshot.route.is_none());
        assert_eq!(*revisions.borrow_and_update(), 3);
    }
}
