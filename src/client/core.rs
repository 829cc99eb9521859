use super::{ClientState, ConnectionManager, ConnectionState, FleetClientBuilder, FleetClientOptions};
use crate::api::{Credentials, FleetApi, Registration};
use crate::infrastructure::HttpApi;
use crate::interaction::{InteractionMode, PlacementCommand};
use crate::session::{LoginResponse, Role, SessionContext, SessionStore, UserRecord};
use crate::sync::{FleetSnapshot, StateReconciler};
use crate::types::{
    Bin, BinDraft, BinRequest, DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD, DEMO_USER_EMAIL,
    DEMO_USER_PASSWORD, FleetError, Position, RequestReceipt, Result, RouteOptimization,
};
use std::sync::Arc;
use tokio::sync::{RwLock, watch};

/// The main entry point of the SwachhGrid client.
///
/// `FleetClient` ties one authenticated session to the push channel, the canonical
/// fleet state and the placement state machine. A session starts with
/// [`login()`](Self::login), [`register()`](Self::register) or [`restore()`](Self::restore)
/// and ends with [`logout()`](Self::logout).
///
/// # Example
///
/// ```no_run
/// use swachhgrid_client::{FleetClient, FleetClientOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = FleetClient::new(FleetClientOptions {
///     base_url: "http://localhost:8000".to_string(),
///     ..Default::default()
/// })?;
///
/// client.login("admin@swachhgrid.com", "admin123").await?;
/// println!("{} bins", client.snapshot().await.bins.len());
/// client.logout().await?;
/// # Ok(())
/// # }
/// ```
pub struct FleetClient<A: FleetApi = HttpApi> {
    pub(crate) options: FleetClientOptions,
    pub(crate) api: Arc<A>,

    // Push channel lifecycle
    pub(crate) connection: Arc<ConnectionManager>,

    // Sole writer of the canonical collections
    pub(crate) reconciler: Arc<StateReconciler<A>>,

    pub(crate) store: SessionStore,

    // Consolidated mutable state
    pub(crate) state: Arc<RwLock<ClientState>>,

    pub(crate) status_tx: watch::Sender<ConnectionState>,
}

impl FleetClient<HttpApi> {
    /// Creates a client for the HTTP backend. No session is started.
    ///
    /// # Errors
    ///
    /// Returns [`FleetError::Validation`] or [`FleetError::UrlParse`] if the base address is
    /// unusable.
    pub fn new(options: FleetClientOptions) -> Result<Self> {
        FleetClientBuilder::new(options)?.build()
    }
}

impl<A: FleetApi> FleetClient<A> {
    pub fn options(&self) -> &FleetClientOptions {
        &self.options
    }

    /// Starts the session persisted by a previous run, if both keys are present.
    pub async fn restore(&self) -> Result<Option<SessionContext>> {
        match self.store.load().await? {
            Some((user, token)) => {
                tracing::info!("Restoring session for {}", user.email);
                self.start_session(user, token).await.map(Some)
            }
            None => {
                tracing::debug!("No persisted session in {}", self.store.dir().display());
                Ok(None)
            }
        }
    }

    /// Authenticates and starts a session.
    ///
    /// # Errors
    ///
    /// [`FleetError::Validation`] if a field is missing (no request is made), or
    /// [`FleetError::Auth`] carrying the server's explanation.
    pub async fn login(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<SessionContext> {
        let credentials = Credentials::new(email, password);
        credentials.validate()?;

        let response = self.api.login(&credentials).await?;
        self.persist_and_start(response).await
    }

    pub async fn register(
        &self,
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        role: Role,
    ) -> Result<SessionContext> {
        let registration = Registration {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            role,
        };
        registration.validate()?;

        let response = self.api.register(&registration).await?;
        self.persist_and_start(response).await
    }

    /// Logs in with the seeded demo account for `role`
    pub async fn demo_login(&self, role: Role) -> Result<SessionContext> {
        let (email, password) = match role {
            Role::Admin => (DEMO_ADMIN_EMAIL, DEMO_ADMIN_PASSWORD),
            Role::User => (DEMO_USER_EMAIL, DEMO_USER_PASSWORD),
        };
        self.login(email, password).await
    }

    /// Ends the session.
    ///
    /// Teardown order: the reconnect timer and the channel go first, then the placement
    /// mode returns to idle, then session and canonical state are dropped. Nothing from the
    /// old session can touch state once this returns.
    pub async fn logout(&self) -> Result<()> {
        self.stop_push_channel().await;

        let session = {
            let mut state = self.state.write().await;
            state.interaction.reset();
            state.session.take()
        };
        self.reconciler.reset().await;
        self.store.clear().await?;

        match session {
            Some(session) => tracing::info!("Session for {} ended", session.email()),
            None => tracing::debug!("Logout without an active session"),
        }
        Ok(())
    }

    pub async fn session(&self) -> Option<SessionContext> {
        self.state.read().await.session.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated()
    }

    /// Toggles placement mode for the signed-in user's role
    pub async fn arm(&self) -> Result<InteractionMode> {
        let mut state = self.state.write().await;
        let role = state
            .session
            .as_ref()
            .map(SessionContext::role)
            .ok_or(FleetError::NotAuthenticated)?;
        Ok(state.interaction.arm(role))
    }

    /// Feeds a map click to the placement state machine
    pub async fn click(&self, position: Position) -> Option<PlacementCommand> {
        self.state.write().await.interaction.handle_click(position)
    }

    pub async fn interaction_mode(&self) -> InteractionMode {
        self.state.read().await.interaction.mode()
    }

    /// Creates a bin (admins only), then refreshes bins and stats
    pub async fn create_bin(&self, draft: BinDraft) -> Result<Bin> {
        let session = self.require_session().await?;
        if session.admin().is_none() {
            return Err(FleetError::Forbidden {
                role: session.role(),
                action: "create bins",
            });
        }
        draft.validate()?;

        let bin = self.api.create_bin(&draft).await.inspect_err(|e| {
            tracing::error!("Failed to create bin: {}", e);
        })?;
        tracing::info!("Created bin {} ({})", bin.id, bin.name);

        if let Err(e) = self.reconciler.refresh_bins().await {
            tracing::warn!("Bin refresh after creation failed: {}", e);
        }
        if let Err(e) = self.reconciler.refresh_stats().await {
            tracing::warn!("Stats refresh after creation failed: {}", e);
        }
        Ok(bin)
    }

    /// A bin request at `position`, prefilled from the signed-in user
    pub async fn bin_request_at(&self, position: Position) -> Result<BinRequest> {
        let session = self.require_session().await?;
        Ok(BinRequest::at(
            position,
            session.display_name(),
            session.email(),
        ))
    }

    /// Submits a bin request (regular users only)
    pub async fn request_bin(&self, request: BinRequest) -> Result<RequestReceipt> {
        let session = self.require_session().await?;
        match session.role() {
            Role::User => {}
            Role::Admin => {
                return Err(FleetError::Forbidden {
                    role: Role::Admin,
                    action: "request bins",
                });
            }
        }
        request.validate()?;

        self.api.submit_bin_request(&request).await
    }

    /// Acknowledges an alert (admins only).
    ///
    /// Returns `Ok(false)` for an unknown or already acknowledged id. If the server does
    /// not confirm, the local flip stays and [`FleetError::AcknowledgeFailed`] is returned.
    pub async fn acknowledge_alert(&self, id: &str) -> Result<bool> {
        let session = self.require_session().await?;
        let grant = session.admin().ok_or(FleetError::Forbidden {
            role: session.role(),
            action: "acknowledge alerts",
        })?;
        self.reconciler.acknowledge(grant, id).await
    }

    pub async fn optimize_route(&self) -> Result<RouteOptimization> {
        self.require_session().await?;
        self.reconciler.optimize_route().await
    }

    pub async fn refresh_bins(&self) -> Result<()> {
        self.reconciler.refresh_bins().await
    }

    pub async fn refresh_alerts(&self) -> Result<()> {
        self.reconciler.refresh_alerts().await
    }

    pub async fn refresh_stats(&self) -> Result<()> {
        self.reconciler.refresh_stats().await
    }

    pub async fn snapshot(&self) -> Arc<FleetSnapshot> {
        self.reconciler.snapshot().await
    }

    /// Revision counter bumped on every canonical mutation
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.reconciler.subscribe()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Push channel status as reported by the connection supervisor
    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.status_tx.subscribe()
    }

    async fn require_session(&self) -> Result<SessionContext> {
        self.state
            .read()
            .await
            .session
            .clone()
            .ok_or(FleetError::NotAuthenticated)
    }

    async fn persist_and_start(&self, response: LoginResponse) -> Result<SessionContext> {
        let LoginResponse { user, token, .. } = response;
        if let Err(e) = self.store.save(&user, &token).await {
            tracing::warn!("Failed to persist session for {}: {}", user.email, e);
        }
        self.start_session(user, token).await
    }

    async fn start_session(&self, user: UserRecord, token: String) -> Result<SessionContext> {
        // A previous session's channel must not outlive it
        self.stop_push_channel().await;

        let session = SessionContext::new(&user, token);
        {
            let mut state = self.state.write().await;
            state.interaction.reset();
            state.session = Some(session.clone());
        }
        tracing::info!(
            "Session started for {} ({})",
            session.email(),
            session.role()
        );

        self.initial_load().await;
        self.start_push_channel().await;
        Ok(session)
    }

    /// Loads bins, seeding demo data if the backend has none, then alerts and stats.
    /// Failures are logged and leave the affected collection empty.
    async fn initial_load(&self) {
        match self.reconciler.refresh_bins().await {
            Ok(()) if self.reconciler.snapshot().await.bins.is_empty() => {
                tracing::info!("No bins found, initializing demo data");
                match self.api.initialize_demo_data().await {
                    Ok(()) => {
                        if let Err(e) = self.reconciler.refresh_bins().await {
                            tracing::warn!("Bin refresh after demo initialization failed: {}", e);
                        }
                    }
                    Err(e) => tracing::error!("Failed to initialize demo data: {}", e),
                }
            }
            Ok(()) => {}
            Err(e) => tracing::warn!("Initial bin load failed: {}", e),
        }

        if let Err(e) = self.reconciler.refresh_alerts().await {
            tracing::warn!("Initial alert load failed: {}", e);
        }
        if let Err(e) = self.reconciler.refresh_stats().await {
            tracing::warn!("Initial stats load failed: {}", e);
        }
    }

    async fn start_push_channel(&self) {
        let status_tx = self.status_tx.clone();
        let mut frames = self
            .connection
            .open(move |state| {
                status_tx.send_replace(state);
            })
            .await;

        let reconciler = Arc::clone(&self.reconciler);
        self.state.write().await.frame_pump.spawn(async move {
            // One frame at a time, in arrival order
            while let Some(frame) = frames.recv().await {
                if let Err(e) = reconciler.apply_push(frame).await {
                    tracing::warn!("Push frame not applied: {}", e);
                }
            }
            tracing::debug!("Push frame pump finished");
        });
    }

    async fn stop_push_channel(&self) {
        self.connection.close().await;
        self.state.write().await.frame_pump.shutdown().await;
    }
}
