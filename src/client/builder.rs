use super::{ClientState, ConnectionManager, ConnectionState, FleetClient};
use crate::api::FleetApi;
use crate::infrastructure::{HttpApi, ReconnectPolicy, api_endpoint, http_to_ws_endpoint};
use crate::session::SessionStore;
use crate::sync::StateReconciler;
use crate::types::{FleetError, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};

pub const ENV_BACKEND_URL: &str = "SWACHHGRID_BACKEND_URL";
pub const ENV_RECONNECT_MS: &str = "SWACHHGRID_RECONNECT_MS";
pub const ENV_STORAGE_DIR: &str = "SWACHHGRID_STORAGE_DIR";

#[derive(Debug, Clone)]
pub struct FleetClientOptions {
    /// Service base address, e.g. `https://grid.example.com`
    pub base_url: String,
    pub reconnect: ReconnectPolicy,
    /// Directory holding the persisted session keys
    pub storage_dir: PathBuf,
    /// REST request timeout in milliseconds; `None` waits indefinitely
    pub request_timeout: Option<u64>,
}

impl Default for FleetClientOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            reconnect: ReconnectPolicy::default(),
            storage_dir: PathBuf::from(".swachhgrid"),
            request_timeout: None,
        }
    }
}

impl FleetClientOptions {
    /// Defaults overridden by `SWACHHGRID_*` environment variables when present
    pub fn from_env() -> Result<Self> {
        let mut options = Self::default();

        if let Ok(base_url) = std::env::var(ENV_BACKEND_URL) {
            options.base_url = base_url;
        }
        if let Ok(raw) = std::env::var(ENV_RECONNECT_MS) {
            let millis = raw.trim().parse::<u64>().map_err(|_| {
                FleetError::Validation(format!("{ENV_RECONNECT_MS} must be milliseconds, got '{raw}'"))
            })?;
            options.reconnect = ReconnectPolicy::fixed_millis(millis);
        }
        if let Ok(dir) = std::env::var(ENV_STORAGE_DIR) {
            options.storage_dir = PathBuf::from(dir);
        }

        Ok(options)
    }
}

/// Builder for FleetClient that validates the options up front
pub struct FleetClientBuilder {
    options: FleetClientOptions,
    push_endpoint: String,
}

impl FleetClientBuilder {
    /// Create a new builder
    pub fn new(options: FleetClientOptions) -> Result<Self> {
        if options.base_url.trim().is_empty() {
            return Err(FleetError::Validation("base url is required".to_string()));
        }
        // Both derived endpoints must be valid before anything is built
        api_endpoint(&options.base_url)?;
        let push_endpoint = http_to_ws_endpoint(&options.base_url)?;

        Ok(Self {
            options,
            push_endpoint,
        })
    }

    /// Build a client talking to the HTTP backend
    pub fn build(self) -> Result<FleetClient<HttpApi>> {
        let timeout = self.options.request_timeout.map(Duration::from_millis);
        let api = HttpApi::new(&self.options.base_url, timeout)?;
        Ok(self.build_with_api(Arc::new(api)))
    }

    /// Build a client over any REST collaborator
    pub fn build_with_api<A: FleetApi>(self, api: Arc<A>) -> FleetClient<A> {
        let (status_tx, _) = watch::channel(ConnectionState::Disconnected);

        FleetClient {
            reconciler: Arc::new(StateReconciler::new(Arc::clone(&api))),
            api,
            connection: Arc::new(ConnectionManager::new(
                self.push_endpoint,
                self.options.reconnect.clone(),
            )),
            store: SessionStore::new(self.options.storage_dir.clone()),
            state: Arc::new(RwLock::new(ClientState::new())),
            status_tx,
            options: self.options,
        }
    }
}
