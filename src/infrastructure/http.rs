use crate::api::{Credentials, FleetApi, Registration};
use crate::session::LoginResponse;
use crate::types::constants::paths;
use crate::types::{
    AUTH_FALLBACK_MESSAGE, Alert, Bin, BinDraft, DashboardStats, FleetError, Result,
    RouteOptimization,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// REST collaborator backed by the SwachhGrid HTTP API
#[derive(Debug, Clone)]
pub struct HttpApi {
    api_base: String,
    http: reqwest::Client,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            api_base: api_endpoint(base_url)?,
            http: builder.build()?,
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.http.get(self.url(path)).send().await?;
        Self::decode(path, response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Self::decode(path, response).await
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Request to {} failed with status {}", path, status);
            return Err(FleetError::Status {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Login and registration surface the server's `detail` message on failure
    async fn authenticate<B: Serialize>(&self, path: &str, body: &B) -> Result<LoginResponse> {
        let response = self
            .http
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Authentication request failed: {}", e);
                FleetError::Auth(AUTH_FALLBACK_MESSAGE.to_string())
            })?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if status.is_success() {
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let detail = auth_failure_detail(&bytes);
        tracing::warn!("Authentication rejected with status {}: {}", status, detail);
        Err(FleetError::Auth(detail))
    }
}

impl FleetApi for HttpApi {
    async fn fetch_bins(&self) -> Result<Vec<Bin>> {
        self.get(paths::BINS).await
    }

    async fn fetch_alerts(&self) -> Result<Vec<Alert>> {
        self.get(paths::ALERTS).await
    }

    async fn fetch_stats(&self) -> Result<DashboardStats> {
        self.get(paths::DASHBOARD_STATS).await
    }

    async fn create_bin(&self, draft: &BinDraft) -> Result<Bin> {
        self.post(paths::BINS, draft).await
    }

    async fn initialize_demo_data(&self) -> Result<()> {
        let _: serde_json::Value = self
            .post(paths::INITIALIZE_DEMO_DATA, &serde_json::json!({}))
            .await?;
        Ok(())
    }

    async fn acknowledge_alert(&self, id: &str) -> Result<()> {
        let path = format!("{}/{}/acknowledge", paths::ALERTS, id);
        let response = self.http.put(self.url(&path)).send().await?;
        let _: serde_json::Value = Self::decode(&path, response).await?;
        Ok(())
    }

    async fn optimize_route(&self) -> Result<RouteOptimization> {
        self.get(paths::ROUTE_OPTIMIZE).await
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        self.authenticate(paths::AUTH_LOGIN, credentials).await
    }

    async fn register(&self, registration: &Registration) -> Result<LoginResponse> {
        self.authenticate(paths::AUTH_REGISTER, registration).await
    }
}

/// Extracts the server-provided `detail` from an error body, or the generic fallback
pub fn auth_failure_detail(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| AUTH_FALLBACK_MESSAGE.to_string())
}

/// Converts the service base address to the REST API base
pub fn api_endpoint(base_url: &str) -> Result<String> {
    let url = Url::parse(base_url)?;
    let base = url.as_str().trim_end_matches('/');
    Ok(format!("{}{}", base, paths::API_PREFIX))
}

/// Converts the service base address to the push channel endpoint
pub fn http_to_ws_endpoint(base_url: &str) -> Result<String> {
    let mut url = Url::parse(base_url)?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(FleetError::Connection(format!(
                "unsupported scheme '{other}' for service base address"
            )));
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| FleetError::Connection(format!("cannot use scheme '{scheme}'")))?;

    let path = format!("{}{}", url.path().trim_end_matches('/'), paths::PUSH_CHANNEL);
    url.set_path(&path);
    url.set_query(None);
    Ok(url.to_string())
}
