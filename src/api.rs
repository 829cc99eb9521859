//! The REST collaborator seen by the core.
//!
//! [`HttpApi`](crate::infrastructure::HttpApi) talks to the real backend; tests substitute
//! an in-memory implementation.

use crate::session::{LoginResponse, Role};
use crate::types::{
    Alert, Bin, BinDraft, BinRequest, DashboardStats, FleetError, MIN_PASSWORD_LEN,
    RequestReceipt, Result, RouteOptimization,
};
use serde::Serialize;
use std::future::Future;

/// `POST /auth/login` body
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(FleetError::Validation(
                "Please fill in all required fields.".to_string(),
            ));
        }
        Ok(())
    }
}

/// `POST /auth/register` body
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl Registration {
    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(FleetError::Validation(
                "Please fill in all required fields.".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(FleetError::Validation(
                "Please enter your full name.".to_string(),
            ));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(FleetError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long."
            )));
        }
        Ok(())
    }
}

/// Operations the backend exposes to this client.
pub trait FleetApi: Send + Sync + 'static {
    fn fetch_bins(&self) -> impl Future<Output = Result<Vec<Bin>>> + Send;

    fn fetch_alerts(&self) -> impl Future<Output = Result<Vec<Alert>>> + Send;

    fn fetch_stats(&self) -> impl Future<Output = Result<DashboardStats>> + Send;

    fn create_bin(&self, draft: &BinDraft) -> impl Future<Output = Result<Bin>> + Send;

    fn initialize_demo_data(&self) -> impl Future<Output = Result<()>> + Send;

    fn acknowledge_alert(&self, id: &str) -> impl Future<Output = Result<()>> + Send;

    fn optimize_route(&self) -> impl Future<Output = Result<RouteOptimization>> + Send;

    fn login(&self, credentials: &Credentials)
    -> impl Future<Output = Result<LoginResponse>> + Send;

    fn register(
        &self,
        registration: &Registration,
    ) -> impl Future<Output = Result<LoginResponse>> + Send;

    /// The backend has no endpoint for bin requests, so by default they are only
    /// acknowledged locally.
    fn submit_bin_request(
        &self,
        request: &BinRequest,
    ) -> impl Future<Output = Result<RequestReceipt>> + Send {
        let receipt = RequestReceipt {
            reference: uuid::Uuid::new_v4().to_string(),
            request: request.clone(),
            received_at: chrono::Utc::now(),
            persisted: false,
        };
        async move {
            tracing::info!(
                "Bin request {} from {} acknowledged client-side only",
                receipt.reference,
                receipt.request.email
            );
            Ok(receipt)
        }
    }
}
