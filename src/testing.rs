//! In-memory REST collaborator for unit tests.

use crate::api::{Credentials, FleetApi, Registration};
use crate::session::{LoginResponse, Role, UserRecord};
use crate::types::{
    Alert, Bin, BinDraft, BinStatus, DashboardStats, FleetError, Result, RouteOptimization,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::oneshot;

#[derive(Default)]
pub(crate) struct FakeApi {
    pub bins: Mutex<Vec<Bin>>,
    pub alerts: Mutex<Vec<Alert>>,
    /// Installed into `bins` by `initialize_demo_data`
    pub demo_bins: Mutex<Vec<Bin>>,
    pub users: Mutex<HashMap<String, (String, UserRecord)>>,
    pub fail_fetches: AtomicBool,
    pub fail_acknowledge: AtomicBool,
    /// `fetch_stats` never completes while set
    pub hang_stats: AtomicBool,
    pub calls: Mutex<Vec<String>>,
    /// When set, the next `fetch_bins` reads its payload and then waits for the signal
    bins_hold: Mutex<Option<oneshot::Receiver<()>>>,
}

impl FakeApi {
    pub fn with_bins(bins: Vec<Bin>) -> Self {
        let api = Self::default();
        *api.bins.lock().unwrap() = bins;
        api
    }

    pub fn with_user(self, email: &str, password: &str, role: Role) -> Self {
        let user = UserRecord {
            id: format!("user-{email}"),
            name: match role {
                Role::Admin => "Admin User".to_string(),
                Role::User => "Regular User".to_string(),
            },
            email: email.to_string(),
            role,
            avatar: None,
            created_at: None,
        };
        self.users
            .lock()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), user));
        self
    }

    /// Holds the next `fetch_bins` until the returned sender fires
    pub fn hold_next_bins_fetch(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.bins_hold.lock().unwrap() = Some(rx);
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    fn check_fetch(&self, path: &str) -> Result<()> {
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(FleetError::Status {
                path: path.to_string(),
                status: 503,
            });
        }
        Ok(())
    }
}

impl FleetApi for FakeApi {
    async fn fetch_bins(&self) -> Result<Vec<Bin>> {
        self.record("GET /bins");
        self.check_fetch("/bins")?;
        let bins = self.bins.lock().unwrap().clone();
        let hold = self.bins_hold.lock().unwrap().take();
        if let Some(hold) = hold {
            let _ = hold.await;
        }
        Ok(bins)
    }

    async fn fetch_alerts(&self) -> Result<Vec<Alert>> {
        self.record("GET /alerts");
        self.check_fetch("/alerts")?;
        Ok(self.alerts.lock().unwrap().clone())
    }

    async fn fetch_stats(&self) -> Result<DashboardStats> {
        self.record("GET /dashboard/stats");
        if self.hang_stats.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.check_fetch("/dashboard/stats")?;
        let bins = self.bins.lock().unwrap();
        let count = |status: BinStatus| bins.iter().filter(|b| b.status() == status).count() as u32;
        let average = if bins.is_empty() {
            0.0
        } else {
            bins.iter().map(|b| b.fill_level).sum::<f64>() / bins.len() as f64
        };
        Ok(DashboardStats {
            total_bins: bins.len() as u32,
            critical_bins: count(BinStatus::Critical),
            warning_bins: count(BinStatus::Warning),
            normal_bins: count(BinStatus::Normal),
            average_fill_level: average,
            bins_needing_collection: None,
        })
    }

    async fn create_bin(&self, draft: &BinDraft) -> Result<Bin> {
        self.record("POST /bins");
        let mut bins = self.bins.lock().unwrap();
        let bin: Bin = serde_json::from_value(serde_json::json!({
            "id": format!("bin-{}", bins.len() + 1),
            "name": draft.name,
            "latitude": draft.position.lat,
            "longitude": draft.position.lng,
            "capacity": draft.capacity,
            "fill_level": 0.0,
            "status": "normal",
            "location_type": draft.location_type,
            "last_updated": "2024-05-01T10:00:00"
        }))?;
        bins.push(bin.clone());
        Ok(bin)
    }

    async fn initialize_demo_data(&self) -> Result<()> {
        self.record("POST /initialize-demo-data");
        let demo = self.demo_bins.lock().unwrap().clone();
        *self.bins.lock().unwrap() = demo;
        Ok(())
    }

    async fn acknowledge_alert(&self, id: &str) -> Result<()> {
        self.record(&format!("PUT /alerts/{id}/acknowledge"));
        let path = format!("/alerts/{id}/acknowledge");
        if self.fail_acknowledge.load(Ordering::SeqCst) {
            return Err(FleetError::Status { path, status: 500 });
        }
        let mut alerts = self.alerts.lock().unwrap();
        match alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.acknowledged = true;
                Ok(())
            }
            None => Err(FleetError::Status { path, status: 404 }),
        }
    }

    async fn optimize_route(&self) -> Result<RouteOptimization> {
        self.record("GET /route/optimize");
        let bins = self.bins.lock().unwrap();
        Ok(RouteOptimization {
            bin_ids: bins.iter().map(|b| b.id.clone()).collect(),
            total_distance: 1.5,
            estimated_time: 12.0,
            coordinates: bins
                .iter()
                .map(|b| [b.position.lat, b.position.lng])
                .collect(),
        })
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        self.record("POST /auth/login");
        let users = self.users.lock().unwrap();
        match users.get(&credentials.email) {
            Some((password, user)) if *password == credentials.password => Ok(LoginResponse {
                user: user.clone(),
                token: uuid::Uuid::new_v4().to_string(),
                message: Some("Login successful".to_string()),
            }),
            _ => Err(FleetError::Auth("Invalid email or password".to_string())),
        }
    }

    async fn register(&self, registration: &Registration) -> Result<LoginResponse> {
        self.record("POST /auth/register");
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&registration.email) {
            return Err(FleetError::Auth(
                "User with this email already exists".to_string(),
            ));
        }
        let user = UserRecord {
            id: uuid::Uuid::new_v4().to_string(),
            name: registration.name.clone(),
            email: registration.email.clone(),
            role: registration.role,
            avatar: None,
            created_at: None,
        };
        users.insert(
            registration.email.clone(),
            (registration.password.clone(), user.clone()),
        );
        Ok(LoginResponse {
            user,
            token: uuid::Uuid::new_v4().to_string(),
            message: Some("User registered successfully".to_string()),
        })
    }
}
