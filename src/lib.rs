//! # SwachhGrid Client
//!
//! Client core for the SwachhGrid smart waste-bin monitoring service: authenticated
//! sessions, the live push channel with automatic reconnection, reconciliation of the
//! bin/alert/stats collections, and the armed-click placement flow.
//!
//! ## Example
//!
//! ```no_run
//! use swachhgrid_client::{FleetClient, FleetClientOptions, Position, Role};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FleetClient::new(FleetClientOptions::from_env()?)?;
//!
//!     client.demo_login(Role::Admin).await?;
//!     client.arm().await?;
//!     if let Some(command) = client.click(Position::new(12.30, 45.60)).await {
//!         println!("placement: {:?}", command);
//!     }
//!
//!     client.logout().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod infrastructure;
pub mod interaction;
pub mod messaging;
pub mod session;
pub mod sync;
pub mod types;
pub mod websocket;

#[cfg(test)]
mod testing;

pub use api::{Credentials, FleetApi, Registration};
pub use client::{
    ConnectionManager, ConnectionState, FleetClient, FleetClientBuilder, FleetClientOptions,
};
pub use infrastructure::{HttpApi, ReconnectPolicy};
pub use interaction::{InteractionMode, InteractionModeController, PlacementCommand, PlacementKind};
pub use messaging::FrameKind;
pub use session::{AdminGrant, Role, SessionContext, SessionStore, UserRecord};
pub use sync::{AlertLedger, FleetSnapshot, StateReconciler};
pub use types::{
    Alert, AlertSeverity, Bin, BinDraft, BinRequest, BinStatus, DashboardStats, FleetError,
    Position, PushFrame, RequestReceipt, Result, RouteOptimization, Urgency,
};
