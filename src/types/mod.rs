pub mod constants;
pub mod error;
pub mod message;
pub mod model;

pub use constants::*;
pub use error::{FleetError, Result};
pub use message::{BinUpdate, PushFrame};
pub use model::{
    Alert, AlertSeverity, Bin, BinDraft, BinRequest, BinStatus, DashboardStats, Position,
    RequestReceipt, RouteOptimization, Urgency,
};
