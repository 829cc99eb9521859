use crate::types::constants::{DEFAULT_BIN_CAPACITY, DEFAULT_LOCATION_TYPE};
use crate::types::{FleetError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Geographic position in decimal degrees.
///
/// On the wire this is the `latitude`/`longitude` pair carried by bins and forms;
/// map click coordinates (`lat`/`lng`) are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(rename = "latitude", alias = "lat")]
    pub lat: f64,
    #[serde(rename = "longitude", alias = "lng")]
    pub lng: f64,
}

impl Position {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(FleetError::Validation(format!(
                "latitude {} is outside [-90, 90]",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(FleetError::Validation(format!(
                "longitude {} is outside [-180, 180]",
                self.lng
            )));
        }
        Ok(())
    }
}

/// Bin status as classified by the server from its fill level thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinStatus {
    Normal,
    Warning,
    Critical,
}

/// A monitored waste bin.
///
/// `status` is derived server-side from `fill_level` and is only readable here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub position: Position,
    /// Liters
    pub capacity: u32,
    /// Percent, 0..=100
    #[serde(alias = "fillLevel")]
    pub fill_level: f64,
    status: BinStatus,
    #[serde(default)]
    pub location_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(alias = "lastUpdated", deserialize_with = "timestamp::deserialize")]
    pub last_updated: DateTime<Utc>,
    #[serde(
        default,
        alias = "predictedFullTime",
        deserialize_with = "timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub predicted_full_time: Option<DateTime<Utc>>,
}

impl Bin {
    pub fn status(&self) -> BinStatus {
        self.status
    }

    /// Whether the fill level is inside the inclusive percent range
    pub fn has_valid_fill_level(&self) -> bool {
        (0.0..=100.0).contains(&self.fill_level)
    }
}

/// Alert severity assigned by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<AlertSeverity>,
    #[serde(default, alias = "binId", skip_serializing_if = "Option::is_none")]
    pub bin_id: Option<String>,
    #[serde(alias = "createdAt", deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    /// One-directional: once true it never reverts locally
    #[serde(default)]
    pub acknowledged: bool,
}

/// Aggregate counts served by `GET /dashboard/stats`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_bins: u32,
    pub critical_bins: u32,
    pub warning_bins: u32,
    pub normal_bins: u32,
    pub average_fill_level: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bins_needing_collection: Option<u32>,
}

/// Collection route computed by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteOptimization {
    pub bin_ids: Vec<String>,
    /// Kilometers
    pub total_distance: f64,
    /// Minutes
    pub estimated_time: f64,
    /// `[latitude, longitude]` pairs in visiting order
    pub coordinates: Vec<[f64; 2]>,
}

/// Payload for `POST /bins`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinDraft {
    pub name: String,
    #[serde(flatten)]
    pub position: Position,
    pub capacity: u32,
    pub location_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl BinDraft {
    /// A draft placed at the clicked position with the default capacity and location type
    pub fn at(position: Position) -> Self {
        Self {
            name: String::new(),
            position,
            capacity: DEFAULT_BIN_CAPACITY,
            location_type: DEFAULT_LOCATION_TYPE.to_string(),
            description: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(FleetError::Validation("bin name is required".to_string()));
        }
        if self.capacity == 0 {
            return Err(FleetError::Validation(
                "capacity must be positive".to_string(),
            ));
        }
        self.position.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

/// A regular user's request for a new bin at a position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinRequest {
    pub requested_by: String,
    pub email: String,
    #[serde(flatten)]
    pub position: Position,
    pub location_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub urgency: Urgency,
}

impl BinRequest {
    pub fn at(position: Position, requested_by: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            requested_by: requested_by.into(),
            email: email.into(),
            position,
            location_type: DEFAULT_LOCATION_TYPE.to_string(),
            description: String::new(),
            urgency: Urgency::default(),
        }
    }

    pub fn with_urgency(mut self, urgency: Urgency) -> Self {
        self.urgency = urgency;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.requested_by.trim().is_empty() {
            return Err(FleetError::Validation("requester name is required".to_string()));
        }
        if self.email.trim().is_empty() {
            return Err(FleetError::Validation("email is required".to_string()));
        }
        self.position.validate()
    }
}

/// Local receipt for a submitted bin request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestReceipt {
    /// Locally minted reference, quoted back to the requester
    pub reference: String,
    pub request: BinRequest,
    pub received_at: DateTime<Utc>,
    /// False when the request was only acknowledged client-side
    pub persisted: bool,
}

/// The backend emits either RFC 3339 or naive ISO-8601 timestamps; naive ones are UTC.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
            None => Ok(None),
        }
    }
}
