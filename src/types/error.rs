use crate::session::Role;
use thiserror::Error;

/// Errors that can occur when using the SwachhGrid client.
#[derive(Error, Debug)]
pub enum FleetError {
    /// WebSocket protocol error (handshake failed, invalid frame, etc.)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// General connection error with descriptive message
    #[error("Connection error: {0}")]
    Connection(String),

    /// Login or registration rejected, carrying the server detail or a fallback message
    #[error("Authentication error: {0}")]
    Auth(String),

    /// HTTP transport error from the REST collaborator
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The REST collaborator answered with a non-success status
    #[error("Request to {path} failed with status {status}")]
    Status { path: String, status: u16 },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing error (malformed service base address)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Session storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// A role-gated operation was attempted by a role that may not perform it
    #[error("Role '{role}' may not {action}")]
    Forbidden { role: Role, action: &'static str },

    /// Operation requires an authenticated session
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Form or credential input rejected before reaching the server
    #[error("Validation error: {0}")]
    Validation(String),

    /// A bin snapshot violated id uniqueness or the fill level range
    #[error("Invalid bin snapshot: {0}")]
    InvalidSnapshot(String),

    /// The local acknowledgment stands, but the server did not confirm it
    #[error("Server did not confirm acknowledgment of alert {id}: {source}")]
    AcknowledgeFailed {
        id: String,
        #[source]
        source: Box<FleetError>,
    },
}

/// Convenience type alias for `Result<T, FleetError>`.
pub type Result<T> = std::result::Result<T, FleetError>;
