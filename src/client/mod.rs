// Module declarations
mod builder;
mod connection;
mod core;
mod state;

// Public API exports
pub use builder::{
    ENV_BACKEND_URL, ENV_RECONNECT_MS, ENV_STORAGE_DIR, FleetClientBuilder, FleetClientOptions,
};
pub use connection::{ConnectionManager, ConnectionState, StatusCallback};
pub use self::core::FleetClient;
pub use state::ClientState;
