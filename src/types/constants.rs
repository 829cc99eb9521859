/// Push frame type strings (magic strings layer)
pub mod frame_types {
    pub const BIN_UPDATE: &str = "bin_update";
}

/// REST paths, relative to the API base
pub mod paths {
    pub const API_PREFIX: &str = "/api";
    pub const PUSH_CHANNEL: &str = "/ws";
    pub const BINS: &str = "/bins";
    pub const ALERTS: &str = "/alerts";
    pub const DASHBOARD_STATS: &str = "/dashboard/stats";
    pub const INITIALIZE_DEMO_DATA: &str = "/initialize-demo-data";
    pub const ROUTE_OPTIMIZE: &str = "/route/optimize";
    pub const AUTH_LOGIN: &str = "/auth/login";
    pub const AUTH_REGISTER: &str = "/auth/register";
}

/// Session storage keys
pub const STORAGE_USER_KEY: &str = "swachagrid_user";
pub const STORAGE_TOKEN_KEY: &str = "swachagrid_token";

/// Default delay between losing the push channel and the next attempt (milliseconds)
pub const DEFAULT_RECONNECT_DELAY: u64 = 5000;

/// Demo credentials seeded by the backend
pub const DEMO_ADMIN_EMAIL: &str = "admin@swachhgrid.com";
pub const DEMO_ADMIN_PASSWORD: &str = "admin123";
pub const DEMO_USER_EMAIL: &str = "user@swachhgrid.com";
pub const DEMO_USER_PASSWORD: &str = "user123";

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LEN: usize = 6;

/// Fallback shown when the server gives no detail for an auth failure
pub const AUTH_FALLBACK_MESSAGE: &str = "Authentication failed. Please try again.";

/// Defaults for a freshly placed bin
pub const DEFAULT_BIN_CAPACITY: u32 = 100;
pub const DEFAULT_LOCATION_TYPE: &str = "street";
