// Session module - authenticated user lifecycle and persistence
mod context;
mod store;

pub use context::{AdminGrant, LoginResponse, Role, SessionContext, UserRecord};
pub use store::SessionStore;

#[cfg(test)]
pub(crate) use store::temp_store;
