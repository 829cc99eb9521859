// Infrastructure module - background services and the HTTP collaborator
pub mod http;
pub mod task_manager;
pub mod timer;

pub use http::{HttpApi, api_endpoint, http_to_ws_endpoint};
pub use task_manager::TaskManager;
pub use timer::{ReconnectPolicy, ReconnectTimer};
