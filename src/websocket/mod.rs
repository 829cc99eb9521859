mod factory;

pub use factory::{PushStream, WebSocketFactory};
