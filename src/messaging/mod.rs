// Messaging module - push frame kinds
pub mod event;

pub use event::FrameKind;
