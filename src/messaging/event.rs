use crate::types::constants::frame_types;

/// Type-safe push frame kinds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Full bin snapshot with optional new alerts
    BinUpdate,

    /// Any frame type this client does not handle
    Other(String),
}

impl FrameKind {
    /// Parse a frame `type` string into a FrameKind
    pub fn parse(s: &str) -> Self {
        match s {
            frame_types::BIN_UPDATE => Self::BinUpdate,
            _ => Self::Other(s.to_string()),
        }
    }

    /// Convert kind to its wire string
    pub fn as_str(&self) -> &str {
        match self {
            Self::BinUpdate => frame_types::BIN_UPDATE,
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for FrameKind {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
