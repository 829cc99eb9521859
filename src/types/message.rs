use crate::messaging::FrameKind;
use crate::types::model::{Alert, Bin};
use crate::types::{FleetError, Result};
use serde::{Deserialize, Serialize};

/// Body of a `bin_update` frame: a full bin snapshot plus newly raised alerts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinUpdate {
    pub bins: Vec<Bin>,
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

/// A decoded server-to-client push frame
#[derive(Debug, Clone, PartialEq)]
pub enum PushFrame {
    BinUpdate(BinUpdate),
}

impl PushFrame {
    pub fn kind(&self) -> FrameKind {
        match self {
            Self::BinUpdate(_) => FrameKind::BinUpdate,
        }
    }

    /// Decodes one text frame.
    ///
    /// Returns `Ok(None)` for well-formed frames of a kind this client does not handle,
    /// and an error for anything that is not a decodable frame.
    pub fn decode(text: &str) -> Result<Option<Self>> {
        let value: serde_json::Value = serde_json::from_str(text)?;

        let Some(kind) = value.get("type").and_then(|t| t.as_str()) else {
            return Err(FleetError::Connection(
                "push frame has no 'type' field".to_string(),
            ));
        };

        match FrameKind::parse(kind) {
            FrameKind::BinUpdate => {
                let update = serde_json::from_value::<BinUpdate>(value)?;
                Ok(Some(Self::BinUpdate(update)))
            }
            FrameKind::Other(other) => {
                tracing::debug!("Ignoring push frame of unhandled type '{}'", other);
                Ok(None)
            }
        }
    }

    pub fn encode(&self) -> Result<String> {
        let mut value = match self {
            Self::BinUpdate(update) => serde_json::to_value(update)?,
        };
        if let Some(object) = value.as_object_mut() {
            object.insert(
                "type".to_string(),
                serde_json::Value::String(self.kind().as_str().to_string()),
            );
        }
        Ok(serde_json::to_string(&value)?)
    }
}
