//! Response envelope shared by every action
//!
//! Every controller answers with `{"status": "success" | "error", ...}`.
//! The gateway only ever looks at `status`; everything else is opaque
//! action-specific data that is passed through verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome reported by a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Operation succeeded
    Success,
    /// Operation failed at the application level
    Error,
}

/// Uniform result shape returned by controllers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Mandatory status field
    pub status: Status,
    /// Action-specific payload, flattened next to `status`
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Envelope {
    /// Bare success envelope
    #[must_use]
    pub fn success() -> Self {
        Self {
            status: Status::Success,
            data: Map::new(),
        }
    }

    /// Error envelope carrying a `message`
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            data: Map::new(),
        }
        .with("message", message.into())
    }

    /// Envelope with the given status and no payload
    #[must_use]
    pub fn from_status(status: Status) -> Self {
        Self {
            status,
            data: Map::new(),
        }
    }

    /// Attach a payload field
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Whether the controller reported an application-level failure
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }

    /// Serialize to JSON bytes. Non-ASCII text is written as UTF-8, not
    /// `\u` escaped.
    pub fn to_json(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
