//! Lifecycle phases of one import attempt.
//!
//! ```text
//! Empty -> Uploading -> Uploaded -> Confirming -> Confirmed
//!            |                        |
//!            +-> Empty (failure)      +-> Uploaded (failure)
//! ```
//!
//! A reset returns any phase to `Empty`. A confirmed session may be
//! confirmed again with a different mapping.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Empty,
    Uploading,
    Uploaded,
    Confirming,
    Confirmed,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Uploading => "uploading",
            Self::Uploaded => "uploaded",
            Self::Confirming => "confirming",
            Self::Confirmed => "confirmed",
        }
    }

    /// A request is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Uploading | Self::Confirming)
    }

    /// An upload has succeeded and not been reset.
    pub fn has_session(&self) -> bool {
        matches!(self, Self::Uploaded | Self::Confirming | Self::Confirmed)
    }

    /// Phase to fall back to when the in-flight request fails.
    pub fn on_failure(&self) -> Self {
        match self {
            Self::Uploading => Self::Empty,
            Self::Confirming => Self::Uploaded,
            other => *other,
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
