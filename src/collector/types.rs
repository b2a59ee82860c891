//! Activity pulse types for the input observer.
//!
//! A pulse says only that the user touched the keyboard or pointer. No key
//! codes, characters or coordinates are ever captured.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which class of raw input produced a pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// A key went down
    KeyDown,
    /// A pointer button went down (left or right)
    Click,
    /// A scroll wheel or trackpad scroll
    Scroll,
}

/// One user-activity signal.
///
/// The decision engine treats every pulse the same; `kind` and `timestamp`
/// only feed the session ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityPulse {
    /// Input class that produced the pulse
    pub kind: InputKind,
    /// Wall-clock delivery time
    pub timestamp: DateTime<Utc>,
}

impl ActivityPulse {
    pub fn new(kind: InputKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
        }
    }

    pub fn key_down() -> Self {
        Self::new(InputKind::KeyDown)
    }

    pub fn click() -> Self {
        Self::new(InputKind::Click)
    }

    pub fn scroll() -> Self {
        Self::new(InputKind::Scroll)
    }
}
