//! What the agent observed and how much focus time it counted.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_ledger, create_shared_ledger_with_persistence, format_duration, FocusLedger,
    LedgerStats, SharedLedger,
};
