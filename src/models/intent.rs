use serde::{Deserialize, Serialize};

/// Flow-opening intents. Everything else is handed back to the caller
/// (FAQ, staff handoff).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Reserve,
    Modify,
    Cancel,
}
