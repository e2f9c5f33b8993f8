use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::Phase;

/// Every state change the driver observes produces an Event.
/// The CLI prints them as JSON; a GUI would render them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        items: Vec<String>,
        focus_minutes: u32,
        break_minutes: u32,
        at: DateTime<Utc>,
    },
    BreakStarted {
        index: usize,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    FocusStarted {
        index: usize,
        item: String,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    AllCompleted {
        at: DateTime<Utc>,
    },
    SessionStopped {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        remaining_secs: u64,
        total_secs: u64,
        item_count: usize,
        at: DateTime<Utc>,
    },
}
