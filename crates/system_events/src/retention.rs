//! Retention table
//!
//! Maps a system event type to how many hours its persisted record is kept.
//! Types absent from the table are kept indefinitely. The table is plain
//! data, handed to emitters by constructor, so deployments can load their own
//! from whatever configuration source they use.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::SystemEventType;

/// Per-event-type persistence duration, in hours
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionTable {
    hours: HashMap<SystemEventType, i64>,
}

impl RetentionTable {
    /// An empty table: every event type persists indefinitely
    pub fn empty() -> Self {
        Self {
            hours: HashMap::new(),
        }
    }

    /// Adds or replaces an entry
    pub fn with_hours(mut self, event_type: SystemEventType, hours: i64) -> Self {
        self.hours.insert(event_type, hours);
        self
    }

    /// The persistence duration for an event type; `None` means indefinite
    pub fn persist_hours(&self, event_type: SystemEventType) -> Option<i64> {
        self.hours.get(&event_type).copied()
    }

    /// The expiry instant for an event created at `created`; `None` means the
    /// event never expires
    pub fn expiry_for(
        &self,
        event_type: SystemEventType,
        created: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        self.persist_hours(event_type)
            .map(|hours| created + Duration::hours(hours))
    }
}

impl Default for RetentionTable {
    /// The standard platform retention policy. High-frequency working events
    /// (form data edits, calculation runs) are kept for an hour; login
    /// attempts for thirty days; everything else indefinitely.
    fn default() -> Self {
        Self::empty()
            .with_hours(SystemEventType::QuoteFormDataUpdated, 1)
            .with_hours(SystemEventType::QuoteCalculationCompleted, 1)
            .with_hours(SystemEventType::UserLoginAttemptSucceeded, 720)
            .with_hours(SystemEventType::UserLoginAttemptFailed, 720)
    }
}
