//! Durable per-field storage of the single timer session.
//!
//! Every field lives under its own key so a relaunch reads back exactly what
//! the previous process wrote. The store never reports failures to callers:
//! a read that fails or finds garbage yields the field's zero value, a write
//! that fails is dropped, and both are logged. With no backend at all the
//! store behaves as if no session was ever started.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::database::Database;
use super::kv::{KvBackend, MemoryKv};

/// Persisted session fields and their storage keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionField {
    IsTimerRunning,
    IsBreakTime,
    CurrentItemIndex,
    PhaseStartTime,
    PhaseDuration,
    SelectedItems,
    FocusMinutes,
    BreakMinutes,
}

impl SessionField {
    pub fn key(self) -> &'static str {
        match self {
            SessionField::IsTimerRunning => "isTimerRunning",
            SessionField::IsBreakTime => "isBreakTime",
            SessionField::CurrentItemIndex => "currentItemIndex",
            SessionField::PhaseStartTime => "phaseStartTime",
            SessionField::PhaseDuration => "phaseDuration",
            SessionField::SelectedItems => "selectedItems",
            SessionField::FocusMinutes => "focusMinutes",
            SessionField::BreakMinutes => "breakMinutes",
        }
    }
}

/// The whole session record as read from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub running: bool,
    pub items: Vec<String>,
    pub current_item_index: usize,
    pub is_break: bool,
    pub phase_start_time: Option<DateTime<Utc>>,
    pub phase_duration_secs: u64,
    pub focus_minutes: u32,
    pub break_minutes: u32,
}

impl Session {
    /// The "no session" record.
    pub fn idle() -> Self {
        Self::default()
    }

    /// True when a running record satisfies every running invariant.
    pub fn is_active(&self) -> bool {
        self.running
            && !self.items.is_empty()
            && self.current_item_index < self.items.len()
            && self.phase_start_time.is_some()
            && self.phase_duration_secs > 0
    }

    /// The item the current (or next, during a break) focus phase is for.
    pub fn current_item(&self) -> Option<&str> {
        self.items.get(self.current_item_index).map(String::as_str)
    }
}

/// Typed access to the persisted session fields.
pub struct SessionStore {
    backend: Option<Box<dyn KvBackend + Send>>,
}

impl SessionStore {
    /// Wrap a backend.
    pub fn new(backend: impl KvBackend + Send + 'static) -> Self {
        Self {
            backend: Some(Box::new(backend)),
        }
    }

    /// A process-lifetime store.
    pub fn in_memory() -> Self {
        Self::new(MemoryKv::new())
    }

    /// A store with no backend: reads return defaults and writes are dropped.
    pub fn unavailable() -> Self {
        Self { backend: None }
    }

    /// Open the on-disk store, falling back to memory if the database
    /// cannot be opened.
    pub fn open() -> Self {
        match Database::open() {
            Ok(db) => Self::new(db),
            Err(e) => {
                tracing::warn!(error = %e, "session storage unavailable, state will not survive a restart");
                Self::in_memory()
            }
        }
    }

    /// Whether a backend is attached.
    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    // ── raw access ───────────────────────────────────────────────────

    fn read(&self, field: SessionField) -> Option<String> {
        let backend = self.backend.as_ref()?;
        match backend.get(field.key()) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = field.key(), error = %e, "session read failed");
                None
            }
        }
    }

    fn write(&mut self, field: SessionField, value: Option<String>) {
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        let result = match value {
            Some(v) => backend.set(field.key(), &v),
            None => backend.remove(field.key()),
        };
        if let Err(e) = result {
            tracing::warn!(key = field.key(), error = %e, "session write dropped");
        }
    }

    /// Write several fields through one backend batch, so a crash leaves
    /// either all of them or none.
    fn write_all(&mut self, writes: &[(SessionField, Option<String>)]) {
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        let batch: Vec<(&str, Option<&str>)> = writes
            .iter()
            .map(|(field, value)| (field.key(), value.as_deref()))
            .collect();
        if let Err(e) = backend.set_many(&batch) {
            tracing::warn!(fields = writes.len(), error = %e, "session write dropped");
        }
    }

    fn read_parsed<T: std::str::FromStr + Default>(&self, field: SessionField) -> T {
        match self.read(field) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(key = field.key(), value = %raw, "corrupt session value, using default");
                T::default()
            }),
            None => T::default(),
        }
    }

    // ── fields ───────────────────────────────────────────────────────

    pub fn is_timer_running(&self) -> bool {
        self.read_parsed(SessionField::IsTimerRunning)
    }

    pub fn set_timer_running(&mut self, value: bool) {
        self.write(SessionField::IsTimerRunning, Some(value.to_string()));
    }

    pub fn is_break_time(&self) -> bool {
        self.read_parsed(SessionField::IsBreakTime)
    }

    pub fn set_break_time(&mut self, value: bool) {
        self.write(SessionField::IsBreakTime, Some(value.to_string()));
    }

    pub fn current_item_index(&self) -> usize {
        self.read_parsed(SessionField::CurrentItemIndex)
    }

    pub fn set_current_item_index(&mut self, value: usize) {
        self.write(SessionField::CurrentItemIndex, Some(value.to_string()));
    }

    pub fn phase_start_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.read(SessionField::PhaseStartTime)?;
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            Err(_) => {
                tracing::warn!(value = %raw, "corrupt phaseStartTime, treating as absent");
                None
            }
        }
    }

    /// `None` removes the key.
    pub fn set_phase_start_time(&mut self, value: Option<DateTime<Utc>>) {
        self.write(SessionField::PhaseStartTime, value.map(|dt| dt.to_rfc3339()));
    }

    /// Length of the current phase in seconds.
    pub fn phase_duration(&self) -> u64 {
        self.read_parsed(SessionField::PhaseDuration)
    }

    pub fn set_phase_duration(&mut self, secs: u64) {
        self.write(SessionField::PhaseDuration, Some(secs.to_string()));
    }

    pub fn selected_items(&self) -> Vec<String> {
        let Some(raw) = self.read(SessionField::SelectedItems) else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "corrupt selectedItems, using empty list");
            Vec::new()
        })
    }

    pub fn set_selected_items(&mut self, items: &[String]) {
        match serde_json::to_string(items) {
            Ok(json) => self.write(SessionField::SelectedItems, Some(json)),
            Err(e) => tracing::warn!(error = %e, "could not encode selectedItems"),
        }
    }

    pub fn focus_minutes(&self) -> u32 {
        self.read_parsed(SessionField::FocusMinutes)
    }

    pub fn set_focus_minutes(&mut self, minutes: u32) {
        self.write(SessionField::FocusMinutes, Some(minutes.to_string()));
    }

    pub fn break_minutes(&self) -> u32 {
        self.read_parsed(SessionField::BreakMinutes)
    }

    pub fn set_break_minutes(&mut self, minutes: u32) {
        self.write(SessionField::BreakMinutes, Some(minutes.to_string()));
    }

    // ── whole record ─────────────────────────────────────────────────

    pub fn load(&self) -> Session {
        Session {
            running: self.is_timer_running(),
            items: self.selected_items(),
            current_item_index: self.current_item_index(),
            is_break: self.is_break_time(),
            phase_start_time: self.phase_start_time(),
            phase_duration_secs: self.phase_duration(),
            focus_minutes: self.focus_minutes(),
            break_minutes: self.break_minutes(),
        }
    }

    /// Persist every field of `session` in a single batch.
    pub fn save(&mut self, session: &Session) {
        let items = match serde_json::to_string(&session.items) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "could not encode selectedItems, session not saved");
                return;
            }
        };
        self.write_all(&[
            (SessionField::IsTimerRunning, Some(session.running.to_string())),
            (SessionField::IsBreakTime, Some(session.is_break.to_string())),
            (
                SessionField::CurrentItemIndex,
                Some(session.current_item_index.to_string()),
            ),
            (
                SessionField::PhaseStartTime,
                session.phase_start_time.map(|dt| dt.to_rfc3339()),
            ),
            (
                SessionField::PhaseDuration,
                Some(session.phase_duration_secs.to_string()),
            ),
            (SessionField::SelectedItems, Some(items)),
            (SessionField::FocusMinutes, Some(session.focus_minutes.to_string())),
            (SessionField::BreakMinutes, Some(session.break_minutes.to_string())),
        ]);
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("available", &self.is_available())
            .finish()
    }
}
