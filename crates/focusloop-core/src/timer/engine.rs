//! Phase engine implementation.
//!
//! The phase engine is a wall-clock-based state machine over the persisted
//! session. It owns no timer thread and keeps no state of its own: every
//! call reads the session from the store, compares the phase start with the
//! clock, and writes back whatever changed. A process that is suspended or
//! killed picks up exactly where the stored fields say it is.
//!
//! ## State Transitions
//!
//! ```text
//! Idle          --start-->            Focusing(0)
//! Focusing(i)   --elapsed-->          OnBreak(i)
//! OnBreak(i)    --elapsed, i<last-->  Focusing(i+1)
//! OnBreak(last) --elapsed-->          Idle (AllCompleted)
//! any           --stop-->             Idle
//! ```
//!
//! `reconcile()` performs at most one transition per call and starts the new
//! phase at reconciliation time, so boundaries that elapsed while nobody was
//! asking collapse into one. `catch_up()` instead replays them, anchoring
//! each phase at the instant the previous one ended.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = PhaseEngine::new(SessionStore::open());
//! engine.start(&["Reading".into()], 25, 5)?;
//! // On every UI tick:
//! if engine.remaining_seconds() == 0 {
//!     let event = engine.reconcile();
//! }
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::clock::{Clock, SystemClock};
use crate::error::ValidationError;
use crate::events::Event;
use crate::storage::{Session, SessionStore};

/// Where the session currently is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Focusing { index: usize, item: String },
    OnBreak { index: usize },
}

/// Outcome of a single `reconcile()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseEvent {
    /// The current phase has time left; nothing changed.
    Continuing,
    /// Focus elapsed, a break began.
    BreakStarted,
    /// A break elapsed, focus on the next item began.
    FocusStarted,
    /// The last item's break elapsed; the session is gone.
    AllCompleted,
}

/// Start instant given to the phase that follows an elapsed one.
#[derive(Debug, Clone, Copy)]
enum Anchor {
    /// The moment of reconciliation.
    Now,
    /// The moment the elapsed phase ended.
    Boundary,
}

/// The persisted focus/break state machine.
#[derive(Debug)]
pub struct PhaseEngine<C: Clock = SystemClock> {
    store: SessionStore,
    clock: C,
}

impl PhaseEngine<SystemClock> {
    pub fn new(store: SessionStore) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<C: Clock> PhaseEngine<C> {
    pub fn with_clock(store: SessionStore, clock: C) -> Self {
        Self { store, clock }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The stored session record.
    pub fn session(&self) -> Session {
        self.store.load()
    }

    pub fn is_running(&self) -> bool {
        self.session().is_active()
    }

    pub fn phase(&self) -> Phase {
        phase_of(&self.session())
    }

    /// Seconds left in the current phase, 0 when idle. Never mutates.
    pub fn remaining_seconds(&self) -> u64 {
        remaining_at(&self.session(), self.clock.now())
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let session = self.session();
        let now = self.clock.now();
        let active = session.is_active();
        Event::StateSnapshot {
            phase: phase_of(&session),
            remaining_secs: remaining_at(&session, now),
            total_secs: if active { session.phase_duration_secs } else { 0 },
            item_count: if active { session.items.len() } else { 0 },
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a session on `items`, focusing on the first one.
    ///
    /// # Errors
    ///
    /// Rejects an empty item list or a zero duration. Nothing is written
    /// in that case, so a running session keeps running.
    pub fn start(
        &mut self,
        items: &[String],
        focus_minutes: u32,
        break_minutes: u32,
    ) -> Result<(), ValidationError> {
        if items.is_empty() {
            return Err(ValidationError::EmptyCollection("items".into()));
        }
        if focus_minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "focus_minutes".into(),
                message: "must be greater than zero".into(),
            });
        }
        if break_minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "break_minutes".into(),
                message: "must be greater than zero".into(),
            });
        }

        let now = self.clock.now();
        self.store.save(&Session {
            running: true,
            items: items.to_vec(),
            current_item_index: 0,
            is_break: false,
            phase_start_time: Some(now),
            phase_duration_secs: minutes_to_secs(focus_minutes),
            focus_minutes,
            break_minutes,
        });

        tracing::info!(
            items = items.len(),
            focus_minutes,
            break_minutes,
            "session started"
        );
        Ok(())
    }

    /// Advance at most one phase if the current one has elapsed.
    ///
    /// The new phase starts now, whatever time has already passed beyond
    /// the boundary.
    pub fn reconcile(&mut self) -> PhaseEvent {
        self.advance(Anchor::Now)
    }

    /// Replay every phase boundary that has elapsed, returning the
    /// transitions in order.
    ///
    /// Unlike `reconcile()`, each replayed phase starts at the instant the
    /// previous one ended, so a long suspension walks through all the
    /// phases that fit into it. Stops at the first phase with time left or
    /// when the session completes.
    pub fn catch_up(&mut self) -> Vec<PhaseEvent> {
        let limit = self.session().items.len().saturating_mul(2).max(1);
        let mut events = Vec::new();
        for _ in 0..limit {
            match self.catch_up_step() {
                PhaseEvent::Continuing => break,
                PhaseEvent::AllCompleted => {
                    events.push(PhaseEvent::AllCompleted);
                    break;
                }
                event => events.push(event),
            }
        }
        events
    }

    /// One transition of `catch_up()`: like `reconcile()`, but the next
    /// phase starts where the elapsed one ended.
    pub fn catch_up_step(&mut self) -> PhaseEvent {
        self.advance(Anchor::Boundary)
    }

    fn advance(&mut self, anchor: Anchor) -> PhaseEvent {
        let session = self.store.load();
        if !session.running {
            return PhaseEvent::Continuing;
        }
        if !session.is_active() {
            tracing::warn!(?session, "inconsistent stored session, resetting to idle");
            self.stop();
            return PhaseEvent::Continuing;
        }

        let now = self.clock.now();
        if remaining_at(&session, now) > 0 {
            return PhaseEvent::Continuing;
        }

        let next_start = match (anchor, session.phase_start_time) {
            (Anchor::Boundary, Some(start)) => {
                let elapsed_end = start + Duration::seconds(session.phase_duration_secs as i64);
                elapsed_end.min(now)
            }
            _ => now,
        };

        // Each transition is one whole-record save; a kill never leaves a
        // new phase flag next to the old phase's start time.
        if !session.is_break {
            let index = session.current_item_index;
            self.store.save(&Session {
                is_break: true,
                phase_start_time: Some(next_start),
                phase_duration_secs: minutes_to_secs(session.break_minutes),
                ..session
            });
            tracing::info!(index, "break started");
            return PhaseEvent::BreakStarted;
        }

        let next = session.current_item_index + 1;
        if next < session.items.len() {
            tracing::info!(index = next, item = %session.items[next], "focus started");
            self.store.save(&Session {
                is_break: false,
                current_item_index: next,
                phase_start_time: Some(next_start),
                phase_duration_secs: minutes_to_secs(session.focus_minutes),
                ..session
            });
            PhaseEvent::FocusStarted
        } else {
            self.stop();
            tracing::info!("all items completed");
            PhaseEvent::AllCompleted
        }
    }

    /// Reset to idle. Idempotent.
    pub fn stop(&mut self) {
        self.store.save(&Session::idle());
        tracing::debug!("session stopped");
    }
}

fn minutes_to_secs(minutes: u32) -> u64 {
    u64::from(minutes).saturating_mul(60)
}

fn phase_of(session: &Session) -> Phase {
    if !session.is_active() {
        return Phase::Idle;
    }
    if session.is_break {
        Phase::OnBreak {
            index: session.current_item_index,
        }
    } else {
        Phase::Focusing {
            index: session.current_item_index,
            item: session.items[session.current_item_index].clone(),
        }
    }
}

/// A clock that moved backward counts as zero elapsed time.
fn remaining_at(session: &Session, now: DateTime<Utc>) -> u64 {
    if !session.is_active() {
        return 0;
    }
    let Some(start) = session.phase_start_time else {
        return 0;
    };
    let elapsed = (now - start).num_seconds().max(0) as u64;
    session.phase_duration_secs.saturating_sub(elapsed)
}
