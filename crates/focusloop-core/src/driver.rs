//! Orchestration around the phase engine.
//!
//! The engine only knows about stored state and the clock. The driver is
//! what a presentation layer talks to: it turns the two outside stimuli
//! (a once-a-second tick while visible, and regaining the foreground) into
//! engine calls, arms and cancels alerts around them, records finished
//! focus phases, and reports what happened as [`Event`]s.

use chrono::Duration;

use crate::alerts::{AlertChannel, AlertKind};
use crate::error::ValidationError;
use crate::events::Event;
use crate::storage::{Database, Session};
use crate::timer::{Clock, PhaseEngine, PhaseEvent};

pub struct TimerDriver<C: Clock, A: AlertChannel> {
    engine: PhaseEngine<C>,
    alerts: A,
    history: Option<Database>,
    catch_up_on_foreground: bool,
}

impl<C: Clock, A: AlertChannel> TimerDriver<C, A> {
    pub fn new(engine: PhaseEngine<C>, alerts: A) -> Self {
        Self {
            engine,
            alerts,
            history: None,
            catch_up_on_foreground: false,
        }
    }

    /// Record each completed focus phase in `db`.
    pub fn with_history(mut self, db: Database) -> Self {
        self.history = Some(db);
        self
    }

    /// Replay every elapsed phase on `on_foreground()` instead of one.
    pub fn with_catch_up(mut self, enabled: bool) -> Self {
        self.catch_up_on_foreground = enabled;
        self
    }

    pub fn engine(&self) -> &PhaseEngine<C> {
        &self.engine
    }

    pub fn alerts(&self) -> &A {
        &self.alerts
    }

    pub fn history(&self) -> Option<&Database> {
        self.history.as_ref()
    }

    /// Start a session and arm the first focus alert.
    ///
    /// # Errors
    ///
    /// Propagates the engine's precondition errors; no alert is touched then.
    pub fn start(
        &mut self,
        items: &[String],
        focus_minutes: u32,
        break_minutes: u32,
    ) -> Result<Event, ValidationError> {
        self.engine.start(items, focus_minutes, break_minutes)?;
        self.alerts.cancel_all_alerts();
        self.alerts
            .schedule_alert(AlertKind::Focus, self.engine.remaining_seconds());
        Ok(Event::SessionStarted {
            items: items.to_vec(),
            focus_minutes,
            break_minutes,
            at: self.engine.now(),
        })
    }

    /// Stop the session and cancel whatever alert is pending.
    pub fn stop(&mut self) -> Event {
        self.engine.stop();
        self.alerts.cancel_all_alerts();
        Event::SessionStopped {
            at: self.engine.now(),
        }
    }

    /// Once-a-second poll while the timer is on screen.
    pub fn on_tick(&mut self) -> Vec<Event> {
        if !self.engine.is_running() || self.engine.remaining_seconds() > 0 {
            return Vec::new();
        }
        self.step(false).into_iter().collect()
    }

    /// The process came back to the foreground (or was relaunched).
    ///
    /// Reconciles once, or replays the whole backlog when catch-up is
    /// enabled, then re-arms the alert for the phase now in progress since
    /// alerts from a previous process are gone.
    pub fn on_foreground(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        if self.catch_up_on_foreground {
            let limit = self.engine.session().items.len().saturating_mul(2).max(1);
            for _ in 0..limit {
                match self.step(true) {
                    Some(event) => {
                        let done = matches!(event, Event::AllCompleted { .. });
                        events.push(event);
                        if done {
                            break;
                        }
                    }
                    None => break,
                }
            }
        } else {
            events.extend(self.step(false));
        }

        if events.is_empty() {
            self.rearm();
        }
        events
    }

    fn rearm(&mut self) {
        let session = self.engine.session();
        if !session.is_active() {
            return;
        }
        let kind = if session.is_break {
            AlertKind::Break
        } else {
            AlertKind::Focus
        };
        self.alerts.cancel_all_alerts();
        self.alerts
            .schedule_alert(kind, self.engine.remaining_seconds());
    }

    /// One transition, translated into an event with alerts and history
    /// updated. `None` when the phase still has time left.
    fn step(&mut self, from_boundary: bool) -> Option<Event> {
        let before = self.engine.session();
        let outcome = if from_boundary {
            self.engine.catch_up_step()
        } else {
            self.engine.reconcile()
        };
        let after = self.engine.session();
        let at = after.phase_start_time.unwrap_or_else(|| self.engine.now());

        match outcome {
            PhaseEvent::Continuing => None,
            PhaseEvent::BreakStarted => {
                self.record_focus(&before);
                self.alerts.cancel_all_alerts();
                self.alerts
                    .schedule_alert(AlertKind::Break, self.engine.remaining_seconds());
                Some(Event::BreakStarted {
                    index: after.current_item_index,
                    duration_secs: after.phase_duration_secs,
                    at,
                })
            }
            PhaseEvent::FocusStarted => {
                self.alerts.cancel_all_alerts();
                self.alerts
                    .schedule_alert(AlertKind::Focus, self.engine.remaining_seconds());
                Some(Event::FocusStarted {
                    index: after.current_item_index,
                    item: after.current_item().unwrap_or_default().to_string(),
                    duration_secs: after.phase_duration_secs,
                    at,
                })
            }
            PhaseEvent::AllCompleted => {
                self.alerts.cancel_all_alerts();
                Some(Event::AllCompleted { at })
            }
        }
    }

    fn record_focus(&self, focus: &Session) {
        let (Some(db), Some(item), Some(started_at)) = (
            self.history.as_ref(),
            focus.current_item(),
            focus.phase_start_time,
        ) else {
            return;
        };
        let ended_at = started_at + Duration::seconds(focus.phase_duration_secs as i64);
        if let Err(e) = db.save_record(item, started_at, ended_at) {
            tracing::warn!(item, error = %e, "could not record focus phase");
        }
    }
}
