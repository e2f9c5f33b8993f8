//! # focusloop Core Library
//!
//! This library provides the core logic for the focusloop focus/break
//! interval timer. The CLI binary is a thin layer over it.
//!
//! ## Architecture
//!
//! - **Phase Engine**: A wall-clock-based state machine over a persisted
//!   session. It has no timer thread; it answers "how long is left" and
//!   "has the phase ended" from stored state and the current time, so it
//!   reports the same thing after the process was suspended or relaunched.
//! - **Storage**: SQLite-backed key/value session store, item catalog and
//!   focus history, plus TOML-based configuration
//! - **Driver**: Turns ticks and foreground events into engine calls and
//!   schedules alerts around them
//!
//! ## Key Components
//!
//! - [`PhaseEngine`]: Core phase state machine
//! - [`SessionStore`]: Durable per-field session storage
//! - [`TimerDriver`]: Tick/foreground orchestration
//! - [`Database`]: SQLite file with session, catalog and history tables
//! - [`Config`]: Application configuration management

pub mod alerts;
pub mod driver;
pub mod error;
pub mod events;
pub mod storage;
pub mod timer;

pub use alerts::{AlertChannel, AlertKind, LogAlerts, SilentAlerts, TokioAlerts};
pub use driver::TimerDriver;
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use events::Event;
pub use storage::{CatalogItem, Config, Database, FocusRecord, ItemCatalog, Session, SessionStore};
pub use timer::{Clock, ManualClock, Phase, PhaseEngine, PhaseEvent, SystemClock};
