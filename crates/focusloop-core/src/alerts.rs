//! Alert channel.
//!
//! The driver arms one alert per phase so the user hears about the phase
//! ending even when nothing is polling. Scheduling is fire-and-forget: a
//! channel that cannot arm an alert logs it and carries on, and nothing it
//! does feeds back into the phase engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

/// Which phase an alert announces the end of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Focus,
    Break,
}

impl AlertKind {
    pub fn title(self) -> &'static str {
        match self {
            AlertKind::Focus => "Focus time is up!",
            AlertKind::Break => "Break is over!",
        }
    }

    pub fn body(self) -> &'static str {
        match self {
            AlertKind::Focus => "Come back to start your break.",
            AlertKind::Break => "Come back and check in.",
        }
    }
}

/// Something that can fire an alert after a delay.
pub trait AlertChannel {
    fn schedule_alert(&mut self, kind: AlertKind, after_secs: u64);
    fn cancel_all_alerts(&mut self);
}

impl<A: AlertChannel + ?Sized> AlertChannel for Box<A> {
    fn schedule_alert(&mut self, kind: AlertKind, after_secs: u64) {
        (**self).schedule_alert(kind, after_secs);
    }

    fn cancel_all_alerts(&mut self) {
        (**self).cancel_all_alerts();
    }
}

/// Drops every alert. Used when alerts are disabled in the config.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAlerts;

impl AlertChannel for SilentAlerts {
    fn schedule_alert(&mut self, _kind: AlertKind, _after_secs: u64) {}
    fn cancel_all_alerts(&mut self) {}
}

/// Logs alerts instead of firing them. Suits one-shot commands whose
/// process exits long before any alert would be due.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlerts;

impl AlertChannel for LogAlerts {
    fn schedule_alert(&mut self, kind: AlertKind, after_secs: u64) {
        tracing::info!(?kind, after_secs, "alert due");
    }

    fn cancel_all_alerts(&mut self) {
        tracing::debug!("alerts cancelled");
    }
}

/// Fires alerts from tokio timer tasks on the current runtime: the terminal
/// bell plus the alert text on stderr.
#[derive(Debug, Default)]
pub struct TokioAlerts {
    pending: Vec<JoinHandle<()>>,
}

impl TokioAlerts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts armed and not yet fired or cancelled.
    pub fn pending(&self) -> usize {
        self.pending.iter().filter(|h| !h.is_finished()).count()
    }
}

impl AlertChannel for TokioAlerts {
    fn schedule_alert(&mut self, kind: AlertKind, after_secs: u64) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!(?kind, error = %e, "no runtime, alert not armed");
                return;
            }
        };
        self.pending.retain(|h| !h.is_finished());
        self.pending.push(handle.spawn(async move {
            tokio::time::sleep(Duration::from_secs(after_secs)).await;
            eprintln!("\x07{} {}", kind.title(), kind.body());
            tracing::info!(?kind, "alert fired");
        }));
        tracing::debug!(?kind, after_secs, "alert armed");
    }

    fn cancel_all_alerts(&mut self) {
        for handle in self.pending.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for TokioAlerts {
    fn drop(&mut self) {
        self.cancel_all_alerts();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_aborts_pending_alerts() {
        let mut alerts = TokioAlerts::new();
        alerts.schedule_alert(AlertKind::Focus, 3600);
        alerts.schedule_alert(AlertKind::Break, 3600);
        assert_eq!(alerts.pending(), 2);
        alerts.cancel_all_alerts();
        assert_eq!(alerts.pending(), 0);
    }

    #[test]
    fn scheduling_outside_a_runtime_is_dropped() {
        let mut alerts = TokioAlerts::new();
        alerts.schedule_alert(AlertKind::Focus, 1);
        assert_eq!(alerts.pending(), 0);
    }
}
