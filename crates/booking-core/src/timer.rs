//! Pausable attendance session clock.
//!
//! Elapsed time is pure arithmetic over the stored instants, so a client can
//! re-sync its display at any moment without accumulating wall-clock drift:
//! `elapsed = (paused_at ?? now) - started_at - paused_total`, floored at
//! zero and truncated to whole seconds.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::status::TimerStatus;

/// Invalid transition on the session clock.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("timer cannot {action} while {status}")]
pub struct TimerError {
    pub action: &'static str,
    pub status: TimerStatus,
}

/// Snapshot of the session clock as persisted on the appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerState {
    pub status: TimerStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub paused_at: Option<DateTime<Utc>>,
    pub paused_total_seconds: i64,
}

impl TimerState {
    /// A clock that has never been started.
    pub fn idle() -> Self {
        Self {
            status: TimerStatus::Idle,
            started_at: None,
            paused_at: None,
            paused_total_seconds: 0,
        }
    }

    /// Seconds of active (non-paused) time between start and `now`.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        let Some(started_at) = self.started_at else {
            return 0;
        };
        let active_until = self.paused_at.unwrap_or(now);
        let active_ms = (active_until - started_at).num_milliseconds();
        let elapsed_ms = active_ms - self.paused_total_seconds * 1000;
        elapsed_ms.max(0) / 1000
    }

    /// `idle -> running`.
    pub fn start(self, now: DateTime<Utc>) -> Result<Self, TimerError> {
        if self.status != TimerStatus::Idle {
            return Err(TimerError {
                action: "start",
                status: self.status,
            });
        }
        Ok(Self {
            status: TimerStatus::Running,
            started_at: Some(now),
            paused_at: None,
            paused_total_seconds: 0,
        })
    }

    /// `running -> paused`.
    pub fn pause(self, now: DateTime<Utc>) -> Result<Self, TimerError> {
        if self.status != TimerStatus::Running {
            return Err(TimerError {
                action: "pause",
                status: self.status,
            });
        }
        Ok(Self {
            status: TimerStatus::Paused,
            paused_at: Some(now),
            ..self
        })
    }

    /// `paused -> running`, accumulating the pause duration.
    pub fn resume(self, now: DateTime<Utc>) -> Result<Self, TimerError> {
        if self.status != TimerStatus::Paused {
            return Err(TimerError {
                action: "resume",
                status: self.status,
            });
        }
        let paused_for = self
            .paused_at
            .map(|paused_at| (now - paused_at).num_seconds().max(0))
            .unwrap_or(0);
        Ok(Self {
            status: TimerStatus::Running,
            paused_at: None,
            paused_total_seconds: self.paused_total_seconds + paused_for,
            ..self
        })
    }

    /// `running|paused -> finished`. Returns the terminal state together with
    /// the captured billable seconds; the state never mutates afterwards.
    pub fn finish(self, now: DateTime<Utc>) -> Result<(Self, i64), TimerError> {
        if !matches!(self.status, TimerStatus::Running | TimerStatus::Paused) {
            return Err(TimerError {
                action: "finish",
                status: self.status,
            });
        }
        let actual_seconds = self.elapsed_seconds(now);
        Ok((
            Self {
                status: TimerStatus::Finished,
                ..self
            },
            actual_seconds,
        ))
    }
}
