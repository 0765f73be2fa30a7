//! Per-task start/pause/reset bookkeeping.
//!
//! `time_spent` only changes inside [`Task::pause`], [`Task::complete`],
//! [`Task::reset`] and [`Task::reopen`]. Display refreshes go through
//! [`Task::display_elapsed`], which never writes.

use crate::error::AppError;
use crate::model::{Task, TaskState};

/// Whole seconds between `timer_start_time` and `now_ms`, zero if the clock went backwards.
pub fn elapsed_seconds(timer_start_time: i64, now_ms: i64) -> u64 {
    (now_ms.saturating_sub(timer_start_time).max(0) / 1000) as u64
}

/// Renders `HH:MM:SS`. Hours keep growing past 99.
pub fn format_elapsed(seconds: u64) -> String {
    if seconds == 0 {
        return "00:00:00".to_string();
    }

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

impl Task {
    /// Returns `Ok(false)` when the timer was already running.
    pub fn start(&mut self, now_ms: i64) -> Result<bool, AppError> {
        match self.state {
            TaskState::Completed { .. } => Err(AppError::invalid_input("task already completed")),
            TaskState::Running { .. } => Ok(false),
            TaskState::Idle => {
                self.started_at.get_or_insert(now_ms);
                self.state = TaskState::Running {
                    timer_start_time: now_ms,
                };
                Ok(true)
            }
        }
    }

    /// Folds the running interval into `time_spent`. No-op unless running.
    pub fn pause(&mut self, now_ms: i64) -> bool {
        let TaskState::Running { timer_start_time } = self.state else {
            return false;
        };

        self.time_spent = self
            .time_spent
            .saturating_add(elapsed_seconds(timer_start_time, now_ms));
        self.state = TaskState::Idle;
        true
    }

    /// Keeps `started_at` and any completion stamp.
    pub fn reset(&mut self) {
        self.time_spent = 0;
        if self.is_timer_running() {
            self.state = TaskState::Idle;
        }
    }

    pub fn complete(&mut self, now_ms: i64, user_id: &str) -> bool {
        if self.is_completed() {
            return false;
        }

        self.pause(now_ms);
        self.state = TaskState::Completed {
            completed_at: now_ms,
            completed_by: user_id.to_string(),
        };
        true
    }

    /// Reopening discards all timing data, `started_at` included.
    pub fn reopen(&mut self) -> bool {
        if !self.is_completed() {
            return false;
        }

        self.state = TaskState::Idle;
        self.time_spent = 0;
        self.started_at = None;
        true
    }

    pub fn toggle(&mut self, now_ms: i64, user_id: &str) {
        if self.is_completed() {
            self.reopen();
        } else {
            self.complete(now_ms, user_id);
        }
    }

    pub fn display_elapsed(&self, now_ms: i64) -> u64 {
        match self.state {
            TaskState::Running { timer_start_time } => self
                .time_spent
                .saturating_add(elapsed_seconds(timer_start_time, now_ms)),
            _ => self.time_spent,
        }
    }
}
