//! The live timer that becomes a time entry when stopped

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempus_api::models::{EntryCreate, ProjectId};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};

pub const DEFAULT_DESCRIPTION: &str = "Timer entry";

/// `start_instant` is set iff `is_running`; `elapsed_millis` only means
/// something while running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub is_running: bool,
    pub start_instant: Option<DateTime<Utc>>,
    pub description: String,
    pub project_id: Option<ProjectId>,
    pub elapsed_millis: i64,
}

pub struct Stopwatch {
    state: TimerState,
    clock: Arc<dyn Clock>,
    default_description: String,
    ticks: u64,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl Stopwatch {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: TimerState::default(),
            clock,
            default_description: DEFAULT_DESCRIPTION.to_string(),
            ticks: 0,
        }
    }

    /// Rebuild a stopwatch from a saved snapshot. A snapshot that claims to
    /// be running without a start instant is treated as idle.
    pub fn restore(mut state: TimerState, clock: Arc<dyn Clock>) -> Self {
        if state.is_running != state.start_instant.is_some() {
            state = TimerState {
                description: state.description,
                project_id: state.project_id,
                ..TimerState::default()
            };
        }
        let mut stopwatch = Self {
            state,
            ..Self::new(clock)
        };
        stopwatch.tick();
        stopwatch
    }

    pub fn with_default_description(mut self, description: impl Into<String>) -> Self {
        self.default_description = description.into();
        self
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn elapsed_millis(&self) -> i64 {
        self.state.elapsed_millis
    }

    /// Ticks applied since the last start.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Start a run. Starting while already running restarts from now.
    pub fn start(&mut self, description: impl Into<String>, project_id: Option<ProjectId>) {
        if self.state.is_running {
            info!(
                discarded_ms = self.state.elapsed_millis,
                "Stopwatch restarted while running"
            );
        }
        self.state = TimerState {
            is_running: true,
            start_instant: Some(self.clock.now()),
            description: description.into(),
            project_id,
            elapsed_millis: 0,
        };
        self.ticks = 0;
        debug!(project = ?project_id, "Stopwatch started");
    }

    /// Recompute the elapsed time. Returns `None` while idle.
    pub fn tick(&mut self) -> Option<i64> {
        let started = match (self.state.is_running, self.state.start_instant) {
            (true, Some(started)) => started,
            _ => return None,
        };
        let elapsed = (self.clock.now() - started).num_milliseconds();
        // A wall clock stepping backwards must not rewind the display.
        self.state.elapsed_millis = self.state.elapsed_millis.max(elapsed);
        self.ticks += 1;
        Some(self.state.elapsed_millis)
    }

    /// End the run and hand back the entry to persist. The stopwatch is idle
    /// afterwards whatever happens to the returned draft.
    pub fn stop(&mut self) -> Option<EntryCreate> {
        if !self.state.is_running {
            return None;
        }
        let state = std::mem::take(&mut self.state);
        self.ticks = 0;
        let start_date = state.start_instant?;
        let end_date = self.clock.now().max(start_date);

        let description = if state.description.trim().is_empty() {
            self.default_description.clone()
        } else {
            state.description
        };

        info!(
            duration_ms = (end_date - start_date).num_milliseconds(),
            "Stopwatch stopped"
        );
        Some(EntryCreate {
            description,
            project_id: state.project_id,
            start_date,
            end_date,
        })
    }

    /// Label the next run, or the current one retroactively.
    pub fn update_description(&mut self, description: impl Into<String>) {
        self.state.description = description.into();
    }

    pub fn update_project(&mut self, project_id: Option<ProjectId>) {
        self.state.project_id = project_id;
    }
}

/// `HH:MM:SS`, hours unbounded.
pub fn format_elapsed(millis: i64) -> String {
    let total_seconds = millis.max(0) / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
