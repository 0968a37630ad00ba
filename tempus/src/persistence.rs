use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use tracing::debug;

use crate::stopwatch::TimerState;

const TIMER_FILE: &str = "timer.json";
const LOG_FILE: &str = "tempus.log";

fn data_dir() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "tempus", "Tempus")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;

    let data_dir = proj_dirs.data_dir();
    fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    Ok(data_dir.to_path_buf())
}

pub fn timer_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(TIMER_FILE))
}

/// Where the terminal UI writes its log, since it owns the screen.
pub fn log_path() -> Result<PathBuf> {
    Ok(data_dir()?.join(LOG_FILE))
}

/// What to do with the snapshot file after the timer may have changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotAction {
    Save,
    Clear,
    Keep,
}

impl SnapshotAction {
    /// A running timer is saved. The file is removed only when this process
    /// saw its own run end, so an idle UI leaves a run started elsewhere alone.
    pub fn after(was_running: bool, state: &TimerState) -> Self {
        match (was_running, state.is_running) {
            (_, true) => SnapshotAction::Save,
            (true, false) => SnapshotAction::Clear,
            (false, false) => SnapshotAction::Keep,
        }
    }
}

pub fn sync_timer(was_running: bool, state: &TimerState) -> Result<()> {
    sync_timer_at(&timer_path()?, was_running, state)
}

pub fn sync_timer_at(path: &Path, was_running: bool, state: &TimerState) -> Result<()> {
    match SnapshotAction::after(was_running, state) {
        SnapshotAction::Save => save_timer_to(path, state),
        SnapshotAction::Clear => clear_timer_at(path),
        SnapshotAction::Keep => Ok(()),
    }
}

pub fn save_timer(state: &TimerState) -> Result<()> {
    save_timer_to(&timer_path()?, state)
}

pub fn load_timer() -> Result<Option<TimerState>> {
    load_timer_from(&timer_path()?)
}

pub fn clear_timer() -> Result<()> {
    clear_timer_at(&timer_path()?)
}

pub fn save_timer_to(path: &Path, state: &TimerState) -> Result<()> {
    let json = serde_json::to_string_pretty(state)?;
    fs::write(path, json).with_context(|| format!("Failed to write timer state to {:?}", path))?;
    debug!(path = ?path, running = state.is_running, "Timer state saved");
    Ok(())
}

/// `None` when nothing was saved.
pub fn load_timer_from(path: &Path) -> Result<Option<TimerState>> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read timer state from {:?}", path))
        }
    };
    let state = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse timer state at {:?}", path))?;
    Ok(Some(state))
}

pub fn clear_timer_at(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove timer state at {:?}", path)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use tempus_api::models::ProjectId;

    use super::*;

    #[test]
    fn test_missing_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_timer_from(&dir.path().join(TIMER_FILE)).unwrap(), None);
    }

    #[test]
    fn test_snapshot_survives_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TIMER_FILE);
        let state = TimerState {
            is_running: true,
            start_instant: Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()),
            description: "Client call".to_string(),
            project_id: Some(ProjectId(7)),
            elapsed_millis: 12_000,
        };

        save_timer_to(&path, &state).unwrap();
        assert_eq!(load_timer_from(&path).unwrap(), Some(state));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TIMER_FILE);
        save_timer_to(&path, &TimerState::default()).unwrap();

        clear_timer_at(&path).unwrap();
        clear_timer_at(&path).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_idle_process_keeps_a_run_started_elsewhere() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TIMER_FILE);
        let running = TimerState {
            is_running: true,
            start_instant: Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()),
            description: "Started from the shell".to_string(),
            ..TimerState::default()
        };
        save_timer_to(&path, &running).unwrap();

        sync_timer_at(&path, false, &TimerState::default()).unwrap();
        assert_eq!(load_timer_from(&path).unwrap(), Some(running));

        // Our own run ending is what removes it.
        sync_timer_at(&path, true, &TimerState::default()).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_snapshot_action() {
        let idle = TimerState::default();
        let running = TimerState {
            is_running: true,
            ..TimerState::default()
        };

        assert_eq!(SnapshotAction::after(false, &running), SnapshotAction::Save);
        assert_eq!(SnapshotAction::after(true, &running), SnapshotAction::Save);
        assert_eq!(SnapshotAction::after(true, &idle), SnapshotAction::Clear);
        assert_eq!(SnapshotAction::after(false, &idle), SnapshotAction::Keep);
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(TIMER_FILE);
        fs::write(&path, "{not json").unwrap();
        assert!(load_timer_from(&path).is_err());
    }
}
