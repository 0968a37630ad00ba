//! Owns the running stopwatch and the one periodic tick that drives it

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempus_api::models::{EntryCreate, ProjectId};
use tempus_api::{ApiClient, ApiError};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::stopwatch::{Stopwatch, TimerState};

/// Where a stopped run goes to be persisted.
#[async_trait]
pub trait EntrySink: Send {
    async fn submit(&mut self, draft: EntryCreate) -> Result<(), ApiError>;
}

#[async_trait]
impl EntrySink for Arc<ApiClient> {
    async fn submit(&mut self, draft: EntryCreate) -> Result<(), ApiError> {
        self.create_time_entry(&draft).await.map(|_| ())
    }
}

/// Handle to the periodic tick task. There is exactly one owner; dropping
/// the handle aborts the task.
pub struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    /// Must be called from within a Tokio runtime.
    pub fn spawn(stopwatch: Arc<Mutex<Stopwatch>>, every: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if stopwatch.lock().await.tick().is_none() {
                    debug!("Stopwatch went idle, ticker exiting");
                    break;
                }
            }
        });
        Self { handle }
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct StopwatchSession {
    stopwatch: Arc<Mutex<Stopwatch>>,
    ticker: Option<Ticker>,
    tick_every: Duration,
}

impl StopwatchSession {
    /// Wrap a stopwatch. A stopwatch restored in the running state starts
    /// ticking right away, so this must be called within a Tokio runtime.
    pub fn new(stopwatch: Stopwatch, tick_every: Duration) -> Self {
        let running = stopwatch.is_running();
        let mut session = Self {
            stopwatch: Arc::new(Mutex::new(stopwatch)),
            ticker: None,
            tick_every,
        };
        if running {
            session.replace_ticker();
        }
        session
    }

    fn replace_ticker(&mut self) {
        // Drop the old handle before spawning so two tickers never overlap.
        self.ticker = None;
        self.ticker = Some(Ticker::spawn(self.stopwatch.clone(), self.tick_every));
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(Ticker::is_active)
    }

    pub async fn snapshot(&self) -> TimerState {
        self.stopwatch.lock().await.state().clone()
    }

    pub async fn ticks(&self) -> u64 {
        self.stopwatch.lock().await.ticks()
    }

    /// Force an immediate recompute outside the periodic cadence.
    pub async fn tick(&self) -> Option<i64> {
        self.stopwatch.lock().await.tick()
    }

    pub async fn start(&mut self, description: impl Into<String>, project_id: Option<ProjectId>) {
        self.stopwatch.lock().await.start(description, project_id);
        self.replace_ticker();
    }

    /// Start with whatever description and project are pending.
    pub async fn start_pending(&mut self) {
        let (description, project_id) = {
            let stopwatch = self.stopwatch.lock().await;
            (stopwatch.state().description.clone(), stopwatch.state().project_id)
        };
        self.start(description, project_id).await;
    }

    pub async fn update_description(&self, description: impl Into<String>) {
        self.stopwatch.lock().await.update_description(description);
    }

    pub async fn update_project(&self, project_id: Option<ProjectId>) {
        self.stopwatch.lock().await.update_project(project_id);
    }

    /// Stop the run and submit it. The timer is idle afterwards even when the
    /// submission fails; a failed submission loses the interval.
    pub async fn stop(
        &mut self,
        sink: &mut (dyn EntrySink + '_),
    ) -> Result<Option<EntryCreate>, ApiError> {
        self.ticker = None;
        let Some(draft) = self.stopwatch.lock().await.stop() else {
            return Ok(None);
        };

        match sink.submit(draft.clone()).await {
            Ok(()) => {
                info!(description = %draft.description, "Time entry saved");
                Ok(Some(draft))
            }
            Err(e) => {
                error!(error = %e, "Failed to save time entry");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use tempus_api::models::Interval;

    use super::*;
    use crate::clock::{Clock, ManualClock};

    /// Reads tokio's (pausable) clock so paused-time tests see ticks move
    /// the elapsed time.
    struct TokioClock {
        base: DateTime<Utc>,
        origin: tokio::time::Instant,
    }

    impl TokioClock {
        fn new() -> Self {
            Self {
                base: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
                origin: tokio::time::Instant::now(),
            }
        }
    }

    impl Clock for TokioClock {
        fn now(&self) -> DateTime<Utc> {
            let since = tokio::time::Instant::now() - self.origin;
            self.base + chrono::Duration::from_std(since).unwrap()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        submitted: Vec<EntryCreate>,
        fail: bool,
    }

    #[async_trait]
    impl EntrySink for RecordingSink {
        async fn submit(&mut self, draft: EntryCreate) -> Result<(), ApiError> {
            if self.fail {
                return Err(ApiError::Transport("connection reset".to_string()));
            }
            self.submitted.push(draft);
            Ok(())
        }
    }

    fn tokio_session() -> StopwatchSession {
        let stopwatch = Stopwatch::new(Arc::new(TokioClock::new()));
        StopwatchSession::new(stopwatch, Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_drives_elapsed_time() {
        let mut session = tokio_session();
        session.start("Focus", None).await;
        assert!(session.is_ticking());

        tokio::time::sleep(Duration::from_millis(5_500)).await;

        let state = session.snapshot().await;
        assert!(state.is_running);
        assert_eq!(state.elapsed_millis, 5_000);
        assert_eq!(session.ticks().await, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_keeps_a_single_ticker() {
        let mut session = tokio_session();
        session.start("First", None).await;
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        session.start("Second", None).await;
        tokio::time::sleep(Duration::from_millis(3_500)).await;

        // Two live tickers would have doubled this.
        assert_eq!(session.ticks().await, 3);
        assert_eq!(session.snapshot().await.elapsed_millis, 3_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_ticker_and_submits() {
        let mut session = tokio_session();
        session.start("Focus", Some(ProjectId(1))).await;
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        let mut sink = RecordingSink::default();
        let draft = session.stop(&mut sink).await.unwrap().unwrap();

        assert!(!session.is_ticking());
        assert_eq!(sink.submitted, vec![draft.clone()]);
        assert_eq!(draft.duration().num_milliseconds(), 2_500);

        tokio::time::sleep(Duration::from_secs(3)).await;
        let state = session.snapshot().await;
        assert_eq!(state, TimerState::default());
    }

    #[tokio::test]
    async fn test_stop_while_idle_submits_nothing() {
        let mut session = tokio_session();
        let mut sink = RecordingSink::default();
        assert_eq!(session.stop(&mut sink).await.unwrap(), None);
        assert!(sink.submitted.is_empty());
    }

    #[tokio::test]
    async fn test_failed_submission_still_clears_timer() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
        let stopwatch = Stopwatch::new(Arc::new(clock.clone()));
        let mut session = StopwatchSession::new(stopwatch, Duration::from_secs(1));
        session.start("Unsaved work", None).await;
        clock.advance(chrono::Duration::minutes(30));
        session.tick().await;

        let mut sink = RecordingSink {
            fail: true,
            ..Default::default()
        };
        let result = session.stop(&mut sink).await;

        assert!(result.is_err());
        assert!(!session.is_ticking());
        // The interval is gone: nothing persisted and the timer is reset.
        assert!(sink.submitted.is_empty());
        assert_eq!(session.snapshot().await, TimerState::default());
    }

    #[tokio::test]
    async fn test_dropping_session_aborts_ticker() {
        let stopwatch = Arc::new(Mutex::new(Stopwatch::default()));
        stopwatch.lock().await.start("Focus", None);
        let ticker = Ticker::spawn(stopwatch.clone(), Duration::from_millis(10));
        assert!(ticker.is_active());
        drop(ticker);

        // The task held the only other reference.
        for _ in 0..100 {
            if Arc::strong_count(&stopwatch) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(Arc::strong_count(&stopwatch), 1);
    }

    #[tokio::test]
    async fn test_restored_running_stopwatch_ticks_immediately() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
        let snapshot = TimerState {
            is_running: true,
            start_instant: Some(clock.now()),
            description: "Resumed".to_string(),
            project_id: None,
            elapsed_millis: 0,
        };
        let session = StopwatchSession::new(
            Stopwatch::restore(snapshot, Arc::new(clock)),
            Duration::from_secs(1),
        );
        assert!(session.is_ticking());
    }

    #[tokio::test]
    async fn test_start_pending_uses_preset_fields() {
        let mut session = tokio_session();
        session.update_description("Preset").await;
        session.update_project(Some(ProjectId(9))).await;
        session.start_pending().await;

        let state = session.snapshot().await;
        assert!(state.is_running);
        assert_eq!(state.description, "Preset");
        assert_eq!(state.project_id, Some(ProjectId(9)));
    }
}
