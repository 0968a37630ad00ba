use std::sync::Arc;

use chrono::{Days, Local, NaiveDate};
use crossterm::event::KeyCode;
use tempus_api::ApiClient;
use tracing::{info, warn};

use crate::config::Config;
use crate::session::StopwatchSession;
use crate::stopwatch::TimerState;
use crate::store::{ProjectStore, TimeBoxStore, TimeEntryStore};

#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppMode {
    #[default]
    Normal,
    EditingDescription,
}

pub struct App {
    pub config: Config,
    pub mode: AppMode,
    pub input_buffer: String,
    pub session: StopwatchSession,
    pub projects: ProjectStore,
    pub entries: TimeEntryStore,
    pub boxes: TimeBoxStore,
    /// Day shown in the time-box grid
    pub day: NaiveDate,
    /// First grid row on screen
    pub scroll: u16,
    /// Copy of the stopwatch state for drawing, refreshed once per frame
    pub timer: TimerState,
    pub status_message: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: Config, client: Arc<ApiClient>, session: StopwatchSession) -> Self {
        Self {
            config,
            mode: AppMode::Normal,
            input_buffer: String::new(),
            session,
            projects: ProjectStore::new(client.clone()),
            entries: TimeEntryStore::new(client.clone()),
            boxes: TimeBoxStore::new(client),
            day: Local::now().date_naive(),
            scroll: 0,
            timer: TimerState::default(),
            status_message: None,
            should_quit: false,
        }
    }

    /// Reload everything from the backend. Failures stay in the stores and
    /// show up in the status bar.
    pub async fn refresh(&mut self) {
        let _ = self.projects.fetch().await;
        let _ = self.entries.fetch().await;
        let _ = self.boxes.fetch().await;
        self.status_message = None;
    }

    pub async fn sync_timer(&mut self) {
        self.timer = self.session.snapshot().await;
    }

    /// Most recent problem worth showing, local messages first.
    pub fn last_error(&self) -> Option<&str> {
        self.status_message
            .as_deref()
            .or_else(|| self.entries.status().last_error())
            .or_else(|| self.boxes.status().last_error())
            .or_else(|| self.projects.status().last_error())
    }

    pub fn is_loading(&self) -> bool {
        self.projects.status().is_loading()
            || self.entries.status().is_loading()
            || self.boxes.status().is_loading()
    }

    pub async fn toggle_timer(&mut self) {
        if self.session.snapshot().await.is_running {
            match self.session.stop(&mut self.entries).await {
                Ok(Some(draft)) => info!(description = %draft.description, "Timer stopped"),
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "Stopped timer could not be saved");
                    self.status_message = Some(format!("Entry not saved: {e}"));
                }
            }
        } else {
            self.status_message = None;
            self.session.start_pending().await;
        }
        self.sync_timer().await;
    }

    pub async fn cycle_project(&mut self) {
        let current = self.session.snapshot().await.project_id;
        let next = self.projects.next_after(current);
        self.session.update_project(next).await;
        self.sync_timer().await;
    }

    pub async fn begin_edit(&mut self) {
        self.input_buffer = self.session.snapshot().await.description;
        self.mode = AppMode::EditingDescription;
    }

    pub async fn commit_edit(&mut self) {
        let description = std::mem::take(&mut self.input_buffer);
        self.session.update_description(description.trim()).await;
        self.mode = AppMode::Normal;
        self.sync_timer().await;
    }

    pub fn cancel_edit(&mut self) {
        self.input_buffer.clear();
        self.mode = AppMode::Normal;
    }

    pub fn previous_day(&mut self) {
        self.day = self.day.checked_sub_days(Days::new(1)).unwrap_or(self.day);
    }

    pub fn next_day(&mut self) {
        self.day = self.day.checked_add_days(Days::new(1)).unwrap_or(self.day);
    }

    pub fn today(&mut self) {
        self.day = Local::now().date_naive();
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        let max = self.config.timebox.total_height().ceil() as u16;
        self.scroll = (self.scroll + 1).min(max.saturating_sub(1));
    }

    pub async fn handle_key(&mut self, key: KeyCode) {
        match self.mode {
            AppMode::Normal => match key {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char(' ') => self.toggle_timer().await,
                KeyCode::Char('e') => self.begin_edit().await,
                KeyCode::Char('p') => self.cycle_project().await,
                KeyCode::Char('[') => self.previous_day(),
                KeyCode::Char(']') => self.next_day(),
                KeyCode::Char('t') => self.today(),
                KeyCode::Char('r') => self.refresh().await,
                KeyCode::Up | KeyCode::Char('k') => self.scroll_up(),
                KeyCode::Down | KeyCode::Char('j') => self.scroll_down(),
                _ => {}
            },
            AppMode::EditingDescription => match key {
                KeyCode::Esc => self.cancel_edit(),
                KeyCode::Enter => self.commit_edit().await,
                KeyCode::Backspace => {
                    self.input_buffer.pop();
                }
                KeyCode::Char(c) => self.input_buffer.push(c),
                _ => {}
            },
        }
    }
}
