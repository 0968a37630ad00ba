use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use tempus_api::models::{EntryCreate, EntryId, ProjectId, TimeBoxEntry, TimeEntry};
use tempus_api::{ApiClient, ApiError};
use tracing::instrument;

use super::StoreStatus;
use crate::session::EntrySink;
use crate::timebox::{entries_for_day, TrackedIndex};
use crate::validation::{validate_time_box, validate_time_entry};

/// Logged work.
pub struct TimeEntryStore {
    client: Arc<ApiClient>,
    entries: Vec<TimeEntry>,
    status: StoreStatus,
}

impl TimeEntryStore {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            entries: Vec::new(),
            status: StoreStatus::default(),
        }
    }

    pub fn entries(&self) -> &[TimeEntry] {
        &self.entries
    }

    pub fn status(&self) -> &StoreStatus {
        &self.status
    }

    pub fn on_day(&self, day: NaiveDate) -> Vec<&TimeEntry> {
        entries_for_day(&self.entries, day, &Local)
    }

    pub fn tracked_index(&self) -> TrackedIndex {
        TrackedIndex::new(&self.entries)
    }

    #[instrument(skip(self))]
    pub async fn fetch(&mut self) -> Result<(), ApiError> {
        self.status.begin();
        let result = self.client.list_time_entries().await;
        self.apply("fetch time entries", result)
    }

    #[instrument(skip(self, draft), fields(description = %draft.description))]
    pub async fn create(&mut self, draft: &EntryCreate) -> Result<(), ApiError> {
        if let Err(e) = validate_time_entry(draft) {
            return self.status.reject(e);
        }
        self.status.begin();
        let result = self.client.create_time_entry(draft).await;
        self.apply("create time entry", result)
    }

    #[instrument(skip(self, entry), fields(id = %entry.id))]
    pub async fn update(&mut self, entry: &TimeEntry) -> Result<(), ApiError> {
        if let Err(e) = validate_time_entry(entry) {
            return self.status.reject(e);
        }
        self.status.begin();
        let result = self.client.update_time_entry(entry).await;
        self.apply("update time entry", result)
    }

    #[instrument(skip(self))]
    pub async fn delete(&mut self, id: EntryId) -> Result<(), ApiError> {
        self.status.begin();
        let result = self.client.delete_time_entry(id).await;
        self.apply("delete time entry", result)
    }

    #[instrument(skip(self))]
    pub async fn assign_project(
        &mut self,
        id: EntryId,
        project_id: Option<ProjectId>,
    ) -> Result<(), ApiError> {
        self.status.begin();
        let result = self.client.assign_project_to_entry(id, project_id).await;
        self.apply("assign project to time entry", result)
    }

    fn apply(
        &mut self,
        what: &str,
        result: Result<Vec<TimeEntry>, ApiError>,
    ) -> Result<(), ApiError> {
        self.entries = self.status.finish(what, result)?;
        Ok(())
    }
}

#[async_trait]
impl EntrySink for TimeEntryStore {
    async fn submit(&mut self, draft: EntryCreate) -> Result<(), ApiError> {
        self.create(&draft).await
    }
}

/// Planned work.
pub struct TimeBoxStore {
    client: Arc<ApiClient>,
    boxes: Vec<TimeBoxEntry>,
    status: StoreStatus,
}

impl TimeBoxStore {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            boxes: Vec::new(),
            status: StoreStatus::default(),
        }
    }

    pub fn boxes(&self) -> &[TimeBoxEntry] {
        &self.boxes
    }

    pub fn status(&self) -> &StoreStatus {
        &self.status
    }

    #[instrument(skip(self))]
    pub async fn fetch(&mut self) -> Result<(), ApiError> {
        self.status.begin();
        let result = self.client.list_time_boxes().await;
        self.apply("fetch time boxes", result)
    }

    #[instrument(skip(self, draft), fields(description = %draft.description))]
    pub async fn create(&mut self, draft: &EntryCreate) -> Result<(), ApiError> {
        if let Err(e) = validate_time_box(draft) {
            return self.status.reject(e);
        }
        self.status.begin();
        let result = self.client.create_time_box(draft).await;
        self.apply("create time box", result)
    }

    #[instrument(skip(self, entry), fields(id = %entry.id))]
    pub async fn update(&mut self, entry: &TimeBoxEntry) -> Result<(), ApiError> {
        if let Err(e) = validate_time_box(entry) {
            return self.status.reject(e);
        }
        self.status.begin();
        let result = self.client.update_time_box(entry).await;
        self.apply("update time box", result)
    }

    #[instrument(skip(self))]
    pub async fn delete(&mut self, id: EntryId) -> Result<(), ApiError> {
        self.status.begin();
        let result = self.client.delete_time_box(id).await;
        self.apply("delete time box", result)
    }

    #[instrument(skip(self))]
    pub async fn assign_project(
        &mut self,
        id: EntryId,
        project_id: Option<ProjectId>,
    ) -> Result<(), ApiError> {
        self.status.begin();
        let result = self.client.assign_project_to_time_box(id, project_id).await;
        self.apply("assign project to time box", result)
    }

    fn apply(
        &mut self,
        what: &str,
        result: Result<Vec<TimeBoxEntry>, ApiError>,
    ) -> Result<(), ApiError> {
        self.boxes = self.status.finish(what, result)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use tempus_api::models::Interval;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    use super::*;
    use crate::clock::ManualClock;
    use crate::session::StopwatchSession;
    use crate::store::test_support::{client_for, failure, ok};
    use crate::store::ProjectStore;
    use crate::stopwatch::Stopwatch;

    fn entry_json(id: i64, start: &str, end: &str) -> serde_json::Value {
        json!({
            "ID": id,
            "Description": "Deep work",
            "ProjectID": null,
            "StartDate": start,
            "EndDate": end
        })
    }

    fn draft(minutes: i64) -> EntryCreate {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        EntryCreate {
            description: "Deep work".to_string(),
            project_id: None,
            start_date: start,
            end_date: start + chrono::Duration::minutes(minutes),
        }
    }

    /// Echoes a created entry back as the whole list, the way the backend
    /// answers a create.
    struct EchoCreated;

    impl Respond for EchoCreated {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let mut body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            body["ID"] = json!(1);
            ok(json!([body]))
        }
    }

    #[tokio::test]
    async fn test_fetch_with_omitted_data_is_empty() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/time-entries"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"Success": true, "Message": ""})),
            )
            .mount(&mock_server)
            .await;

        let mut store = TimeEntryStore::new(client_for(&mock_server));
        store.fetch().await.unwrap();
        assert!(store.entries().is_empty());
    }

    #[tokio::test]
    async fn test_entry_ending_before_start_is_rejected_locally() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ok(json!([])))
            .expect(0)
            .mount(&mock_server)
            .await;

        let mut store = TimeEntryStore::new(client_for(&mock_server));
        let err = store.create(&draft(-10)).await.unwrap_err();
        assert_eq!(err.class(), tempus_api::ErrorClass::Validation);
        assert_eq!(
            store.status().last_error(),
            Some("Invalid input: End time must be after start time")
        );
    }

    #[tokio::test]
    async fn test_time_box_length_rules() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/time-box-entries"))
            .respond_with(ok(json!([entry_json(
                4,
                "2024-05-01T09:00:00Z",
                "2024-05-01T09:30:00Z"
            )])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut store = TimeBoxStore::new(client_for(&mock_server));
        assert!(store.create(&draft(0)).await.is_err());
        assert!(store.create(&draft(481)).await.is_err());
        store.create(&draft(30)).await.unwrap();
        assert_eq!(store.boxes()[0].id, EntryId(4));
    }

    #[tokio::test]
    async fn test_assign_project_clears_with_null() {
        let mock_server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/time-box-entries/4/assign-project"))
            .and(body_partial_json(json!({"ProjectID": null})))
            .respond_with(ok(json!([entry_json(
                4,
                "2024-05-01T09:00:00Z",
                "2024-05-01T09:30:00Z"
            )])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let mut store = TimeBoxStore::new(client_for(&mock_server));
        store.assign_project(EntryId(4), None).await.unwrap();
        assert_eq!(store.boxes()[0].project_id, None);
    }

    #[tokio::test]
    async fn test_transport_failure_is_recorded() {
        // Nothing listens on port 9 (discard) in the test environment.
        let config = tempus_api::ApiClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(2),
        };
        let client = Arc::new(ApiClient::new(config).unwrap().with_token("t"));

        let mut store = TimeEntryStore::new(client);
        let err = store.fetch().await.unwrap_err();
        assert_eq!(err.class(), tempus_api::ErrorClass::Transport);
        assert!(store.status().last_error().is_some());
        assert!(!store.status().is_loading());
    }

    #[tokio::test]
    async fn test_business_failure_on_delete() {
        let mock_server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/time-entries/8"))
            .respond_with(failure(404, "Time entry not found"))
            .mount(&mock_server)
            .await;

        let mut store = TimeEntryStore::new(client_for(&mock_server));
        let err = store.delete(EntryId(8)).await.unwrap_err();
        assert_eq!(err.class(), tempus_api::ErrorClass::Business);
        assert_eq!(store.status().last_error(), Some("Time entry not found"));
    }

    #[tokio::test]
    async fn test_stopwatch_run_lands_in_store() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/projects"))
            .respond_with(ok(json!([
                {"ID": 7, "Name": "Acme", "Description": "", "Color": "#0a7dff"}
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/time-entries"))
            .and(body_partial_json(json!({"Description": "Client call", "ProjectID": 7})))
            .respond_with(EchoCreated)
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server);
        let mut projects = ProjectStore::new(client.clone());
        projects
            .create(&tempus_api::models::ProjectCreate {
                name: "Acme".to_string(),
                description: String::new(),
                color: "#0a7dff".to_string(),
            })
            .await
            .unwrap();
        let acme = projects.projects()[0].id;

        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
        let mut session = StopwatchSession::new(
            Stopwatch::new(Arc::new(clock.clone())),
            Duration::from_secs(1),
        );
        session.start("Client call", Some(acme)).await;
        for _ in 0..5 {
            clock.advance(chrono::Duration::seconds(1));
            session.tick().await;
        }
        assert_eq!(session.snapshot().await.elapsed_millis, 5_000);

        let mut entries = TimeEntryStore::new(client);
        let draft = session.stop(&mut entries).await.unwrap().unwrap();

        assert_eq!(entries.entries().len(), 1);
        let saved = &entries.entries()[0];
        assert_eq!(saved.project_id, Some(acme));
        assert_eq!(saved.duration().num_seconds(), 5);
        assert_eq!(saved.start_date, draft.start_date);
        assert!(!session.snapshot().await.is_running);
    }
}
