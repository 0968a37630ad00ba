//! `/time-entries` and `/time-box-entries`
//!
//! Both groups expose the same five operations and answer every write with
//! the user's full list.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{AssignProjectPayload, EntryCreate, EntryId, ProjectId, TimeBoxEntry, TimeEntry};

const TIME_ENTRIES: &str = "/time-entries";
const TIME_BOXES: &str = "/time-box-entries";

impl ApiClient {
    pub async fn list_time_entries(&self) -> Result<Vec<TimeEntry>, ApiError> {
        self.list_in(TIME_ENTRIES).await
    }

    pub async fn create_time_entry(&self, entry: &EntryCreate) -> Result<Vec<TimeEntry>, ApiError> {
        self.create_in(TIME_ENTRIES, entry).await
    }

    pub async fn update_time_entry(&self, entry: &TimeEntry) -> Result<Vec<TimeEntry>, ApiError> {
        self.update_in(TIME_ENTRIES, entry).await
    }

    pub async fn delete_time_entry(&self, id: EntryId) -> Result<Vec<TimeEntry>, ApiError> {
        self.delete_in(TIME_ENTRIES, id).await
    }

    pub async fn assign_project_to_entry(
        &self,
        id: EntryId,
        project_id: Option<ProjectId>,
    ) -> Result<Vec<TimeEntry>, ApiError> {
        self.assign_in(TIME_ENTRIES, id, project_id).await
    }

    pub async fn list_time_boxes(&self) -> Result<Vec<TimeBoxEntry>, ApiError> {
        self.list_in(TIME_BOXES).await
    }

    pub async fn create_time_box(
        &self,
        entry: &EntryCreate,
    ) -> Result<Vec<TimeBoxEntry>, ApiError> {
        self.create_in(TIME_BOXES, entry).await
    }

    pub async fn update_time_box(
        &self,
        entry: &TimeBoxEntry,
    ) -> Result<Vec<TimeBoxEntry>, ApiError> {
        self.update_in(TIME_BOXES, entry).await
    }

    pub async fn delete_time_box(&self, id: EntryId) -> Result<Vec<TimeBoxEntry>, ApiError> {
        self.delete_in(TIME_BOXES, id).await
    }

    pub async fn assign_project_to_time_box(
        &self,
        id: EntryId,
        project_id: Option<ProjectId>,
    ) -> Result<Vec<TimeBoxEntry>, ApiError> {
        self.assign_in(TIME_BOXES, id, project_id).await
    }

    async fn list_in<T: DeserializeOwned>(&self, group: &str) -> Result<Vec<T>, ApiError> {
        self.get(group).await?.data_or_default()
    }

    async fn create_in<T: DeserializeOwned>(
        &self,
        group: &str,
        entry: &EntryCreate,
    ) -> Result<Vec<T>, ApiError> {
        self.post(group, Some(entry)).await?.data_or_default()
    }

    async fn update_in<B: Serialize, T: DeserializeOwned>(
        &self,
        group: &str,
        entry: &B,
    ) -> Result<Vec<T>, ApiError> {
        self.put(group, entry).await?.data_or_default()
    }

    async fn delete_in<T: DeserializeOwned>(
        &self,
        group: &str,
        id: EntryId,
    ) -> Result<Vec<T>, ApiError> {
        self.delete(&format!("{group}/{id}")).await?.data_or_default()
    }

    async fn assign_in<T: DeserializeOwned>(
        &self,
        group: &str,
        id: EntryId,
        project_id: Option<ProjectId>,
    ) -> Result<Vec<T>, ApiError> {
        let payload = AssignProjectPayload { project_id };
        self.patch(&format!("{group}/{id}/assign-project"), &payload).await?.data_or_default()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use wiremock::matchers::{body_json, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::tests::client_for;

    fn entry_json(id: i64) -> serde_json::Value {
        json!({
            "ID": id,
            "Description": "Deep work",
            "ProjectID": 3,
            "StartDate": "2024-05-01T14:30:00Z",
            "EndDate": "2024-05-01T16:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_empty_list_omits_data() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/time-entries"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Success": true,
                "Message": "Time entries retrieved successfully"
            })))
            .mount(&mock_server)
            .await;

        let entries = client_for(&mock_server).list_time_entries().await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_create_time_entry_posts_draft() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/time-entries"))
            .and(body_partial_json(json!({"Description": "Deep work", "ProjectID": 3})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"Success": true, "Data": [entry_json(1)]})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let draft = EntryCreate {
            description: "Deep work".to_string(),
            project_id: Some(ProjectId(3)),
            start_date: Utc.with_ymd_and_hms(2024, 5, 1, 14, 30, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2024, 5, 1, 16, 0, 0).unwrap(),
        };
        let entries = client_for(&mock_server)
            .create_time_entry(&draft)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].project_id, Some(ProjectId(3)));
    }

    #[tokio::test]
    async fn test_update_time_box_puts_on_collection() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/time-box-entries"))
            .and(body_partial_json(json!({"ID": 4})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"Success": true, "Data": [entry_json(4)]})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let time_box: TimeBoxEntry = serde_json::from_value(entry_json(4)).unwrap();
        let boxes = client_for(&mock_server)
            .update_time_box(&time_box)
            .await
            .unwrap();
        assert_eq!(boxes[0].id, EntryId(4));
    }

    #[tokio::test]
    async fn test_clear_project_sends_null() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/time-box-entries/4/assign-project"))
            .and(body_json(json!({"ProjectID": null})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Success": true})))
            .expect(1)
            .mount(&mock_server)
            .await;

        client_for(&mock_server)
            .assign_project_to_time_box(EntryId(4), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_time_entry_failure_is_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/time-entries/9"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "Success": false,
                "Message": "An error occurred while deleting time entry"
            })))
            .mount(&mock_server)
            .await;

        let err = client_for(&mock_server)
            .delete_time_entry(EntryId(9))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected { status: 500, .. }));
    }
}
