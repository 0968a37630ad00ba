use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{Project, ProjectCreate, ProjectId};

const PROJECTS: &str = "/projects";

/// Every project write answers with the user's full project list.
impl ApiClient {
    pub async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.get(PROJECTS).await?.data_or_default()
    }

    pub async fn create_project(&self, project: &ProjectCreate) -> Result<Vec<Project>, ApiError> {
        self.post(PROJECTS, Some(project)).await?.data_or_default()
    }

    pub async fn update_project(&self, project: &Project) -> Result<Vec<Project>, ApiError> {
        self.put(PROJECTS, project).await?.data_or_default()
    }

    pub async fn delete_project(&self, id: ProjectId) -> Result<Vec<Project>, ApiError> {
        self.delete(&format!("{PROJECTS}/{id}")).await?.data_or_default()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::client::tests::client_for;

    fn acme() -> serde_json::Value {
        json!({"ID": 1, "Name": "Acme", "Description": "", "Color": "#0a7dff"})
    }

    #[tokio::test]
    async fn test_create_project_returns_full_list() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/projects"))
            .and(body_partial_json(json!({"Name": "Acme", "Color": "#0a7dff"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"Success": true, "Data": [acme()], "Message": ""})),
            )
            .mount(&mock_server)
            .await;

        let created = client_for(&mock_server)
            .create_project(&ProjectCreate {
                name: "Acme".to_string(),
                description: String::new(),
                color: "#0a7dff".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(created.len(), 1);
        assert_eq!(created[0].id, ProjectId(1));
        assert_eq!(created[0].color, "#0a7dff");
    }

    #[tokio::test]
    async fn test_delete_project_by_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/projects/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Success": true})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let remaining = client_for(&mock_server)
            .delete_project(ProjectId(1))
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }
}
