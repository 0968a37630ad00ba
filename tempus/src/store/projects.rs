use std::sync::Arc;

use tempus_api::models::{Project, ProjectCreate, ProjectId};
use tempus_api::{ApiClient, ApiError};
use tracing::instrument;

use super::StoreStatus;
use crate::validation::validate_project;

pub struct ProjectStore {
    client: Arc<ApiClient>,
    projects: Vec<Project>,
    status: StoreStatus,
}

impl ProjectStore {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            projects: Vec::new(),
            status: StoreStatus::default(),
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn status(&self) -> &StoreStatus {
        &self.status
    }

    /// Entries may point at a project that no longer exists; those resolve
    /// to `None` and render as unassigned.
    pub fn find(&self, id: Option<ProjectId>) -> Option<&Project> {
        let id = id?;
        self.projects.iter().find(|p| p.id == id)
    }

    /// The project after `current` in list order, wrapping through "none".
    pub fn next_after(&self, current: Option<ProjectId>) -> Option<ProjectId> {
        match current.and_then(|id| self.projects.iter().position(|p| p.id == id)) {
            None => self.projects.first().map(|p| p.id),
            Some(index) => self.projects.get(index + 1).map(|p| p.id),
        }
    }

    #[instrument(skip(self))]
    pub async fn fetch(&mut self) -> Result<(), ApiError> {
        self.status.begin();
        let result = self.client.list_projects().await;
        self.apply("fetch projects", result)
    }

    #[instrument(skip(self, project), fields(name = %project.name))]
    pub async fn create(&mut self, project: &ProjectCreate) -> Result<(), ApiError> {
        if let Err(e) = validate_project(project) {
            return self.status.reject(e);
        }
        self.status.begin();
        let result = self.client.create_project(project).await;
        self.apply("create project", result)
    }

    #[instrument(skip(self, project), fields(id = %project.id))]
    pub async fn update(&mut self, project: &Project) -> Result<(), ApiError> {
        let draft = ProjectCreate {
            name: project.name.clone(),
            description: project.description.clone(),
            color: project.color.clone(),
        };
        if let Err(e) = validate_project(&draft) {
            return self.status.reject(e);
        }
        self.status.begin();
        let result = self.client.update_project(project).await;
        self.apply("update project", result)
    }

    #[instrument(skip(self))]
    pub async fn delete(&mut self, id: ProjectId) -> Result<(), ApiError> {
        self.status.begin();
        let result = self.client.delete_project(id).await;
        self.apply("delete project", result)
    }

    fn apply(
        &mut self,
        what: &str,
        result: Result<Vec<Project>, ApiError>,
    ) -> Result<(), ApiError> {
        self.projects = self.status.finish(what, result)?;
        Ok(())
    }
}
