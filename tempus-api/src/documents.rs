//! `/folders` and `/notes`

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::models::{Folder, FolderId, FolderInput, Note, NoteId, NoteInput};

const FOLDERS: &str = "/folders";
const NOTES: &str = "/notes";

impl ApiClient {
    pub async fn list_folders(&self) -> Result<Vec<Folder>, ApiError> {
        self.get(FOLDERS).await?.data_or_default()
    }

    pub async fn get_folder(&self, id: FolderId) -> Result<Folder, ApiError> {
        let endpoint = format!("{FOLDERS}/{id}");
        self.get(&endpoint).await?.data(&endpoint)
    }

    /// Children of `parent`, or the root folders when `parent` is `None`.
    pub async fn list_folders_by_parent(
        &self,
        parent: Option<FolderId>,
    ) -> Result<Vec<Folder>, ApiError> {
        let endpoint = match parent {
            Some(id) => format!("{FOLDERS}/parent/{id}"),
            None => format!("{FOLDERS}/parent"),
        };
        self.get(&endpoint).await?.data_or_default()
    }

    pub async fn create_folder(&self, folder: &FolderInput) -> Result<Folder, ApiError> {
        self.post(FOLDERS, Some(folder)).await?.data(FOLDERS)
    }

    pub async fn update_folder(
        &self,
        id: FolderId,
        folder: &FolderInput,
    ) -> Result<Folder, ApiError> {
        let endpoint = format!("{FOLDERS}/{id}");
        self.put(&endpoint, folder).await?.data(&endpoint)
    }

    /// The backend cascades the delete to subfolders and notes.
    pub async fn delete_folder(&self, id: FolderId) -> Result<(), ApiError> {
        self.delete::<serde_json::Value>(&format!("{FOLDERS}/{id}")).await?.unit()
    }

    pub async fn list_notes(&self) -> Result<Vec<Note>, ApiError> {
        self.get(NOTES).await?.data_or_default()
    }

    pub async fn get_note(&self, id: NoteId) -> Result<Note, ApiError> {
        let endpoint = format!("{NOTES}/{id}");
        self.get(&endpoint).await?.data(&endpoint)
    }

    /// Notes inside `folder`, or the root notes when `folder` is `None`.
    pub async fn list_notes_by_folder(
        &self,
        folder: Option<FolderId>,
    ) -> Result<Vec<Note>, ApiError> {
        let endpoint = match folder {
            Some(id) => format!("{NOTES}/folder/{id}"),
            None => format!("{NOTES}/folder"),
        };
        self.get(&endpoint).await?.data_or_default()
    }

    pub async fn create_note(&self, note: &NoteInput) -> Result<Note, ApiError> {
        self.post(NOTES, Some(note)).await?.data(NOTES)
    }

    pub async fn update_note(&self, id: NoteId, note: &NoteInput) -> Result<Note, ApiError> {
        let endpoint = format!("{NOTES}/{id}");
        self.put(&endpoint, note).await?.data(&endpoint)
    }

    pub async fn delete_note(&self, id: NoteId) -> Result<(), ApiError> {
        self.delete::<serde_json::Value>(&format!("{NOTES}/{id}")).await?.unit()
    }
}
