use std::sync::Arc;

use tempus_api::models::{Folder, FolderId, FolderInput, Note, NoteId, NoteInput};
use tempus_api::{ApiClient, ApiError};
use tracing::{debug, instrument};

use super::StoreStatus;
use crate::hierarchy::{self, FolderTree};
use crate::validation::{validate_folder, validate_note, ValidationError};

pub struct FolderStore {
    client: Arc<ApiClient>,
    folders: Vec<Folder>,
    current: Option<FolderId>,
    status: StoreStatus,
}

impl FolderStore {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            folders: Vec::new(),
            current: None,
            status: StoreStatus::default(),
        }
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn status(&self) -> &StoreStatus {
        &self.status
    }

    pub fn tree(&self) -> FolderTree<'_> {
        FolderTree::new(&self.folders)
    }

    pub fn current_folder(&self) -> Option<&Folder> {
        let id = self.current?;
        self.folders.iter().find(|f| f.id == id)
    }

    /// Select a folder; `None` goes back to the top level.
    pub fn open(&mut self, id: Option<FolderId>) {
        self.current = id;
    }

    /// Names from the root down to the current folder. Empty at the top level.
    pub fn breadcrumbs(&self) -> Vec<&Folder> {
        match self.current {
            Some(id) => self.tree().folder_path(id).unwrap_or_else(|e| {
                debug!(error = %e, "No breadcrumbs for current folder");
                Vec::new()
            }),
            None => Vec::new(),
        }
    }

    #[instrument(skip(self))]
    pub async fn fetch(&mut self) -> Result<(), ApiError> {
        self.status.begin();
        let result = self.client.list_folders().await;
        self.folders = self.status.finish("fetch folders", result)?;
        Ok(())
    }

    /// Reload one folder and open it.
    #[instrument(skip(self))]
    pub async fn load(&mut self, id: FolderId) -> Result<Folder, ApiError> {
        self.status.begin();
        let result = self.client.get_folder(id).await;
        let folder = self.status.finish("load folder", result)?;
        self.upsert(folder.clone());
        self.open(Some(id));
        Ok(folder)
    }

    /// Direct children of `parent`, or the top level, merged into the cache.
    #[instrument(skip(self))]
    pub async fn fetch_children(
        &mut self,
        parent: Option<FolderId>,
    ) -> Result<Vec<Folder>, ApiError> {
        self.status.begin();
        let result = self.client.list_folders_by_parent(parent).await;
        let children = self.status.finish("fetch subfolders", result)?;
        for folder in &children {
            self.upsert(folder.clone());
        }
        Ok(children)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&mut self, input: &FolderInput) -> Result<Folder, ApiError> {
        if let Err(e) = validate_folder(input) {
            return self.status.reject(e);
        }
        self.status.begin();
        let result = self.client.create_folder(input).await;
        let folder = self.status.finish("create folder", result)?;
        self.folders.push(folder.clone());
        Ok(folder)
    }

    /// Rename or move a folder. Moving it under itself or one of its own
    /// subfolders is refused before anything is sent.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn edit(&mut self, id: FolderId, input: &FolderInput) -> Result<Folder, ApiError> {
        if let Err(e) = validate_folder(input) {
            return self.status.reject(e);
        }
        if !self.tree().can_reparent(id, input.parent_id) {
            return self.status.reject(ValidationError::CyclicParent);
        }
        self.status.begin();
        let result = self.client.update_folder(id, input).await;
        let folder = self.status.finish("edit folder", result)?;
        self.upsert(folder.clone());
        Ok(folder)
    }

    /// The backend cascades to subfolders and notes, but only the deleted
    /// record leaves the cache until the next fetch.
    #[instrument(skip(self))]
    pub async fn delete(&mut self, id: FolderId) -> Result<(), ApiError> {
        self.status.begin();
        let result = self.client.delete_folder(id).await;
        self.status.finish("delete folder", result)?;
        self.folders.retain(|f| f.id != id);
        if self.current == Some(id) {
            self.current = None;
        }
        Ok(())
    }

    fn upsert(&mut self, folder: Folder) {
        match self.folders.iter_mut().find(|f| f.id == folder.id) {
            Some(slot) => *slot = folder,
            None => self.folders.push(folder),
        }
    }
}

pub struct NoteStore {
    client: Arc<ApiClient>,
    notes: Vec<Note>,
    current: Option<Note>,
    status: StoreStatus,
}

impl NoteStore {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            notes: Vec::new(),
            current: None,
            status: StoreStatus::default(),
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn status(&self) -> &StoreStatus {
        &self.status
    }

    pub fn current_note(&self) -> Option<&Note> {
        self.current.as_ref()
    }

    pub fn notes_in(&self, folder: Option<FolderId>) -> Vec<&Note> {
        hierarchy::notes_in(&self.notes, folder)
    }

    pub fn select(&mut self, id: Option<NoteId>) {
        self.current = id.and_then(|id| self.notes.iter().find(|n| n.id == id).cloned());
    }

    #[instrument(skip(self))]
    pub async fn fetch(&mut self) -> Result<(), ApiError> {
        self.status.begin();
        let result = self.client.list_notes().await;
        self.notes = self.status.finish("fetch notes", result)?;
        Ok(())
    }

    /// Only the notes directly inside `folder`, or outside any folder.
    #[instrument(skip(self))]
    pub async fn fetch_in(&mut self, folder: Option<FolderId>) -> Result<(), ApiError> {
        self.status.begin();
        let result = self.client.list_notes_by_folder(folder).await;
        self.notes = self.status.finish("fetch folder notes", result)?;
        Ok(())
    }

    /// Reload one note and select it.
    #[instrument(skip(self))]
    pub async fn load(&mut self, id: NoteId) -> Result<Note, ApiError> {
        self.status.begin();
        let result = self.client.get_note(id).await;
        let note = self.status.finish("load note", result)?;
        match self.notes.iter_mut().find(|n| n.id == id) {
            Some(slot) => *slot = note.clone(),
            None => self.notes.push(note.clone()),
        }
        self.select(Some(id));
        Ok(note)
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create(&mut self, input: &NoteInput) -> Result<Note, ApiError> {
        if let Err(e) = validate_note(input) {
            return self.status.reject(e);
        }
        self.status.begin();
        let result = self.client.create_note(input).await;
        let note = self.status.finish("create note", result)?;
        self.notes.push(note.clone());
        Ok(note)
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn edit(&mut self, id: NoteId, input: &NoteInput) -> Result<Note, ApiError> {
        if let Err(e) = validate_note(input) {
            return self.status.reject(e);
        }
        self.status.begin();
        let result = self.client.update_note(id, input).await;
        let note = self.status.finish("edit note", result)?;
        match self.notes.iter_mut().find(|n| n.id == id) {
            Some(slot) => *slot = note.clone(),
            None => self.notes.push(note.clone()),
        }
        if self.current.as_ref().is_some_and(|n| n.id == id) {
            self.current = Some(note.clone());
        }
        Ok(note)
    }

    #[instrument(skip(self))]
    pub async fn delete(&mut self, id: NoteId) -> Result<(), ApiError> {
        self.status.begin();
        let result = self.client.delete_note(id).await;
        self.status.finish("delete note", result)?;
        self.notes.retain(|n| n.id != id);
        if self.current.as_ref().is_some_and(|n| n.id == id) {
            self.current = None;
        }
        Ok(())
    }
}
