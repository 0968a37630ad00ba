//! Folder tree navigation over a flat list of folders
//!
//! The backend only stores parent pointers. Walks are bounded by the number of
//! loaded folders so a corrupted cycle surfaces as an error instead of hanging
//! the UI.

use std::collections::{HashMap, HashSet, VecDeque};

use tempus_api::models::{Folder, FolderId, Note};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("Folder {0} is not loaded")]
    UnknownFolder(FolderId),

    #[error("Folder {folder_id} has a corrupt ancestry (stopped after {depth} levels)")]
    CorruptHierarchy { folder_id: FolderId, depth: usize },
}

#[derive(Debug, Default)]
pub struct FolderTree<'a> {
    by_id: HashMap<FolderId, &'a Folder>,
    children: HashMap<Option<FolderId>, Vec<&'a Folder>>,
}

impl<'a> FolderTree<'a> {
    pub fn new(folders: &'a [Folder]) -> Self {
        let by_id: HashMap<FolderId, &Folder> = folders.iter().map(|f| (f.id, f)).collect();
        let mut children: HashMap<Option<FolderId>, Vec<&Folder>> = HashMap::new();
        for folder in folders {
            // A parent that is not loaded makes the folder a root.
            let parent = folder.parent_id.filter(|id| by_id.contains_key(id));
            children.entry(parent).or_default().push(folder);
        }
        for siblings in children.values_mut() {
            siblings.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        }
        Self { by_id, children }
    }

    pub fn get(&self, id: FolderId) -> Option<&'a Folder> {
        self.by_id.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn roots(&self) -> &[&'a Folder] {
        self.children(None)
    }

    pub fn children(&self, parent: Option<FolderId>) -> &[&'a Folder] {
        self.children
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Root-first chain ending at `id`. A parent that is not loaded ends the
    /// walk early.
    pub fn folder_path(&self, id: FolderId) -> Result<Vec<&'a Folder>, HierarchyError> {
        let mut current = self.get(id).ok_or(HierarchyError::UnknownFolder(id))?;
        let mut path = vec![current];

        while let Some(parent_id) = current.parent_id {
            if path.len() > self.len() {
                return Err(HierarchyError::CorruptHierarchy {
                    folder_id: id,
                    depth: path.len(),
                });
            }
            let Some(parent) = self.get(parent_id) else {
                break;
            };
            path.push(parent);
            current = parent;
        }

        path.reverse();
        Ok(path)
    }

    /// Every folder below `id`, breadth first. Cycles are visited once.
    pub fn descendants(&self, id: FolderId) -> Vec<&'a Folder> {
        let mut seen = HashSet::from([id]);
        let mut queue = VecDeque::from([id]);
        let mut out = Vec::new();

        while let Some(next) = queue.pop_front() {
            for child in self.children(Some(next)) {
                if seen.insert(child.id) {
                    out.push(*child);
                    queue.push_back(child.id);
                }
            }
        }
        out
    }

    /// Folders `id` may be moved under: everything except itself and its
    /// own descendants.
    pub fn parent_candidates(&self, id: FolderId) -> Result<Vec<&'a Folder>, HierarchyError> {
        self.get(id).ok_or(HierarchyError::UnknownFolder(id))?;
        let mut excluded: HashSet<FolderId> = self.descendants(id).iter().map(|f| f.id).collect();
        excluded.insert(id);

        let mut candidates: Vec<&Folder> = self
            .by_id
            .values()
            .filter(|f| !excluded.contains(&f.id))
            .copied()
            .collect();
        candidates.sort_by_key(|f| f.id);
        Ok(candidates)
    }

    /// Folders no walk from the roots reaches. Only a parent cycle produces
    /// these, since a missing parent already makes a folder a root.
    pub fn unreachable(&self) -> Vec<&'a Folder> {
        let mut reached: HashSet<FolderId> = HashSet::new();
        for root in self.roots() {
            reached.insert(root.id);
            reached.extend(self.descendants(root.id).iter().map(|f| f.id));
        }

        let mut stranded: Vec<&Folder> = self
            .by_id
            .values()
            .filter(|f| !reached.contains(&f.id))
            .copied()
            .collect();
        stranded.sort_by_key(|f| f.id);
        stranded
    }

    /// Whether moving `id` under `new_parent` keeps the tree acyclic.
    pub fn can_reparent(&self, id: FolderId, new_parent: Option<FolderId>) -> bool {
        match new_parent {
            None => true,
            Some(parent) => {
                parent != id && !self.descendants(id).iter().any(|f| f.id == parent)
            }
        }
    }

    /// `Work / Clients / Acme`
    pub fn breadcrumbs(&self, id: FolderId) -> Result<String, HierarchyError> {
        let path = self.folder_path(id)?;
        Ok(path
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join(" / "))
    }
}

/// Notes directly inside `folder`; `None` picks notes outside any folder.
pub fn notes_in(notes: &[Note], folder: Option<FolderId>) -> Vec<&Note> {
    notes
        .iter()
        .filter(|note| note.folder_id == folder)
        .collect()
}
