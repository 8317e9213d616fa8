//! Project document — the unit the app shell opens, edits, and persists.

use std::path::PathBuf;
use uuid::Uuid;

use crate::history::{HistoryNavigator, RevisionEntry};
use crate::overlay::OverlayStore;

/// Single open document: the overlay store, the revision history, and the
/// bookkeeping the shell needs to know when to persist it.
pub struct Project {
    pub id: Uuid,
    pub store: OverlayStore,
    pub history: HistoryNavigator,
    /// `None` for unsaved/untitled projects.
    pub path: Option<PathBuf>,
    pub is_dirty: bool,
    /// Display name (derived from path or "Untitled").
    pub name: String,
}

impl Project {
    pub fn new_untitled() -> Self {
        Self {
            id: Uuid::new_v4(),
            store: OverlayStore::new(),
            history: HistoryNavigator::new(),
            path: None,
            is_dirty: false,
            name: "Untitled".to_string(),
        }
    }

    pub fn from_file(path: PathBuf, store: OverlayStore, history: HistoryNavigator) -> Self {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        Self {
            id: Uuid::new_v4(),
            store,
            history,
            path: Some(path),
            is_dirty: false,
            name,
        }
    }

    /// Accept a newly generated revision. The base image identity changes,
    /// so the overlay set is cleared; plain history *navigation* never
    /// clears it (overlays belong to the editing session, not to a single
    /// revision).
    pub fn push_generation(&mut self, entry: RevisionEntry) {
        self.history.push_newest(entry);
        self.store.clear();
        self.mark_dirty();
    }

    /// Re-derive the display name after the path changes (Save As).
    pub fn update_name_from_path(&mut self) {
        if let Some(path) = &self.path {
            if let Some(stem) = path.file_stem() {
                self.name = stem.to_string_lossy().to_string();
            }
        }
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.is_dirty = false;
    }

    /// Window/tab title with dirty indicator.
    pub fn display_title(&self) -> String {
        if self.is_dirty {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{GenerationParams, ImageRef};
    use crate::overlay::Annotation;

    fn rev(name: &str) -> RevisionEntry {
        RevisionEntry::new(
            ImageRef(format!("{name}.png")),
            name,
            GenerationParams::default(),
        )
    }

    #[test]
    fn test_new_generation_clears_overlays() {
        let mut project = Project::new_untitled();
        project.push_generation(rev("v1"));
        project.store.add_annotation(Annotation::new(10.0, 10.0, "note"));

        project.push_generation(rev("v2"));
        assert!(project.store.is_empty());
        assert!(project.is_dirty);
    }

    #[test]
    fn test_history_navigation_keeps_overlays() {
        let mut project = Project::new_untitled();
        project.push_generation(rev("v1"));
        project.push_generation(rev("v2"));
        project.store.add_annotation(Annotation::new(10.0, 10.0, "note"));

        assert!(project.history.go_older());
        assert_eq!(project.store.annotations.len(), 1);
        assert!(project.history.go_newer());
        assert_eq!(project.store.annotations.len(), 1);
    }

    #[test]
    fn test_display_title_dirty_marker() {
        let mut project = Project::new_untitled();
        assert_eq!(project.display_title(), "Untitled");
        project.mark_dirty();
        assert_eq!(project.display_title(), "Untitled*");
        project.mark_clean();
        assert_eq!(project.display_title(), "Untitled");
    }

    #[test]
    fn test_from_file_uses_stem_as_name() {
        let project = Project::from_file(
            PathBuf::from("/work/poster-review.mkb"),
            OverlayStore::new(),
            HistoryNavigator::new(),
        );
        assert_eq!(project.name, "poster-review");
        assert!(!project.is_dirty);
    }
}
