//! Revision history — the ordered list of generated image revisions and
//! the cursor selecting the one being viewed.
//!
//! Entries are newest-first: index 0 is the most recent generation and new
//! entries are always inserted at the front. That inverts the usual
//! undo/redo index direction, so navigation is named `go_older` /
//! `go_newer` rather than undo/redo: moving to an *older* revision
//! *increases* the index.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Opaque reference to a base-image blob. The engine never inspects it;
/// the compositor resolves it (currently: a filesystem path) when it needs
/// pixels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef(pub String);

impl ImageRef {
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

/// Generation parameters that were active when a revision was produced.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(default)]
    pub complexity: u32,
    #[serde(default)]
    pub style: String,
}

/// One immutable image revision.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RevisionEntry {
    pub id: Uuid,
    pub image: ImageRef,
    /// Prompt text that produced this revision.
    pub prompt: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub params: GenerationParams,
}

impl RevisionEntry {
    pub fn new(image: ImageRef, prompt: impl Into<String>, params: GenerationParams) -> Self {
        Self {
            id: Uuid::new_v4(),
            image,
            prompt: prompt.into(),
            created_at: Utc::now(),
            params,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum HistoryError {
    /// Navigation or active-entry query on an empty history.
    EmptyHistory,
    /// `jump_to` target outside `0..len`.
    IndexOutOfRange { index: usize, len: usize },
}

impl std::fmt::Display for HistoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryError::EmptyHistory => write!(f, "history is empty"),
            HistoryError::IndexOutOfRange { index, len } => {
                write!(f, "revision index {} out of range (len {})", index, len)
            }
        }
    }
}

impl std::error::Error for HistoryError {}

/// Newest-first revision list plus the viewing cursor.
///
/// Invariant: `current_index < entries.len()` whenever the list is
/// non-empty. An empty navigator accepts only `push_newest`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct HistoryNavigator {
    entries: Vec<RevisionEntry>,
    current_index: usize,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted parts; an out-of-range cursor is clamped so a
    /// hand-edited or truncated project file still loads.
    pub fn from_parts(entries: Vec<RevisionEntry>, current_index: usize) -> Self {
        let current_index = if entries.is_empty() {
            0
        } else {
            current_index.min(entries.len() - 1)
        };
        Self { entries, current_index }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RevisionEntry] {
        &self.entries
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Insert a new revision at index 0 and view it.
    pub fn push_newest(&mut self, entry: RevisionEntry) {
        self.entries.insert(0, entry);
        self.current_index = 0;
    }

    /// Step toward older revisions (index grows). Returns `false` when
    /// already at the oldest entry or the history is empty.
    pub fn go_older(&mut self) -> bool {
        if self.entries.is_empty() || self.current_index + 1 >= self.entries.len() {
            return false;
        }
        self.current_index += 1;
        true
    }

    /// Step toward newer revisions (index shrinks). Returns `false` at
    /// index 0 or on an empty history.
    pub fn go_newer(&mut self) -> bool {
        if self.entries.is_empty() || self.current_index == 0 {
            return false;
        }
        self.current_index -= 1;
        true
    }

    /// Move the cursor directly. Out-of-range indices are rejected without
    /// mutating the cursor.
    pub fn jump_to(&mut self, index: usize) -> Result<(), HistoryError> {
        if index >= self.entries.len() {
            return Err(HistoryError::IndexOutOfRange { index, len: self.entries.len() });
        }
        self.current_index = index;
        Ok(())
    }

    /// The revision currently being viewed.
    pub fn active(&self) -> Result<&RevisionEntry, HistoryError> {
        self.entries.get(self.current_index).ok_or(HistoryError::EmptyHistory)
    }

    pub fn at_newest(&self) -> bool {
        self.current_index == 0
    }

    pub fn at_oldest(&self) -> bool {
        self.entries.is_empty() || self.current_index + 1 == self.entries.len()
    }
}
