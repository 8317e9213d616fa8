//! Overlay store — the ordered annotation and comment collections.
//!
//! All mutation of the overlay lists goes through this type so the two
//! invariants hold at every call site: coordinates are clamped to
//! `[0, 100]` after any mutation, and annotation z-order is exactly the
//! sequence position (later index = drawn on top). Comments render above
//! every annotation and are independent of stacking order.
//!
//! Mutations on an unknown id are silent no-ops, not errors: UI races such
//! as deleting an entity mid-drag are expected and should degrade
//! gracefully.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::coords::clamp_percent;

/// Default text color for new annotations (opaque white).
pub const DEFAULT_ANNOTATION_COLOR: [u8; 4] = [255, 255, 255, 255];
/// Default annotation size in px at [`crate::coords::REFERENCE_WIDTH`].
pub const DEFAULT_FONT_SIZE: f32 = 32.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// A draggable, styled text label positioned on the image.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Annotation {
    pub id: Uuid,
    /// Horizontal position as a percentage of the surface width.
    pub x: f32,
    /// Vertical position as a percentage of the surface height.
    pub y: f32,
    pub text: String,
    /// RGBA color.
    pub color: [u8; 4],
    /// Pixel size at the reference surface width.
    pub font_size: f32,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub font_style: FontStyle,
}

impl Annotation {
    pub fn new(x: f32, y: f32, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            x: clamp_percent(x),
            y: clamp_percent(y),
            text: text.into(),
            color: DEFAULT_ANNOTATION_COLOR,
            font_size: DEFAULT_FONT_SIZE,
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
        }
    }
}

/// Field-wise partial update for an annotation. `None` fields are left
/// untouched.
#[derive(Clone, Debug, Default)]
pub struct AnnotationPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub text: Option<String>,
    pub color: Option<[u8; 4]>,
    pub font_size: Option<f32>,
    pub font_weight: Option<FontWeight>,
    pub font_style: Option<FontStyle>,
}

impl AnnotationPatch {
    pub fn position(x: f32, y: f32) -> Self {
        Self { x: Some(x), y: Some(y), ..Default::default() }
    }
}

/// A positioned discussion-thread anchor. Never part of export output.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub x: f32,
    pub y: f32,
    pub text: String,
    /// Display name, fixed at creation.
    pub author: String,
    #[serde(default)]
    pub resolved: bool,
    /// Creation time; only used to sort the review list (newest first).
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(x: f32, y: f32, text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            x: clamp_percent(x),
            y: clamp_percent(y),
            text: text.into(),
            author: author.into(),
            resolved: false,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct CommentPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub text: Option<String>,
    pub resolved: Option<bool>,
}

// ============================================================================
// STORE
// ============================================================================

/// Ordered overlay collections for the current editing session.
///
/// Every mutator returns `true` when it changed something, so the caller
/// can decide whether a persistence pass is due.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OverlayStore {
    pub annotations: Vec<Annotation>,
    pub comments: Vec<Comment>,
}

impl OverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty() && self.comments.is_empty()
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
        self.comments.clear();
    }

    // ---- annotations -------------------------------------------------

    /// Append an annotation; it becomes topmost.
    pub fn add_annotation(&mut self, annotation: Annotation) -> Uuid {
        let id = annotation.id;
        self.annotations.push(annotation);
        id
    }

    pub fn annotation(&self, id: Uuid) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn update_annotation(&mut self, id: Uuid, patch: AnnotationPatch) -> bool {
        let Some(a) = self.annotations.iter_mut().find(|a| a.id == id) else {
            return false;
        };
        if let Some(x) = patch.x {
            a.x = clamp_percent(x);
        }
        if let Some(y) = patch.y {
            a.y = clamp_percent(y);
        }
        if let Some(text) = patch.text {
            a.text = text;
        }
        if let Some(color) = patch.color {
            a.color = color;
        }
        if let Some(size) = patch.font_size {
            a.font_size = size.max(1.0);
        }
        if let Some(weight) = patch.font_weight {
            a.font_weight = weight;
        }
        if let Some(style) = patch.font_style {
            a.font_style = style;
        }
        true
    }

    pub fn remove_annotation(&mut self, id: Uuid) -> bool {
        let before = self.annotations.len();
        self.annotations.retain(|a| a.id != id);
        self.annotations.len() != before
    }

    /// Move the annotation to the end of the sequence (topmost). The
    /// relative order of every other annotation is unchanged.
    pub fn bring_to_front(&mut self, id: Uuid) -> bool {
        let Some(idx) = self.annotation_index(id) else { return false };
        if idx == self.annotations.len() - 1 {
            return false;
        }
        let a = self.annotations.remove(idx);
        self.annotations.push(a);
        true
    }

    /// Move the annotation to index 0 (bottommost). The relative order of
    /// every other annotation is unchanged.
    pub fn send_to_back(&mut self, id: Uuid) -> bool {
        let Some(idx) = self.annotation_index(id) else { return false };
        if idx == 0 {
            return false;
        }
        let a = self.annotations.remove(idx);
        self.annotations.insert(0, a);
        true
    }

    /// Swap the annotation with its immediate successor (one step toward
    /// the top).
    pub fn move_forward(&mut self, id: Uuid) -> bool {
        let Some(idx) = self.annotation_index(id) else { return false };
        if idx + 1 >= self.annotations.len() {
            return false;
        }
        self.annotations.swap(idx, idx + 1);
        true
    }

    /// Swap the annotation with its immediate predecessor (one step toward
    /// the bottom).
    pub fn move_backward(&mut self, id: Uuid) -> bool {
        let Some(idx) = self.annotation_index(id) else { return false };
        if idx == 0 {
            return false;
        }
        self.annotations.swap(idx, idx - 1);
        true
    }

    fn annotation_index(&self, id: Uuid) -> Option<usize> {
        self.annotations.iter().position(|a| a.id == id)
    }

    // ---- comments ----------------------------------------------------

    pub fn add_comment(&mut self, comment: Comment) -> Uuid {
        let id = comment.id;
        self.comments.push(comment);
        id
    }

    pub fn comment(&self, id: Uuid) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    pub fn update_comment(&mut self, id: Uuid, patch: CommentPatch) -> bool {
        let Some(c) = self.comments.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        if let Some(x) = patch.x {
            c.x = clamp_percent(x);
        }
        if let Some(y) = patch.y {
            c.y = clamp_percent(y);
        }
        if let Some(text) = patch.text {
            c.text = text;
        }
        if let Some(resolved) = patch.resolved {
            c.resolved = resolved;
        }
        true
    }

    pub fn remove_comment(&mut self, id: Uuid) -> bool {
        let before = self.comments.len();
        self.comments.retain(|c| c.id != id);
        self.comments.len() != before
    }

    pub fn toggle_resolved(&mut self, id: Uuid) -> bool {
        let Some(c) = self.comments.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        c.resolved = !c.resolved;
        true
    }

    /// Comments sorted for the review panel, newest first.
    pub fn comments_newest_first(&self) -> Vec<&Comment> {
        let mut list: Vec<&Comment> = self.comments.iter().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three annotations labelled A (bottom), B, C (top).
    fn abc_store() -> (OverlayStore, Uuid, Uuid, Uuid) {
        let mut store = OverlayStore::new();
        let a = store.add_annotation(Annotation::new(10.0, 10.0, "A"));
        let b = store.add_annotation(Annotation::new(20.0, 20.0, "B"));
        let c = store.add_annotation(Annotation::new(30.0, 30.0, "C"));
        (store, a, b, c)
    }

    fn order(store: &OverlayStore) -> Vec<&str> {
        store.annotations.iter().map(|a| a.text.as_str()).collect()
    }

    #[test]
    fn test_add_appends_topmost() {
        let (store, _, _, c) = abc_store();
        assert_eq!(store.annotations.last().unwrap().id, c);
    }

    #[test]
    fn test_send_to_back_then_move_forward_scenario() {
        let (mut store, _, _, c) = abc_store();
        assert!(store.send_to_back(c));
        assert_eq!(order(&store), ["C", "A", "B"]);
        assert!(store.move_forward(c));
        assert_eq!(order(&store), ["A", "C", "B"]);
    }

    #[test]
    fn test_bring_to_front_then_send_to_back_preserves_others() {
        let (mut store, a, _, _) = abc_store();
        assert!(store.bring_to_front(a));
        assert_eq!(order(&store), ["B", "C", "A"]);
        assert!(store.send_to_back(a));
        // A is back at the bottom and B/C kept their relative order.
        assert_eq!(order(&store), ["A", "B", "C"]);
    }

    #[test]
    fn test_move_forward_then_backward_is_identity() {
        let (mut store, _, b, _) = abc_store();
        assert!(store.move_forward(b));
        assert!(store.move_backward(b));
        assert_eq!(order(&store), ["A", "B", "C"]);
    }

    #[test]
    fn test_reorder_noops_at_ends() {
        let (mut store, a, _, c) = abc_store();
        assert!(!store.move_forward(c));
        assert!(!store.move_backward(a));
        assert!(!store.bring_to_front(c));
        assert!(!store.send_to_back(a));
        assert_eq!(order(&store), ["A", "B", "C"]);
    }

    #[test]
    fn test_unknown_id_is_silent_noop() {
        let (mut store, _, _, _) = abc_store();
        let ghost = Uuid::new_v4();
        assert!(!store.update_annotation(ghost, AnnotationPatch::position(1.0, 1.0)));
        assert!(!store.remove_annotation(ghost));
        assert!(!store.bring_to_front(ghost));
        assert!(!store.send_to_back(ghost));
        assert!(!store.move_forward(ghost));
        assert!(!store.move_backward(ghost));
        assert!(!store.update_comment(ghost, CommentPatch::default()));
        assert!(!store.remove_comment(ghost));
        assert_eq!(order(&store), ["A", "B", "C"]);
    }

    #[test]
    fn test_update_clamps_coordinates() {
        let (mut store, a, _, _) = abc_store();
        assert!(store.update_annotation(a, AnnotationPatch::position(-20.0, 140.0)));
        let ann = store.annotation(a).unwrap();
        assert_eq!((ann.x, ann.y), (0.0, 100.0));
    }

    #[test]
    fn test_creation_clamps_coordinates() {
        let a = Annotation::new(-3.0, 250.0, "x");
        assert_eq!((a.x, a.y), (0.0, 100.0));
        let c = Comment::new(101.0, -0.5, "body", "ann");
        assert_eq!((c.x, c.y), (100.0, 0.0));
    }

    #[test]
    fn test_partial_update_leaves_other_fields() {
        let (mut store, a, _, _) = abc_store();
        let patch = AnnotationPatch { text: Some("renamed".into()), ..Default::default() };
        assert!(store.update_annotation(a, patch));
        let ann = store.annotation(a).unwrap();
        assert_eq!(ann.text, "renamed");
        assert_eq!((ann.x, ann.y), (10.0, 10.0));
        assert_eq!(ann.font_size, DEFAULT_FONT_SIZE);
    }

    #[test]
    fn test_comments_sorted_newest_first() {
        let mut store = OverlayStore::new();
        let mut older = Comment::new(5.0, 5.0, "first", "kim");
        older.created_at = Utc::now() - chrono::Duration::minutes(10);
        let older_id = store.add_comment(older);
        let newer_id = store.add_comment(Comment::new(6.0, 6.0, "second", "kim"));

        let list = store.comments_newest_first();
        assert_eq!(list[0].id, newer_id);
        assert_eq!(list[1].id, older_id);
    }

    #[test]
    fn test_toggle_resolved() {
        let mut store = OverlayStore::new();
        let id = store.add_comment(Comment::new(1.0, 1.0, "check this", "lee"));
        assert!(store.toggle_resolved(id));
        assert!(store.comment(id).unwrap().resolved);
        assert!(store.toggle_resolved(id));
        assert!(!store.comment(id).unwrap().resolved);
    }
}
