//! Drag session manager.
//!
//! One pointer-drag gesture moves one annotation. The session owns a *live*
//! candidate position that the canvas renders from while the gesture is in
//! progress; the committed entity in the [`OverlayStore`] is untouched until
//! the pointer is released, so a gesture produces exactly one store
//! mutation (and one persistence pass) no matter how many move events fire.
//!
//! The state is a two-variant enum rather than a nullable session so a
//! cancelled gesture cannot leak a stale candidate into the next render.

use uuid::Uuid;

use crate::coords::{SurfaceRect, to_percent, to_pixels};
use crate::overlay::{AnnotationPatch, OverlayStore};

/// Snap grid pitch in device pixels, anchored at the surface origin.
pub const SNAP_GRID_PX: f32 = 10.0;

/// Ephemeral state of one in-progress drag. Never persisted.
#[derive(Clone, Debug)]
pub struct DragSession {
    /// The annotation being moved.
    pub target_id: Uuid,
    /// Pointer position (device px) at gesture start.
    start_pointer: (f32, f32),
    /// The entity's committed position (percent) at gesture start.
    start_entity: (f32, f32),
    /// Surface bounds captured once at gesture start.
    container: SurfaceRect,
    /// Current candidate position (percent). The only value the renderer
    /// reads for the target while the gesture is active.
    live_position: (f32, f32),
}

#[derive(Clone, Debug, Default)]
pub enum DragState {
    #[default]
    Idle,
    Active(DragSession),
}

impl DragState {
    pub fn is_active(&self) -> bool {
        matches!(self, DragState::Active(_))
    }

    /// Start a gesture over `target_id`. Refused (returns `false`) while
    /// another session is active; callers additionally gate on no placement
    /// tool being selected.
    pub fn begin(
        &mut self,
        target_id: Uuid,
        start_entity: (f32, f32),
        pointer: (f32, f32),
        container: SurfaceRect,
    ) -> bool {
        if self.is_active() {
            return false;
        }
        *self = DragState::Active(DragSession {
            target_id,
            start_pointer: pointer,
            start_entity,
            container,
            live_position: start_entity,
        });
        true
    }

    /// Feed a pointer-move event; recomputes the live candidate position.
    /// No-op when idle.
    pub fn pointer_moved(&mut self, pointer: (f32, f32)) {
        if let DragState::Active(session) = self {
            session.update_live(pointer);
        }
    }

    /// While a drag is active, the live position to render `id` at instead
    /// of its committed position.
    pub fn live_override(&self, id: Uuid) -> Option<(f32, f32)> {
        match self {
            DragState::Active(session) if session.target_id == id => Some(session.live_position),
            _ => None,
        }
    }

    /// End the gesture: commit the live position to the store and return to
    /// idle. Returns `true` if the store changed. The commit is a plain
    /// `update`, so a target deleted mid-drag degrades to a no-op; a
    /// press-release with no movement commits nothing.
    pub fn commit(&mut self, store: &mut OverlayStore) -> bool {
        let state = std::mem::take(self);
        match state {
            DragState::Active(session) => {
                let (x, y) = session.live_position;
                if (x, y) == session.start_entity {
                    return false;
                }
                store.update_annotation(session.target_id, AnnotationPatch::position(x, y))
            }
            DragState::Idle => false,
        }
    }

    /// Abort the gesture with no store mutation. Always leaves the state
    /// idle, even if the platform failed to release pointer capture.
    pub fn cancel(&mut self) {
        *self = DragState::Idle;
    }
}

impl DragSession {
    fn update_live(&mut self, pointer: (f32, f32)) {
        let dx = pointer.0 - self.start_pointer.0;
        let dy = pointer.1 - self.start_pointer.1;
        if dx == 0.0 && dy == 0.0 {
            // A press with no motion must not snap the entity to the grid.
            self.live_position = self.start_entity;
            return;
        }

        // Start position in surface-local pixels, plus the pointer delta.
        let (sx, sy) = to_pixels(
            self.start_entity.0,
            self.start_entity.1,
            self.container.width,
            self.container.height,
        );
        let candidate = (sx + dx, sy + dy);

        // Snap each axis independently to the nearest grid multiple, then
        // convert back to clamped percentages.
        let snapped_x = snap_axis(candidate.0);
        let snapped_y = snap_axis(candidate.1);
        self.live_position = to_percent(
            self.container.left + snapped_x,
            self.container.top + snapped_y,
            &self.container,
        );
    }
}

/// Round a surface-local pixel coordinate to the nearest grid multiple.
pub fn snap_axis(v: f32) -> f32 {
    (v / SNAP_GRID_PX).round() * SNAP_GRID_PX
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::Annotation;

    fn container_1000() -> SurfaceRect {
        SurfaceRect::new(0.0, 0.0, 1000.0, 1000.0)
    }

    fn store_with_annotation(x: f32, y: f32) -> (OverlayStore, Uuid) {
        let mut store = OverlayStore::new();
        let id = store.add_annotation(Annotation::new(x, y, "label"));
        (store, id)
    }

    #[test]
    fn test_snap_axis_rounds_to_nearest_multiple() {
        assert_eq!(snap_axis(0.0), 0.0);
        assert_eq!(snap_axis(4.9), 0.0);
        assert_eq!(snap_axis(5.0), 10.0);
        assert_eq!(snap_axis(147.0), 150.0);
        assert_eq!(snap_axis(-13.0), -10.0);
    }

    #[test]
    fn test_drag_five_percent_on_1000px_container() {
        // (10,10) dragged by +50px on a 1000px surface with
        // a 10px grid commits exactly on the 1% boundary at (15,15).
        let (mut store, id) = store_with_annotation(10.0, 10.0);
        let mut drag = DragState::Idle;
        assert!(drag.begin(id, (10.0, 10.0), (100.0, 100.0), container_1000()));
        drag.pointer_moved((150.0, 150.0));
        assert!(drag.commit(&mut store));
        let a = store.annotation(id).unwrap();
        assert!((a.x - 15.0).abs() < 1e-3, "x = {}", a.x);
        assert!((a.y - 15.0).abs() < 1e-3, "y = {}", a.y);
    }

    #[test]
    fn test_live_position_is_grid_aligned_and_in_range() {
        let (_store, id) = store_with_annotation(10.0, 10.0);
        let mut drag = DragState::Idle;
        drag.begin(id, (10.0, 10.0), (0.0, 0.0), container_1000());

        for delta in [-500.0_f32, -123.4, -7.0, 0.0, 3.3, 48.6, 333.0, 2000.0] {
            drag.pointer_moved((delta, delta / 2.0));
            let (x, y) = drag.live_override(id).unwrap();
            assert!((0.0..=100.0).contains(&x));
            assert!((0.0..=100.0).contains(&y));
            // Within bounds the pixel position is a grid multiple; at the
            // edges clamping wins over grid alignment.
            let (px, py) = to_pixels(x, y, 1000.0, 1000.0);
            if (0.0 + f32::EPSILON..100.0).contains(&x) {
                assert!((px / SNAP_GRID_PX).fract().abs() < 1e-3, "px {px} not snapped");
            }
            if (0.0 + f32::EPSILON..100.0).contains(&y) {
                assert!((py / SNAP_GRID_PX).fract().abs() < 1e-3, "py {py} not snapped");
            }
        }
    }

    #[test]
    fn test_committed_entity_untouched_while_dragging() {
        let (mut store, id) = store_with_annotation(10.0, 10.0);
        let mut drag = DragState::Idle;
        drag.begin(id, (10.0, 10.0), (100.0, 100.0), container_1000());
        drag.pointer_moved((400.0, 400.0));

        let a = store.annotation(id).unwrap();
        assert_eq!((a.x, a.y), (10.0, 10.0));
        assert_ne!(drag.live_override(id).unwrap(), (10.0, 10.0));

        drag.commit(&mut store);
        let a = store.annotation(id).unwrap();
        assert_eq!((a.x, a.y), (40.0, 40.0));
    }

    #[test]
    fn test_cancel_discards_without_mutation() {
        let (mut store, id) = store_with_annotation(25.0, 25.0);
        let mut drag = DragState::Idle;
        drag.begin(id, (25.0, 25.0), (0.0, 0.0), container_1000());
        drag.pointer_moved((500.0, 500.0));
        drag.cancel();

        assert!(!drag.is_active());
        assert!(drag.live_override(id).is_none());
        let a = store.annotation(id).unwrap();
        assert_eq!((a.x, a.y), (25.0, 25.0));

        // A commit after cancel must not resurrect the session.
        assert!(!drag.commit(&mut store));
    }

    #[test]
    fn test_press_release_without_motion_commits_nothing() {
        // Committed position 12.3% is off-grid; a plain click must neither
        // snap it nor count as a store change.
        let (mut store, id) = store_with_annotation(12.3, 45.6);
        let mut drag = DragState::Idle;
        drag.begin(id, (12.3, 45.6), (123.0, 456.0), container_1000());
        drag.pointer_moved((123.0, 456.0));
        assert!(!drag.commit(&mut store));
        let a = store.annotation(id).unwrap();
        assert_eq!((a.x, a.y), (12.3, 45.6));
    }

    #[test]
    fn test_only_one_session_at_a_time() {
        let (_store, id) = store_with_annotation(10.0, 10.0);
        let other = Uuid::new_v4();
        let mut drag = DragState::Idle;
        assert!(drag.begin(id, (10.0, 10.0), (0.0, 0.0), container_1000()));
        assert!(!drag.begin(other, (50.0, 50.0), (0.0, 0.0), container_1000()));
        assert_eq!(drag.live_override(id), Some((10.0, 10.0)));
    }

    #[test]
    fn test_commit_after_target_deleted_is_noop() {
        let (mut store, id) = store_with_annotation(10.0, 10.0);
        let mut drag = DragState::Idle;
        drag.begin(id, (10.0, 10.0), (0.0, 0.0), container_1000());
        drag.pointer_moved((300.0, 0.0));
        store.remove_annotation(id);
        assert!(!drag.commit(&mut store));
        assert!(!drag.is_active());
    }

    #[test]
    fn test_drag_clamps_at_surface_edges() {
        let (mut store, id) = store_with_annotation(95.0, 5.0);
        let mut drag = DragState::Idle;
        drag.begin(id, (95.0, 5.0), (950.0, 50.0), container_1000());
        drag.pointer_moved((2000.0, -400.0));
        drag.commit(&mut store);
        let a = store.annotation(id).unwrap();
        assert_eq!((a.x, a.y), (100.0, 0.0));
    }

    #[test]
    fn test_live_override_only_for_target() {
        let (_store, id) = store_with_annotation(10.0, 10.0);
        let mut drag = DragState::Idle;
        drag.begin(id, (10.0, 10.0), (0.0, 0.0), container_1000());
        assert!(drag.live_override(Uuid::new_v4()).is_none());
        assert!(drag.live_override(id).is_some());
    }
}
