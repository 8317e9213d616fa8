//! Percentage-based coordinate model.
//!
//! Overlay positions are stored as percentages of the rendering surface so
//! they stay valid across zoom, window resizes, and export at native image
//! resolution. Conversions clamp to `[0, 100]`; a point converted against
//! one surface size and inverted against another lands at the same
//! *relative* position, which is the point of the scheme.

/// Width (px) at which an annotation's `font_size` is authored. Export and
/// on-screen rendering scale text by `surface_width / REFERENCE_WIDTH`.
pub const REFERENCE_WIDTH: f32 = 1000.0;

/// Bounding box of the rendering surface in device pixels.
///
/// Captured once at drag start so high-frequency pointer-move events never
/// re-query layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }

    pub fn from_egui(rect: egui::Rect) -> Self {
        Self {
            left: rect.min.x,
            top: rect.min.y,
            width: rect.width(),
            height: rect.height(),
        }
    }
}

/// Clamp a percentage coordinate into the valid `[0, 100]` range.
pub fn clamp_percent(v: f32) -> f32 {
    v.clamp(0.0, 100.0)
}

/// Convert a device-pixel point to surface-relative percentages.
///
/// Points outside the surface clamp to the nearest edge. A degenerate
/// (zero-size) surface maps everything to the origin rather than dividing
/// by zero.
pub fn to_percent(px: f32, py: f32, rect: &SurfaceRect) -> (f32, f32) {
    let x = if rect.width > 0.0 {
        clamp_percent((px - rect.left) / rect.width * 100.0)
    } else {
        0.0
    };
    let y = if rect.height > 0.0 {
        clamp_percent((py - rect.top) / rect.height * 100.0)
    } else {
        0.0
    };
    (x, y)
}

/// Convert surface-relative percentages to pixel coordinates on a concrete
/// target surface (origin at the surface's top-left).
///
/// Used at render time against the on-screen rect and at export time against
/// the base image's native dimensions.
pub fn to_pixels(x_pct: f32, y_pct: f32, target_w: f32, target_h: f32) -> (f32, f32) {
    (x_pct / 100.0 * target_w, y_pct / 100.0 * target_h)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(w: f32, h: f32) -> SurfaceRect {
        SurfaceRect::new(0.0, 0.0, w, h)
    }

    #[test]
    fn test_to_percent_center() {
        let rect = surface(800.0, 600.0);
        let (x, y) = to_percent(400.0, 300.0, &rect);
        assert_eq!((x, y), (50.0, 50.0));
    }

    #[test]
    fn test_to_percent_respects_origin() {
        let rect = SurfaceRect::new(100.0, 50.0, 200.0, 100.0);
        let (x, y) = to_percent(150.0, 100.0, &rect);
        assert_eq!((x, y), (25.0, 50.0));
    }

    #[test]
    fn test_to_percent_clamps_outside_surface() {
        let rect = surface(100.0, 100.0);
        let (x, y) = to_percent(-40.0, 250.0, &rect);
        assert_eq!((x, y), (0.0, 100.0));
    }

    #[test]
    fn test_to_percent_zero_size_surface() {
        let rect = surface(0.0, 0.0);
        let (x, y) = to_percent(123.0, 456.0, &rect);
        assert_eq!((x, y), (0.0, 0.0));
    }

    #[test]
    fn test_to_pixels_center_at_any_resolution() {
        for (w, h) in [(100.0, 100.0), (1920.0, 1080.0), (512.0, 2048.0)] {
            let (px, py) = to_pixels(50.0, 50.0, w, h);
            assert_eq!((px, py), (w / 2.0, h / 2.0));
        }
    }

    #[test]
    fn test_round_trip_same_surface() {
        let rect = SurfaceRect::new(10.0, 20.0, 640.0, 480.0);
        let (xp, yp) = to_percent(170.0, 140.0, &rect);
        let (px, py) = to_pixels(xp, yp, rect.width, rect.height);
        assert!((px + rect.left - 170.0).abs() < 1e-3);
        assert!((py + rect.top - 140.0).abs() < 1e-3);
    }

    #[test]
    fn test_round_trip_different_surface_preserves_ratio() {
        // Captured against 1000x500, inverted against 2000x1000: the point
        // lands at the same relative position, not the same absolute one.
        let rect = surface(1000.0, 500.0);
        let (xp, yp) = to_percent(250.0, 125.0, &rect);
        let (px, py) = to_pixels(xp, yp, 2000.0, 1000.0);
        assert_eq!((px, py), (500.0, 250.0));
    }

    #[test]
    fn test_clamp_percent_bounds() {
        assert_eq!(clamp_percent(-5.0), 0.0);
        assert_eq!(clamp_percent(105.0), 100.0);
        assert_eq!(clamp_percent(42.5), 42.5);
    }
}
