//! Compositor — flattens the active base image plus annotations into a
//! single RGBA bitmap at the image's native resolution, for export and for
//! history-strip thumbnails.
//!
//! Comments are collaboration metadata, not design content; they are never
//! drawn into export output. Annotations are drawn in store order so later
//! entries land on top, matching the editor's z-order exactly.

use ab_glyph::FontArc;
use image::RgbaImage;
use rayon::prelude::*;

use crate::coords::{REFERENCE_WIDTH, to_pixels};
use crate::history::ImageRef;
use crate::overlay::{Annotation, FontStyle, FontWeight};
use crate::text::{load_export_font, rasterize_label};

/// Longest edge of a history-strip thumbnail.
const THUMBNAIL_MAX_EDGE: u32 = 256;

#[derive(Debug)]
pub enum CompositeError {
    /// The base image could not be read or decoded. No partial output is
    /// produced; callers surface this as a non-fatal, user-visible error.
    ImageLoad(String),
    /// No usable system font for rendering annotation text.
    FontUnavailable,
}

impl std::fmt::Display for CompositeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompositeError::ImageLoad(e) => write!(f, "failed to load base image: {}", e),
            CompositeError::FontUnavailable => write!(f, "no system font available for export"),
        }
    }
}

impl std::error::Error for CompositeError {}

/// Resolve and decode a base-image reference at native resolution.
pub fn load_base_image(image: &ImageRef) -> Result<RgbaImage, CompositeError> {
    image::open(image.as_path())
        .map(|img| img.to_rgba8())
        .map_err(|e| CompositeError::ImageLoad(e.to_string()))
}

/// Flatten `base` plus `annotations` onto a fresh bitmap.
///
/// `background` fills the canvas before the base image is drawn; required
/// for alpha-less targets (JPEG), optional otherwise.
pub fn compose(
    base: &RgbaImage,
    annotations: &[Annotation],
    font: &FontArc,
    background: Option<[u8; 4]>,
) -> RgbaImage {
    let (w, h) = base.dimensions();
    let mut out = match background {
        Some(bg) => {
            let mut canvas = RgbaImage::new(w, h);
            canvas
                .as_mut()
                .par_chunks_exact_mut(4)
                .for_each(|px| px.copy_from_slice(&bg));
            // Blend the base over the fill so transparent generations keep
            // the chosen backdrop.
            blend_image(&mut canvas, base);
            canvas
        }
        None => base.clone(),
    };

    // Text occupies the same visual proportion of the image at any native
    // resolution: scale authored sizes by width relative to the reference.
    let scale = w as f32 / REFERENCE_WIDTH;

    for a in annotations {
        if a.text.trim().is_empty() {
            continue;
        }
        let (ax, ay) = to_pixels(a.x, a.y, w as f32, h as f32);
        let size = (a.font_size * scale).max(1.0);
        let label = rasterize_label(
            font,
            &a.text,
            size,
            a.color,
            a.font_weight == FontWeight::Bold,
            a.font_style == FontStyle::Italic,
        );
        if let Some(label) = label {
            blend_label(&mut out, &label.buf, label.width, label.height,
                ax.round() as i32 + label.off_x,
                ay.round() as i32 + label.off_y);
        }
    }

    out
}

/// Load the revision's base image and flatten the annotations over it.
/// Fails without partial output if the image is unreadable or no export
/// font exists.
pub fn compose_revision(
    image: &ImageRef,
    annotations: &[Annotation],
    background: Option<[u8; 4]>,
) -> Result<RgbaImage, CompositeError> {
    let base = load_base_image(image)?;
    let font = load_export_font().ok_or(CompositeError::FontUnavailable)?;
    Ok(compose(&base, annotations, &font, background))
}

/// Downscaled flattened composite for the history strip.
pub fn thumbnail(composite: &RgbaImage) -> RgbaImage {
    let (w, h) = composite.dimensions();
    let longest = w.max(h);
    if longest <= THUMBNAIL_MAX_EDGE {
        return composite.clone();
    }
    let scale = THUMBNAIL_MAX_EDGE as f32 / longest as f32;
    let nw = ((w as f32 * scale).round() as u32).max(1);
    let nh = ((h as f32 * scale).round() as u32).max(1);
    image::imageops::resize(composite, nw, nh, image::imageops::FilterType::Triangle)
}

/// Straight-alpha "over" blend of `src` onto `dst`, same dimensions.
fn blend_image(dst: &mut RgbaImage, src: &RgbaImage) {
    debug_assert_eq!(dst.dimensions(), src.dimensions());
    dst.as_mut()
        .par_chunks_exact_mut(4)
        .zip(src.as_raw().par_chunks_exact(4))
        .for_each(|(d, s)| blend_px(d, s));
}

/// Blend a rasterized label buffer onto the canvas at (x0, y0), clipping
/// against the canvas bounds.
fn blend_label(dst: &mut RgbaImage, buf: &[u8], bw: u32, bh: u32, x0: i32, y0: i32) {
    let (dw, dh) = dst.dimensions();
    for by in 0..bh {
        let dy = y0 + by as i32;
        if dy < 0 || dy as u32 >= dh {
            continue;
        }
        for bx in 0..bw {
            let dx = x0 + bx as i32;
            if dx < 0 || dx as u32 >= dw {
                continue;
            }
            let sidx = (by * bw + bx) as usize * 4;
            let src = &buf[sidx..sidx + 4];
            if src[3] == 0 {
                continue;
            }
            let d = dst.get_pixel_mut(dx as u32, dy as u32);
            blend_px(&mut d.0, src);
        }
    }
}

fn blend_px(d: &mut [u8], s: &[u8]) {
    let sa = s[3] as f32 / 255.0;
    if sa <= 0.0 {
        return;
    }
    let da = d[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return;
    }
    for i in 0..3 {
        let sc = s[i] as f32 / 255.0;
        let dc = d[i] as f32 / 255.0;
        let oc = (sc * sa + dc * da * (1.0 - sa)) / out_a;
        d[i] = (oc * 255.0).round() as u8;
    }
    d[3] = (out_a * 255.0).round() as u8;
}
