//! Glyph layout and rasterization for export text.
//!
//! On-screen annotation text is drawn by egui; this module only exists for
//! the compositor, which renders at the base image's native resolution and
//! therefore rasterizes glyphs itself with `ab_glyph`. Bold is approximated
//! by a one-pixel coverage smear, italic by shearing around the baseline.

use ab_glyph::{Font, FontArc, GlyphId, ScaleFont, point};

/// A rasterized text block: RGBA pixels plus the offset of its top-left
/// corner relative to the anchor point the text is centered on.
pub struct RasterizedLabel {
    pub buf: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub off_x: i32,
    pub off_y: i32,
}

/// Lay out one line centered on x=0, returning positioned glyph ids and the
/// line width. Kerning applied between successive glyphs.
fn layout_line(font: &FontArc, line: &str, font_size: f32) -> (Vec<(GlyphId, f32)>, f32) {
    let scaled = font.as_scaled(font_size);
    let mut glyphs = Vec::new();
    let mut cursor_x = 0.0f32;
    let mut last: Option<GlyphId> = None;

    for ch in line.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = last {
            cursor_x += scaled.kern(prev, id);
        }
        glyphs.push((id, cursor_x));
        cursor_x += scaled.h_advance(id);
        last = Some(id);
    }

    let width = cursor_x;
    for g in &mut glyphs {
        g.1 -= width * 0.5;
    }
    (glyphs, width)
}

/// Rasterize `text` centered (horizontally and vertically) on the anchor
/// point. Multi-line via `'\n'`. Returns `None` for text that produces no
/// coverage (empty or whitespace-only with no outlines).
pub fn rasterize_label(
    font: &FontArc,
    text: &str,
    font_size: f32,
    color: [u8; 4],
    bold: bool,
    italic: bool,
) -> Option<RasterizedLabel> {
    let scaled = font.as_scaled(font_size);
    let ascent = scaled.ascent();
    let line_height = scaled.height();

    let lines: Vec<&str> = text.split('\n').collect();
    let block_height = line_height * lines.len() as f32;

    // Glyph positions relative to the anchor: lines stack downward from
    // -block_height/2 so the whole block is vertically centered.
    let mut all_glyphs: Vec<(GlyphId, f32, f32)> = Vec::new();
    for (line_idx, line) in lines.iter().enumerate() {
        let baseline_y = -block_height * 0.5 + line_idx as f32 * line_height + ascent;
        let (glyphs, _) = layout_line(font, line, font_size);
        for (id, x) in glyphs {
            all_glyphs.push((id, x, baseline_y));
        }
    }

    if all_glyphs.is_empty() {
        return None;
    }

    // Bounding box over all glyph outlines.
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    for &(id, gx, gy) in &all_glyphs {
        let glyph = id.with_scale_and_position(font_size, point(gx, gy));
        let bounds = font.glyph_bounds(&glyph);
        min_x = min_x.min(bounds.min.x);
        min_y = min_y.min(bounds.min.y);
        max_x = max_x.max(bounds.max.x);
        max_y = max_y.max(bounds.max.y);
    }
    if min_x >= max_x || min_y >= max_y {
        return None;
    }

    // Padding absorbs the bold smear and italic shear.
    let pad = 2.0 + if italic { font_size * 0.25 } else { 0.0 };
    min_x -= pad;
    min_y -= 2.0;
    max_x += pad;
    max_y += 2.0;

    let off_x = min_x.floor() as i32;
    let off_y = min_y.floor() as i32;
    let width = (max_x.ceil() as i32 - off_x).max(1) as u32;
    let height = (max_y.ceil() as i32 - off_y).max(1) as u32;

    let mut coverage = vec![0.0f32; width as usize * height as usize];

    for &(id, gx, gy) in &all_glyphs {
        let glyph = id.with_scale_and_position(font_size, point(gx, gy));
        let Some(outlined) = font.outline_glyph(glyph) else { continue };
        let b = outlined.px_bounds();
        outlined.draw(|px, py, cov| {
            let mut cx = b.min.x + px as f32;
            let cy = b.min.y + py as f32;
            if italic {
                // Shear around this glyph's baseline.
                cx += (gy - cy) * 0.2;
            }
            let ix = cx.round() as i32 - off_x;
            let iy = cy.round() as i32 - off_y;
            if ix >= 0 && iy >= 0 && (ix as u32) < width && (iy as u32) < height {
                let idx = iy as usize * width as usize + ix as usize;
                coverage[idx] = coverage[idx].max(cov);
                if bold && (ix as u32) + 1 < width {
                    coverage[idx + 1] = coverage[idx + 1].max(cov);
                }
            }
        });
    }

    // Coverage -> premixed RGBA.
    let mut buf = vec![0u8; width as usize * height as usize * 4];
    let mut any = false;
    for (i, &cov) in coverage.iter().enumerate() {
        if cov > 0.001 {
            any = true;
            let a = (color[3] as f32 * cov).round().min(255.0) as u8;
            let idx = i * 4;
            buf[idx] = color[0];
            buf[idx + 1] = color[1];
            buf[idx + 2] = color[2];
            buf[idx + 3] = a;
        }
    }
    if !any {
        return None;
    }

    Some(RasterizedLabel { buf, width, height, off_x, off_y })
}

/// Locate a system sans-serif font for export rendering.
///
/// Returns `None` when the platform has no usable font; the compositor
/// reports that as an export failure rather than drawing nothing silently.
pub fn load_export_font() -> Option<FontArc> {
    use font_kit::family_name::FamilyName;
    use font_kit::properties::Properties;
    use font_kit::source::SystemSource;

    let handle = SystemSource::new()
        .select_best_match(&[FamilyName::SansSerif], &Properties::new())
        .ok()?;
    let font = handle.load().ok()?;
    let data = font.copy_font_data()?;
    FontArc::try_from_vec((*data).clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_yields_no_label() {
        let Some(font) = load_export_font() else { return };
        assert!(rasterize_label(&font, "", 32.0, [255, 255, 255, 255], false, false).is_none());
    }

    #[test]
    fn test_label_roughly_centered_on_anchor() {
        let Some(font) = load_export_font() else { return };
        let label = rasterize_label(&font, "OO", 40.0, [255, 0, 0, 255], false, false)
            .expect("glyphs should produce coverage");
        // Center of the buffer should sit near the anchor (0,0): the
        // offsets are negative and about half the buffer size.
        let cx = label.off_x as f32 + label.width as f32 / 2.0;
        let cy = label.off_y as f32 + label.height as f32 / 2.0;
        assert!(cx.abs() < 6.0, "horizontal center off by {cx}");
        assert!(cy.abs() < 10.0, "vertical center off by {cy}");
    }

    #[test]
    fn test_bold_has_at_least_as_much_coverage() {
        let Some(font) = load_export_font() else { return };
        let plain = rasterize_label(&font, "M", 40.0, [0, 0, 0, 255], false, false).unwrap();
        let bold = rasterize_label(&font, "M", 40.0, [0, 0, 0, 255], true, false).unwrap();
        let sum = |l: &RasterizedLabel| -> u64 {
            l.buf.chunks_exact(4).map(|px| px[3] as u64).sum()
        };
        assert!(sum(&bold) >= sum(&plain));
    }
}
