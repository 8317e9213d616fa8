//! Project file I/O and export encoding.
//!
//! Projects are saved as versioned JSON (`.mkb`). JSON was chosen over a
//! binary codec because the record shape is a contract with whatever stores
//! the project long-term: unknown fields must be ignored on load so newer
//! files still open in older builds. serde gives that for free here, and
//! `#[serde(default)]` covers the reverse direction.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::history::{HistoryNavigator, RevisionEntry};
use crate::overlay::{Annotation, Comment, OverlayStore};

/// Current project file version.
const MKB_VERSION: u32 = 1;

/// Error type for project file operations.
#[derive(Debug)]
pub enum MkbError {
    Io(std::io::Error),
    Serialize(String),
    InvalidFormat(String),
}

impl std::fmt::Display for MkbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MkbError::Io(e) => write!(f, "I/O error: {}", e),
            MkbError::Serialize(e) => write!(f, "Serialization error: {}", e),
            MkbError::InvalidFormat(e) => write!(f, "Invalid format: {}", e),
        }
    }
}

impl std::error::Error for MkbError {}

impl From<std::io::Error> for MkbError {
    fn from(e: std::io::Error) -> Self {
        MkbError::Io(e)
    }
}

impl From<serde_json::Error> for MkbError {
    fn from(e: serde_json::Error) -> Self {
        MkbError::Serialize(e.to_string())
    }
}

/// Serializable project record (v1).
#[derive(Serialize, Deserialize)]
pub struct ProjectFile {
    pub version: u32,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub revisions: Vec<RevisionEntry>,
    #[serde(default)]
    pub current_revision: usize,
}

/// Snapshot the store and history into the persisted record shape.
pub fn build_project_file(store: &OverlayStore, history: &HistoryNavigator) -> ProjectFile {
    ProjectFile {
        version: MKB_VERSION,
        annotations: store.annotations.clone(),
        comments: store.comments.clone(),
        revisions: history.entries().to_vec(),
        current_revision: history.current_index(),
    }
}

/// Write a `.mkb` project file.
pub fn save_project(
    store: &OverlayStore,
    history: &HistoryNavigator,
    path: &Path,
) -> Result<(), MkbError> {
    let record = build_project_file(store, history);
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &record)?;
    Ok(())
}

/// Load a `.mkb` project file back into engine state.
///
/// Coordinates are re-clamped on the way in (hand-edited files happen) and
/// a stale cursor is clamped into range rather than rejected.
pub fn load_project(path: &Path) -> Result<(OverlayStore, HistoryNavigator), MkbError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let record: ProjectFile = serde_json::from_reader(reader)?;
    if record.version > MKB_VERSION {
        return Err(MkbError::InvalidFormat(format!(
            "project file version {} is newer than supported ({})",
            record.version, MKB_VERSION
        )));
    }
    Ok(restore_project(record))
}

fn restore_project(record: ProjectFile) -> (OverlayStore, HistoryNavigator) {
    let mut store = OverlayStore {
        annotations: record.annotations,
        comments: record.comments,
    };
    for a in &mut store.annotations {
        a.x = crate::coords::clamp_percent(a.x);
        a.y = crate::coords::clamp_percent(a.y);
    }
    for c in &mut store.comments {
        c.x = crate::coords::clamp_percent(c.x);
        c.y = crate::coords::clamp_percent(c.y);
    }
    let history = HistoryNavigator::from_parts(record.revisions, record.current_revision);
    (store, history)
}

// ============================================================================
// EXPORT ENCODING
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn from_extension(path: &Path) -> Self {
        match path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .as_deref()
        {
            Some("jpg") | Some("jpeg") => ExportFormat::Jpeg,
            _ => ExportFormat::Png,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
        }
    }
}

/// Encode and write a flattened composite.
pub fn write_export(
    image: &RgbaImage,
    path: &Path,
    format: ExportFormat,
    quality: u8,
) -> Result<(), image::ImageError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    match format {
        ExportFormat::Png => {
            let encoder = PngEncoder::new(&mut writer);
            #[allow(deprecated)]
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )?;
        }
        ExportFormat::Jpeg => {
            // JPEG has no alpha; the compositor already filled a background,
            // this conversion just drops the channel.
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100));
            encoder.encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ColorType::Rgb8,
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{GenerationParams, ImageRef};
    use crate::overlay::{Annotation, Comment};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("markboard-test-{}-{}", std::process::id(), name))
    }

    fn sample_state() -> (OverlayStore, HistoryNavigator) {
        let mut store = OverlayStore::new();
        store.add_annotation(Annotation::new(12.5, 80.0, "headline"));
        store.add_comment(Comment::new(40.0, 40.0, "too dark?", "sam"));
        let mut history = HistoryNavigator::new();
        history.push_newest(RevisionEntry::new(
            ImageRef("gen/one.png".into()),
            "a lighthouse at dusk",
            GenerationParams { complexity: 3, style: "vector".into() },
        ));
        (store, history)
    }

    #[test]
    fn test_project_round_trip() {
        let (store, history) = sample_state();
        let path = temp_path("roundtrip.mkb");
        save_project(&store, &history, &path).unwrap();

        let (loaded_store, loaded_history) = load_project(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded_store.annotations.len(), 1);
        assert_eq!(loaded_store.annotations[0].text, "headline");
        assert_eq!(loaded_store.comments[0].author, "sam");
        assert_eq!(loaded_history.len(), 1);
        assert_eq!(loaded_history.current_index(), 0);
        assert_eq!(loaded_history.active().unwrap().prompt, "a lighthouse at dusk");
    }

    #[test]
    fn test_load_ignores_unknown_fields() {
        let json = r##"{
            "version": 1,
            "annotations": [],
            "comments": [],
            "revisions": [],
            "current_revision": 0,
            "workspace_id": "w-123",
            "theme": {"accent": "#ff00ff"}
        }"##;
        let path = temp_path("unknown-fields.mkb");
        std::fs::write(&path, json).unwrap();
        let result = load_project(&path);
        std::fs::remove_file(&path).ok();
        let (store, history) = result.unwrap();
        assert!(store.is_empty());
        assert!(history.is_empty());
    }

    #[test]
    fn test_load_defaults_missing_sections() {
        // A minimal record from a hypothetical older writer.
        let json = r#"{"version": 1}"#;
        let path = temp_path("minimal.mkb");
        std::fs::write(&path, json).unwrap();
        let result = load_project(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_clamps_out_of_range_coordinates() {
        let (mut store, history) = sample_state();
        // Bypass the store API to simulate a corrupted file.
        store.annotations[0].x = 250.0;
        let path = temp_path("clamp.mkb");
        save_project(&store, &history, &path).unwrap();
        let (loaded, _) = load_project(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.annotations[0].x, 100.0);
    }

    #[test]
    fn test_newer_version_rejected() {
        let json = r#"{"version": 99}"#;
        let path = temp_path("future.mkb");
        std::fs::write(&path, json).unwrap();
        let result = load_project(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(MkbError::InvalidFormat(_))));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ExportFormat::from_extension(Path::new("a.jpg")), ExportFormat::Jpeg);
        assert_eq!(ExportFormat::from_extension(Path::new("a.JPEG")), ExportFormat::Jpeg);
        assert_eq!(ExportFormat::from_extension(Path::new("a.png")), ExportFormat::Png);
        assert_eq!(ExportFormat::from_extension(Path::new("a")), ExportFormat::Png);
    }

    #[test]
    fn test_write_export_png_and_jpeg() {
        let img = RgbaImage::from_pixel(8, 8, image::Rgba([90, 30, 200, 255]));

        let png_path = temp_path("export.png");
        write_export(&img, &png_path, ExportFormat::Png, 90).unwrap();
        let decoded = image::open(&png_path).unwrap().to_rgba8();
        std::fs::remove_file(&png_path).ok();
        assert_eq!(decoded.get_pixel(4, 4).0, [90, 30, 200, 255]);

        let jpg_path = temp_path("export.jpg");
        write_export(&img, &jpg_path, ExportFormat::Jpeg, 90).unwrap();
        let decoded = image::open(&jpg_path).unwrap().to_rgb8();
        std::fs::remove_file(&jpg_path).ok();
        // Lossy, but nowhere near grey.
        assert!(decoded.get_pixel(4, 4).0[2] > 120);
    }
}
