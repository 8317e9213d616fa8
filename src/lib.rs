//! Markboard — review and annotate generated images.
//!
//! The engine is split into small, GUI-free modules so the CLI exporter and
//! the tests drive the exact same code the app shell does:
//!
//! - [`coords`] — resolution-independent percentage coordinates
//! - [`overlay`] — annotations, comment pins, and the z-ordered store
//! - [`drag`] — one-gesture drag sessions with grid snapping
//! - [`history`] — newest-first revision list and viewing cursor
//! - [`text`] / [`compositor`] — export-quality text rasterization and
//!   flattening
//! - [`io`] — `.mkb` project files and raster export
//! - [`project`] — the document tying store + history together
//!
//! [`app`] is the eframe shell; [`cli`] is the headless exporter.

pub mod app;
pub mod cli;
pub mod components;
pub mod compositor;
pub mod coords;
pub mod drag;
pub mod history;
pub mod io;
pub mod logger;
pub mod overlay;
pub mod project;
pub mod text;

pub use app::MarkboardApp;
