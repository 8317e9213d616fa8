//! Markboard application shell.
//!
//! Owns the project document and wires the engine pieces together: pointer
//! events on the canvas feed the drag session or the placement tools, the
//! side panels mutate the overlay store, the history strip drives the
//! navigator, and every committed change schedules a persistence pass once
//! the state settles. The engine itself never persists anything.

use eframe::egui;
use egui::{Align2, Color32, ColorImage, FontId, Pos2, Rect, Sense, Stroke, TextureHandle, TextureId, TextureOptions, Vec2};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::components::{CommentsPanel, HistoryPanel, OverlayPanel};
use crate::compositor;
use crate::coords::{self, REFERENCE_WIDTH, SurfaceRect};
use crate::drag::DragState;
use crate::history::{GenerationParams, ImageRef, RevisionEntry};
use crate::io::{self, ExportFormat};
use crate::overlay::{Annotation, Comment};
use crate::project::Project;
use crate::{log_err, log_info};

/// Quiet period after the last committed change before the project file is
/// rewritten. Keeps high-frequency edits from hammering the disk.
const SAVE_SETTLE: Duration = Duration::from_millis(750);

/// Comment pin radius on screen, px.
const PIN_RADIUS: f32 = 9.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Tool {
    /// Select and drag annotations.
    Move,
    /// Place a text annotation at the clicked point.
    Text,
    /// Place a comment pin at the clicked point.
    Pin,
}

impl Tool {
    fn is_placement(&self) -> bool {
        matches!(self, Tool::Text | Tool::Pin)
    }
}

/// Decoded + uploaded base image for the revision being viewed.
struct BaseTexture {
    revision_id: Uuid,
    texture: TextureHandle,
    width: u32,
    height: u32,
}

pub struct MarkboardApp {
    project: Project,
    tool: Tool,
    drag: DragState,
    selected_annotation: Option<Uuid>,
    highlighted_comment: Option<Uuid>,

    overlay_panel: OverlayPanel,
    comments_panel: CommentsPanel,
    history_panel: HistoryPanel,

    base_texture: Option<BaseTexture>,
    /// Decode failure for the active revision, shown in place of the image.
    base_error: Option<String>,
    /// History-strip thumbnails keyed by revision id. `None` marks a failed
    /// load so it is not retried every frame.
    thumbnails: HashMap<Uuid, Option<TextureHandle>>,

    /// Display name stamped onto new comments.
    author: String,
    /// Prompt recorded with the next added revision.
    prompt_input: String,

    status: String,
    /// When set, persist once the deadline passes (changes have settled).
    save_deadline: Option<Instant>,
}

impl MarkboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let author = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "reviewer".to_string());
        Self {
            project: Project::new_untitled(),
            tool: Tool::Move,
            drag: DragState::Idle,
            selected_annotation: None,
            highlighted_comment: None,
            overlay_panel: OverlayPanel::default(),
            comments_panel: CommentsPanel::default(),
            history_panel: HistoryPanel::default(),
            base_texture: None,
            base_error: None,
            thumbnails: HashMap::new(),
            author,
            prompt_input: String::new(),
            status: String::new(),
            save_deadline: None,
        }
    }

    /// Note a committed change: mark dirty and (re)arm the settle timer.
    fn change_committed(&mut self) {
        self.project.mark_dirty();
        self.save_deadline = Some(Instant::now() + SAVE_SETTLE);
    }

    /// Persist now if the project has a path. Untitled projects stay dirty
    /// until Save As gives them one.
    fn persist(&mut self) {
        let Some(path) = self.project.path.clone() else { return };
        match io::save_project(&self.project.store, &self.project.history, &path) {
            Ok(()) => {
                self.project.mark_clean();
                log_info!("saved project to {}", path.display());
            }
            Err(e) => {
                self.status = format!("Save failed: {}", e);
                log_err!("save {}: {}", path.display(), e);
            }
        }
    }

    fn maybe_persist_settled(&mut self, ctx: &egui::Context) {
        if let Some(deadline) = self.save_deadline {
            let now = Instant::now();
            if now >= deadline {
                self.save_deadline = None;
                self.persist();
            } else {
                // Wake up again when the settle window closes.
                ctx.request_repaint_after(deadline - now);
            }
        }
    }

    // ---- file menu actions -------------------------------------------

    fn open_project(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Markboard Project", &["mkb"])
            .pick_file()
        else {
            return;
        };
        match io::load_project(&path) {
            Ok((store, history)) => {
                self.project = Project::from_file(path, store, history);
                self.selected_annotation = None;
                self.highlighted_comment = None;
                self.drag.cancel();
                self.base_texture = None;
                self.base_error = None;
                self.thumbnails.clear();
                self.status = format!("Opened {}", self.project.name);
            }
            Err(e) => {
                self.status = format!("Open failed: {}", e);
                log_err!("open {}: {}", path.display(), e);
            }
        }
    }

    fn save_project_as(&mut self) {
        let Some(mut path) = rfd::FileDialog::new()
            .add_filter("Markboard Project", &["mkb"])
            .set_file_name(&format!("{}.mkb", self.project.name))
            .save_file()
        else {
            return;
        };
        if path.extension().is_none() {
            path.set_extension("mkb");
        }
        self.project.path = Some(path);
        self.project.update_name_from_path();
        self.persist();
    }

    fn save_project(&mut self) {
        if self.project.path.is_some() {
            self.persist();
        } else {
            self.save_project_as();
        }
    }

    /// Accept a new generated image as the newest revision. Stands in for
    /// the generation pipeline, which is outside this component.
    fn add_revision(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Images", &["png", "jpg", "jpeg", "webp", "bmp"])
            .pick_file()
        else {
            return;
        };
        let prompt = if self.prompt_input.trim().is_empty() {
            path.file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default()
        } else {
            self.prompt_input.trim().to_string()
        };
        let entry = RevisionEntry::new(
            ImageRef(path.to_string_lossy().to_string()),
            prompt,
            GenerationParams::default(),
        );
        // New base image identity: push_generation clears the overlay set.
        self.project.push_generation(entry);
        self.selected_annotation = None;
        self.highlighted_comment = None;
        self.drag.cancel();
        self.base_error = None;
        self.change_committed();
        self.status = "Added revision".to_string();
    }

    fn export_composite(&mut self) {
        let active = match self.project.history.active() {
            Ok(entry) => entry.clone(),
            Err(e) => {
                self.status = format!("Export failed: {}", e);
                return;
            }
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG", &["png"])
            .add_filter("JPEG", &["jpg", "jpeg"])
            .set_file_name(&format!("{}.png", self.project.name))
            .save_file()
        else {
            return;
        };
        let format = ExportFormat::from_extension(&path);
        let background = match format {
            ExportFormat::Jpeg => Some([255, 255, 255, 255]),
            ExportFormat::Png => None,
        };
        // Comments are review metadata; only annotations are flattened.
        match compositor::compose_revision(&active.image, &self.project.store.annotations, background)
        {
            Ok(img) => match io::write_export(&img, &path, format, 90) {
                Ok(()) => {
                    self.status = format!("Exported {}", path.display());
                    log_info!("exported composite to {}", path.display());
                }
                Err(e) => {
                    self.status = format!("Export failed: {}", e);
                    log_err!("export write {}: {}", path.display(), e);
                }
            },
            // Non-fatal: prior state stays untouched, no partial output.
            Err(e) => {
                self.status = format!("Export failed: {}", e);
                log_err!("export compose: {}", e);
            }
        }
    }

    /// Thumbnail for one revision, loading and uploading it on first use.
    /// Returns the texture id plus a display size with a fixed height.
    fn ensure_thumbnail(
        &mut self,
        ctx: &egui::Context,
        entry: &RevisionEntry,
    ) -> Option<(TextureId, Vec2)> {
        if !self.thumbnails.contains_key(&entry.id) {
            let texture = compositor::load_base_image(&entry.image).ok().map(|img| {
                let thumb = compositor::thumbnail(&img);
                let (w, h) = thumb.dimensions();
                let color = ColorImage::from_rgba_unmultiplied(
                    [w as usize, h as usize],
                    thumb.as_raw(),
                );
                ctx.load_texture(format!("thumb_{}", entry.id), color, TextureOptions::LINEAR)
            });
            self.thumbnails.insert(entry.id, texture);
        }
        self.thumbnails
            .get(&entry.id)
            .and_then(|t| t.as_ref())
            .map(|t| {
                let size = t.size_vec2();
                let height = 44.0;
                (t.id(), Vec2::new(size.x / size.y.max(1.0) * height, height))
            })
    }

    // ---- canvas ------------------------------------------------------

    /// Make sure the texture matches the revision being viewed.
    fn ensure_base_texture(&mut self, ctx: &egui::Context) {
        let Ok(active) = self.project.history.active() else {
            self.base_texture = None;
            self.base_error = None;
            return;
        };
        if self
            .base_texture
            .as_ref()
            .is_some_and(|t| t.revision_id == active.id)
        {
            return;
        }
        if self.base_error.is_some()
            && self.base_texture.is_none()
        {
            // Already failed for this revision; don't retry every frame.
            return;
        }
        match compositor::load_base_image(&active.image) {
            Ok(img) => {
                let (w, h) = img.dimensions();
                let color = ColorImage::from_rgba_unmultiplied(
                    [w as usize, h as usize],
                    img.as_raw(),
                );
                let texture =
                    ctx.load_texture("base_image", color, TextureOptions::LINEAR);
                self.base_texture = Some(BaseTexture {
                    revision_id: active.id,
                    texture,
                    width: w,
                    height: h,
                });
                self.base_error = None;
            }
            Err(e) => {
                self.base_texture = None;
                self.base_error = Some(e.to_string());
                log_err!("load base image: {}", e);
            }
        }
    }

    /// Fit the base image into the canvas area, centered, preserving aspect.
    fn display_rect(&self, canvas: Rect) -> Option<Rect> {
        let base = self.base_texture.as_ref()?;
        let avail = canvas.shrink(12.0);
        let scale = (avail.width() / base.width as f32)
            .min(avail.height() / base.height as f32)
            .min(4.0);
        let size = Vec2::new(base.width as f32, base.height as f32) * scale;
        Some(Rect::from_center_size(avail.center(), size))
    }

    /// On-screen rectangle an annotation occupies (for hit testing and the
    /// selection outline).
    fn annotation_screen_rect(
        &self,
        ui: &egui::Ui,
        a: &Annotation,
        display: Rect,
    ) -> Rect {
        let (x, y) = self.drag.live_override(a.id).unwrap_or((a.x, a.y));
        let (px, py) = coords::to_pixels(x, y, display.width(), display.height());
        let center = display.min + Vec2::new(px, py);
        let size = (a.font_size * display.width() / REFERENCE_WIDTH).max(1.0);
        let galley = ui.fonts(|f| {
            f.layout_no_wrap(a.text.clone(), FontId::proportional(size), Color32::WHITE)
        });
        let box_size = galley.size().max(Vec2::splat(14.0));
        Rect::from_center_size(center, box_size)
    }

    fn comment_screen_pos(&self, c: &Comment, display: Rect) -> Pos2 {
        let (px, py) = coords::to_pixels(c.x, c.y, display.width(), display.height());
        display.min + Vec2::new(px, py)
    }

    fn show_canvas(&mut self, ui: &mut egui::Ui) {
        let available = ui.available_size();
        let (response, painter) =
            ui.allocate_painter(available, Sense::click_and_drag());
        painter.rect_filled(response.rect, 0.0, Color32::from_gray(24));

        self.ensure_base_texture(ui.ctx());

        if self.project.history.is_empty() {
            painter.text(
                response.rect.center(),
                Align2::CENTER_CENTER,
                "Add a generated image to start marking it up",
                FontId::proportional(16.0),
                Color32::from_gray(140),
            );
            return;
        }
        if let Some(err) = &self.base_error {
            painter.text(
                response.rect.center(),
                Align2::CENTER_CENTER,
                format!("Could not load base image:\n{}", err),
                FontId::proportional(14.0),
                Color32::from_rgb(230, 140, 130),
            );
            return;
        }
        let Some(display) = self.display_rect(response.rect) else {
            return;
        };

        // ---- input --------------------------------------------------

        let pointer = response.interact_pointer_pos();

        // Gesture start: only the Move tool and only while no session is
        // active. egui keeps routing drag events to this widget after the
        // pointer leaves it, which is the pointer-capture behavior the
        // session relies on.
        if response.drag_started() && !self.tool.is_placement() && !self.drag.is_active() {
            if let Some(pos) = pointer {
                let hit = self
                    .project
                    .store
                    .annotations
                    .iter()
                    .rev()
                    .find(|a| self.annotation_screen_rect(ui, a, display).contains(pos))
                    .map(|a| (a.id, (a.x, a.y)));
                if let Some((id, start)) = hit {
                    self.selected_annotation = Some(id);
                    self.drag.begin(
                        id,
                        start,
                        (pos.x, pos.y),
                        SurfaceRect::from_egui(display),
                    );
                }
            }
        }

        if self.drag.is_active() {
            if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                self.drag.cancel();
            } else if response.dragged() {
                if let Some(pos) = pointer {
                    self.drag.pointer_moved((pos.x, pos.y));
                }
            }
            if response.drag_released() {
                // Exactly one store mutation per gesture.
                if self.drag.commit(&mut self.project.store) {
                    self.change_committed();
                }
            }
        }

        let click_pos = if response.clicked() {
            pointer.filter(|p| display.contains(*p))
        } else {
            None
        };
        if let Some(pos) = click_pos {
            let (x, y) = coords::to_percent(pos.x, pos.y, &SurfaceRect::from_egui(display));
            match self.tool {
                Tool::Text => {
                    let id = self
                        .project
                        .store
                        .add_annotation(Annotation::new(x, y, "New annotation"));
                    self.selected_annotation = Some(id);
                    self.change_committed();
                }
                Tool::Pin => {
                    let id = self
                        .project
                        .store
                        .add_comment(Comment::new(x, y, "", self.author.clone()));
                    self.highlighted_comment = Some(id);
                    self.change_committed();
                }
                Tool::Move => {
                    // Selection follows topmost hit; empty space clears it.
                    let hit_pin = self
                        .project
                        .store
                        .comments
                        .iter()
                        .rev()
                        .find(|c| {
                            self.comment_screen_pos(c, display).distance(pos) <= PIN_RADIUS + 2.0
                        })
                        .map(|c| c.id);
                    if let Some(id) = hit_pin {
                        self.highlighted_comment = Some(id);
                    } else {
                        let hit = self
                            .project
                            .store
                            .annotations
                            .iter()
                            .rev()
                            .find(|a| self.annotation_screen_rect(ui, a, display).contains(pos))
                            .map(|a| a.id);
                        self.selected_annotation = hit;
                        if hit.is_none() {
                            self.highlighted_comment = None;
                        }
                    }
                }
            }
        }

        // ---- drawing ------------------------------------------------

        if let Some(base) = &self.base_texture {
            painter.image(
                base.texture.id(),
                display,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        // Annotations in store order: later entries on top. While a drag is
        // active the session's live position is the only value consulted
        // for the target.
        let scale = display.width() / REFERENCE_WIDTH;
        for a in &self.project.store.annotations {
            let (x, y) = self.drag.live_override(a.id).unwrap_or((a.x, a.y));
            let (px, py) = coords::to_pixels(x, y, display.width(), display.height());
            let center = display.min + Vec2::new(px, py);
            let color =
                Color32::from_rgba_unmultiplied(a.color[0], a.color[1], a.color[2], a.color[3]);
            let size = (a.font_size * scale).max(1.0);

            if a.text.trim().is_empty() {
                // Placeholder marker so an empty label stays selectable.
                painter.circle_filled(center, 4.0, color);
            } else {
                painter.text(
                    center,
                    Align2::CENTER_CENTER,
                    a.text.clone(),
                    FontId::proportional(size),
                    color,
                );
            }

            if self.selected_annotation == Some(a.id) {
                let rect = self.annotation_screen_rect(ui, a, display).expand(4.0);
                painter.rect_stroke(rect, 3.0, Stroke::new(1.5, Color32::from_rgb(66, 133, 244)));
            }
        }

        // Comment pins render above every annotation, independent of
        // stacking order.
        for c in &self.project.store.comments {
            let pos = self.comment_screen_pos(c, display);
            let fill = if c.resolved {
                Color32::from_gray(110)
            } else {
                Color32::from_rgb(240, 160, 40)
            };
            painter.circle_filled(pos, PIN_RADIUS, fill);
            painter.circle_stroke(pos, PIN_RADIUS, Stroke::new(1.5, Color32::WHITE));
            if self.highlighted_comment == Some(c.id) {
                painter.circle_stroke(
                    pos,
                    PIN_RADIUS + 3.0,
                    Stroke::new(2.0, Color32::from_rgb(66, 133, 244)),
                );
            }
            let initial = c.author.chars().next().unwrap_or('?').to_uppercase().to_string();
            painter.text(
                pos,
                Align2::CENTER_CENTER,
                initial,
                FontId::proportional(11.0),
                Color32::BLACK,
            );
        }
    }

    fn show_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Open…").clicked() {
                self.open_project();
            }
            if ui.button("Save").clicked() {
                self.save_project();
            }
            if ui.button("Save As…").clicked() {
                self.save_project_as();
            }
            if ui.button("Export…").clicked() {
                self.export_composite();
            }

            ui.separator();

            for (tool, label, tip) in [
                (Tool::Move, "✋ Move", "Select and drag annotations"),
                (Tool::Text, "🇹 Text", "Place a text annotation"),
                (Tool::Pin, "📌 Pin", "Place a comment pin"),
            ] {
                let resp = ui
                    .selectable_label(self.tool == tool, label)
                    .on_hover_text(tip);
                if resp.clicked() && self.tool != tool {
                    // Placement tools and an in-flight drag are mutually
                    // exclusive.
                    self.drag.cancel();
                    self.tool = tool;
                }
            }

            ui.separator();

            ui.add(
                egui::TextEdit::singleline(&mut self.prompt_input)
                    .hint_text("Prompt for next revision…")
                    .desired_width(220.0),
            );
            if ui.button("➕ Revision…").clicked() {
                self.add_revision();
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(egui::RichText::new(self.project.display_title()).strong());
                if !self.status.is_empty() {
                    ui.separator();
                    ui.label(egui::RichText::new(&self.status).weak());
                }
            });
        });
    }
}

impl eframe::App for MarkboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.maybe_persist_settled(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.add_space(2.0);
            self.show_toolbar(ui);
            ui.add_space(2.0);
        });

        let thumbs: Vec<Option<(TextureId, Vec2)>> = {
            let entries = self.project.history.entries().to_vec();
            entries
                .iter()
                .map(|e| self.ensure_thumbnail(ctx, e))
                .collect()
        };

        egui::TopBottomPanel::bottom("history_strip").show(ctx, |ui| {
            ui.add_space(2.0);
            if self.history_panel.show(ui, &mut self.project.history, &thumbs) {
                // Navigation is a commit point for the persistence
                // collaborator; overlays are deliberately kept.
                self.drag.cancel();
                self.base_error = None;
                self.change_committed();
            }
            ui.add_space(2.0);
        });

        egui::SidePanel::right("review_panel")
            .default_width(260.0)
            .show(ctx, |ui| {
                ui.add_space(4.0);
                let mut changed = false;
                changed |= self
                    .overlay_panel
                    .show(ui, &mut self.project.store, &mut self.selected_annotation);
                ui.separator();
                changed |= self.comments_panel.show(
                    ui,
                    &mut self.project.store,
                    &mut self.highlighted_comment,
                );
                if changed {
                    self.change_committed();
                }
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                self.show_canvas(ui);
            });
    }
}
