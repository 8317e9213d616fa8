//! Comments review panel — threaded pins listed newest first, with
//! resolve/edit/delete. Comments never participate in z-order or export;
//! this panel and the pin markers on the canvas are their whole surface.

use eframe::egui;
use uuid::Uuid;

use crate::overlay::{CommentPatch, OverlayStore};

pub struct CommentsPanel {
    /// Comment whose body is being edited inline, with the edit buffer.
    editing: Option<(Uuid, String)>,
    pub show_resolved: bool,
}

impl Default for CommentsPanel {
    fn default() -> Self {
        Self { editing: None, show_resolved: true }
    }
}

impl CommentsPanel {
    /// Render the panel. Returns `true` when the store was mutated.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        store: &mut OverlayStore,
        highlighted: &mut Option<Uuid>,
    ) -> bool {
        let mut changed = false;

        let open_count = store.comments.iter().filter(|c| !c.resolved).count();
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new(format!(
                    "Comments ({} open / {})",
                    open_count,
                    store.comments.len()
                ))
                .strong(),
            );
            ui.checkbox(&mut self.show_resolved, "Show resolved");
        });
        ui.add_space(2.0);

        if store.comments.is_empty() {
            ui.label(egui::RichText::new("No comments — use the Pin tool.").weak());
            return false;
        }

        let ids: Vec<Uuid> = store
            .comments_newest_first()
            .iter()
            .filter(|c| self.show_resolved || !c.resolved)
            .map(|c| c.id)
            .collect();

        let mut toggle: Option<Uuid> = None;
        let mut delete: Option<Uuid> = None;
        let mut commit_edit: Option<(Uuid, String)> = None;

        egui::ScrollArea::vertical()
            .id_source("comment_list")
            .show(ui, |ui| {
                for id in &ids {
                    let Some(c) = store.comment(*id) else { continue };

                    let frame = egui::Frame::group(ui.style());
                    frame.show(ui, |ui| {
                        ui.horizontal(|ui| {
                            let header = format!(
                                "{} · {}",
                                c.author,
                                c.created_at.format("%b %e %H:%M")
                            );
                            let resp = ui.label(egui::RichText::new(header).small().weak());
                            if resp.clicked() {
                                *highlighted = Some(*id);
                            }
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    if ui.small_button("🗑").clicked() {
                                        delete = Some(*id);
                                    }
                                    let mark = if c.resolved { "↺" } else { "✔" };
                                    let tip = if c.resolved { "Reopen" } else { "Resolve" };
                                    if ui.small_button(mark).on_hover_text(tip).clicked() {
                                        toggle = Some(*id);
                                    }
                                },
                            );
                        });

                        match &mut self.editing {
                            Some((editing_id, buffer)) if *editing_id == *id => {
                                let resp = ui.add(
                                    egui::TextEdit::multiline(buffer)
                                        .desired_rows(2)
                                        .desired_width(ui.available_width()),
                                );
                                if resp.lost_focus() {
                                    commit_edit = Some((*id, buffer.clone()));
                                }
                            }
                            _ => {
                                let body = if c.resolved {
                                    egui::RichText::new(&c.text).weak().strikethrough()
                                } else {
                                    egui::RichText::new(&c.text)
                                };
                                let resp = ui.label(body);
                                if resp.double_clicked() {
                                    self.editing = Some((*id, c.text.clone()));
                                }
                                if resp.clicked() {
                                    *highlighted = Some(*id);
                                }
                            }
                        }
                    });
                    ui.add_space(2.0);
                }
            });

        if let Some(id) = toggle {
            changed |= store.toggle_resolved(id);
        }
        if let Some(id) = delete {
            changed |= store.remove_comment(id);
            if *highlighted == Some(id) {
                *highlighted = None;
            }
            if self.editing.as_ref().is_some_and(|(eid, _)| *eid == id) {
                self.editing = None;
            }
        }
        if let Some((id, text)) = commit_edit {
            changed |= store.update_comment(
                id,
                CommentPatch { text: Some(text), ..Default::default() },
            );
            self.editing = None;
        }

        changed
    }
}
