//! Annotations side panel — stacking order list plus the property editor
//! for the selected annotation.
//!
//! The list is shown topmost-first (display order inverted from store
//! order, same as any layers panel). Restack buttons map 1:1 onto the
//! store's four reorder operations; nothing here touches the annotation
//! vector directly.

use eframe::egui;
use egui::Color32;
use uuid::Uuid;

use crate::overlay::{AnnotationPatch, FontStyle, FontWeight, OverlayStore};

#[derive(Default)]
pub struct OverlayPanel {}

impl OverlayPanel {
    /// Render the panel. Returns `true` when the store was mutated (the
    /// shell uses that to schedule a persistence pass).
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        store: &mut OverlayStore,
        selected: &mut Option<Uuid>,
    ) -> bool {
        let mut changed = false;

        ui.label(
            egui::RichText::new(format!("Annotations ({})", store.annotations.len())).strong(),
        );
        ui.add_space(2.0);

        if store.annotations.is_empty() {
            ui.label(egui::RichText::new("No annotations yet — use the Text tool.").weak());
            return false;
        }

        // Topmost first.
        let ids: Vec<Uuid> = store.annotations.iter().rev().map(|a| a.id).collect();

        egui::ScrollArea::vertical()
            .id_source("annotation_list")
            .max_height(160.0)
            .show(ui, |ui| {
                for id in &ids {
                    let Some(a) = store.annotation(*id) else { continue };
                    let label = if a.text.trim().is_empty() {
                        "(empty)".to_string()
                    } else {
                        a.text.replace('\n', " ")
                    };
                    let is_selected = *selected == Some(*id);
                    if ui.selectable_label(is_selected, label).clicked() {
                        *selected = if is_selected { None } else { Some(*id) };
                    }
                }
            });

        let Some(id) = *selected else { return false };
        if store.annotation(id).is_none() {
            *selected = None;
            return false;
        }

        ui.separator();

        // Restack controls.
        ui.horizontal(|ui| {
            ui.label("Order:");
            if ui.button("⏫").on_hover_text("Bring to front").clicked() {
                changed |= store.bring_to_front(id);
            }
            if ui.button("⬆").on_hover_text("Move forward").clicked() {
                changed |= store.move_forward(id);
            }
            if ui.button("⬇").on_hover_text("Move backward").clicked() {
                changed |= store.move_backward(id);
            }
            if ui.button("⏬").on_hover_text("Send to back").clicked() {
                changed |= store.send_to_back(id);
            }
        });

        ui.add_space(4.0);

        // Property editor works on a copy; edits flow back as a patch so
        // the store stays the only mutation path.
        let a = store.annotation(id).expect("selected annotation exists").clone();

        let mut text = a.text.clone();
        let text_resp = ui.add(
            egui::TextEdit::multiline(&mut text)
                .hint_text("Annotation text…")
                .desired_rows(2)
                .desired_width(ui.available_width()),
        );
        if text_resp.changed() {
            changed |= store.update_annotation(
                id,
                AnnotationPatch { text: Some(text), ..Default::default() },
            );
        }

        ui.horizontal(|ui| {
            ui.label("Color:");
            let mut color =
                Color32::from_rgba_unmultiplied(a.color[0], a.color[1], a.color[2], a.color[3]);
            if ui.color_edit_button_srgba(&mut color).changed() {
                changed |= store.update_annotation(
                    id,
                    AnnotationPatch {
                        color: Some([color.r(), color.g(), color.b(), color.a()]),
                        ..Default::default()
                    },
                );
            }

            ui.label("Size:");
            let mut size = a.font_size;
            if ui
                .add(egui::DragValue::new(&mut size).clamp_range(4.0..=300.0).speed(1.0))
                .changed()
            {
                changed |= store.update_annotation(
                    id,
                    AnnotationPatch { font_size: Some(size), ..Default::default() },
                );
            }
        });

        ui.horizontal(|ui| {
            let mut bold = a.font_weight == FontWeight::Bold;
            if ui.checkbox(&mut bold, "Bold").changed() {
                let weight = if bold { FontWeight::Bold } else { FontWeight::Normal };
                changed |= store.update_annotation(
                    id,
                    AnnotationPatch { font_weight: Some(weight), ..Default::default() },
                );
            }
            let mut italic = a.font_style == FontStyle::Italic;
            if ui.checkbox(&mut italic, "Italic").changed() {
                let style = if italic { FontStyle::Italic } else { FontStyle::Normal };
                changed |= store.update_annotation(
                    id,
                    AnnotationPatch { font_style: Some(style), ..Default::default() },
                );
            }

            if ui.button("🗑 Delete").clicked() {
                changed |= store.remove_annotation(id);
                *selected = None;
            }
        });

        changed
    }
}
