//! History strip — revision navigation along the bottom of the window.
//!
//! "Older" and "Newer" deliberately mirror the navigator's method names:
//! entries are newest-first, so stepping to an older revision *increases*
//! the index. The buttons disable themselves at the ends, where stepping
//! would be a no-op.

use eframe::egui;

use crate::history::HistoryNavigator;

#[derive(Default)]
pub struct HistoryPanel {}

impl HistoryPanel {
    /// Render the strip. `thumbs` is one entry per revision (same order as
    /// the navigator): an uploaded thumbnail texture with its display size,
    /// or `None` if the base image could not be loaded. Returns `true` when
    /// the cursor moved (the shell re-resolves the base image and schedules
    /// persistence).
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        history: &mut HistoryNavigator,
        thumbs: &[Option<(egui::TextureId, egui::Vec2)>],
    ) -> bool {
        let mut navigated = false;

        ui.horizontal(|ui| {
            if history.is_empty() {
                ui.label(egui::RichText::new("No revisions yet — add a generated image.").weak());
                return;
            }

            let older = ui.add_enabled(!history.at_oldest(), egui::Button::new("◀ Older"));
            if older.clicked() {
                navigated |= history.go_older();
            }
            let newer = ui.add_enabled(!history.at_newest(), egui::Button::new("Newer ▶"));
            if newer.clicked() {
                navigated |= history.go_newer();
            }

            ui.separator();
            ui.label(format!(
                "Revision {} of {}",
                history.current_index() + 1,
                history.len()
            ));

            ui.separator();

            // One chip per revision, newest on the left (index order).
            egui::ScrollArea::horizontal()
                .id_source("revision_strip")
                .show(ui, |ui| {
                    let current = history.current_index();
                    let chips: Vec<(usize, String, String)> = history
                        .entries()
                        .iter()
                        .enumerate()
                        .map(|(i, e)| {
                            let label = if i == 0 {
                                "latest".to_string()
                            } else {
                                format!("-{}", i)
                            };
                            let tip = format!(
                                "{}\n{} · {}",
                                truncate(&e.prompt, 120),
                                e.created_at.format("%b %e %H:%M"),
                                if e.params.style.is_empty() {
                                    "default style".to_string()
                                } else {
                                    e.params.style.clone()
                                }
                            );
                            (i, label, tip)
                        })
                        .collect();

                    for (i, label, tip) in chips {
                        ui.vertical(|ui| {
                            if let Some((tid, size)) = thumbs.get(i).copied().flatten() {
                                let img = ui.image((tid, size)).interact(egui::Sense::click());
                                if img.clicked() && i != current {
                                    navigated |= history.jump_to(i).is_ok();
                                }
                            }
                            let resp = ui
                                .selectable_label(i == current, label)
                                .on_hover_text(tip);
                            if resp.clicked() && i != current {
                                // In range by construction; jump_to can't fail here.
                                navigated |= history.jump_to(i).is_ok();
                            }
                        });
                    }
                });
        });

        navigated
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{}…", cut)
    }
}
