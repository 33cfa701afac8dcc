use compound_explorer::fetch::{Asset, VideoClip};
use eframe::egui::{self, Color32, RichText, Ui};

use crate::gallery::{Gallery, Slot};

// ---------------------------------------------------------------------------
// Asset grid
// ---------------------------------------------------------------------------

/// Render the current gallery page as a grid of `columns` cells, with pager
/// controls above it.  Each cell shows its own outcome: a spinner, the
/// decoded asset, or the failure next to its URL.
pub fn asset_grid(ui: &mut Ui, id: &str, gallery: &mut Gallery, columns: usize) {
    gallery.ensure_started(ui.ctx());

    if gallery.items().is_empty() {
        ui.weak("Nothing matches the current filter.");
        return;
    }

    pager(ui, gallery);
    ui.add_space(4.0);

    let columns = columns.max(1);
    let cell_width = (ui.available_width() / columns as f32 - 8.0).max(64.0);
    let ctx = ui.ctx().clone();

    egui::Grid::new(id)
        .num_columns(columns)
        .spacing([8.0, 8.0])
        .show(ui, |ui: &mut Ui| {
            for (n, (item, slot)) in gallery.page_entries().enumerate() {
                ui.vertical(|ui: &mut Ui| {
                    ui.set_width(cell_width);
                    if let Some(tex) = slot.image_texture(&ctx) {
                        ui.add(
                            egui::Image::from_texture(egui::load::SizedTexture::from_handle(tex))
                                .max_width(cell_width)
                                .shrink_to_fit(),
                        )
                        .on_hover_text(&item.url);
                    } else {
                        match slot {
                            Slot::Pending => {
                                ui.spinner();
                            }
                            Slot::Ready { asset, .. } => {
                                if let Asset::Video(clip) = asset {
                                    ui.label(video_summary(clip));
                                }
                                ui.hyperlink_to("Open video", asset.url());
                            }
                            Slot::Failed(failure) => {
                                ui.label(
                                    RichText::new(format!("Error loading asset: {}", failure.cause))
                                        .color(Color32::RED),
                                );
                                ui.hyperlink_to(
                                    RichText::new(&failure.url).small(),
                                    &failure.url,
                                );
                            }
                        }
                    }
                    ui.label(RichText::new(&item.caption).small());
                });
                if (n + 1) % columns == 0 {
                    ui.end_row();
                }
            }
        });
}

fn pager(ui: &mut Ui, gallery: &mut Gallery) {
    let pages = gallery.page_count();
    let page = gallery.page();
    ui.horizontal(|ui: &mut Ui| {
        if ui.add_enabled(page > 0, egui::Button::new("◀ Previous")).clicked() {
            gallery.set_page(page - 1);
        }
        ui.label(format!("Page {} of {pages}", page + 1));
        if ui
            .add_enabled(page + 1 < pages, egui::Button::new("Next ▶"))
            .clicked()
        {
            gallery.set_page(page + 1);
        }

        ui.separator();
        ui.label(format!("{} items", gallery.items().len()));
        let pending = gallery.pending();
        if pending > 0 {
            ui.spinner();
            ui.label(format!("loading {pending}"));
        }
        let failed = gallery.failed();
        if failed > 0 {
            ui.label(RichText::new(format!("{failed} failed")).color(Color32::RED));
        }
    });
}

fn video_summary(clip: &VideoClip) -> String {
    match clip.size {
        Some(size) => format!("{} video, {:.1} MB", clip.container, size as f64 / 1_048_576.0),
        None => format!("{} video", clip.container),
    }
}
