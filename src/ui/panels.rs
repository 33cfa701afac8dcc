use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::state::{AppState, Page};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the filter panel for the current page.  Returns without drawing
/// anything for the text-only pages.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match state.page {
            Page::Classification => classification_filters(ui, state),
            Page::ImageInsights => insights_filters(ui, state),
            Page::VideoInsights => video_filters(ui, state),
            Page::About | Page::Disclaimer => {}
        });
}

fn classification_filters(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Image Filter");
    ui.label("Select a category and a threshold to filter images");
    ui.separator();

    let view = &mut state.classification;
    let mut changed = false;

    ui.strong("Select category");
    egui::ComboBox::from_id_salt("category")
        .selected_text(&view.category)
        .width(ui.available_width())
        .show_ui(ui, |ui: &mut Ui| {
            for category in &view.categories {
                if ui
                    .selectable_label(view.category == *category, category)
                    .clicked()
                    && view.category != *category
                {
                    view.category = category.clone();
                    changed = true;
                }
            }
        });

    ui.add_space(6.0);
    ui.strong("Select threshold");
    changed |= ui
        .add(egui::Slider::new(&mut view.threshold, 0.0..=1.0).step_by(0.01))
        .changed();

    ui.separator();
    ui.label(format!("{} matching images", view.rows.len()));

    if changed {
        state.refilter_classification();
    }
}

fn insights_filters(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Data Filter");
    ui.label("Select a date range to filter images");
    ui.separator();

    let mut changed = date_range(ui, "insights", &mut state.insights.start, &mut state.insights.end);
    if let Some((lo, hi)) = state.insights.bounds {
        ui.weak(format!("Dated images span {lo} to {hi}"));
    }

    ui.add_space(6.0);
    changed |= ui
        .checkbox(
            &mut state.insights.show_camera_info,
            "Display camera, date and time information (if available)",
        )
        .changed();

    if changed {
        state.refilter_insights();
    }

    if state.insights.show_camera_info {
        ui.separator();
        camera_filters(ui, state);
    }
}

/// Make checkboxes, then model checkboxes drawn from the make-filtered rows.
fn camera_filters(ui: &mut Ui, state: &mut AppState) {
    let makes = state.insights.make_options.clone();
    let n_selected = state.insights.makes.len();
    let header = format!("Camera makes  ({n_selected}/{})", makes.len());

    egui::CollapsingHeader::new(RichText::new(header).strong())
        .id_salt("camera_makes")
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            if ui.small_button("Clear").clicked() {
                state.clear_makes();
            }
            for make in &makes {
                let mut checked = state.insights.makes.contains(make);
                let color = state.insights.colors.color_for(make);
                if ui
                    .checkbox(&mut checked, RichText::new(make).color(color))
                    .changed()
                {
                    state.toggle_make(make);
                }
            }
        });

    if state.insights.makes.is_empty() {
        return;
    }

    let models = state.insights.model_options.clone();
    let header = format!("Camera models  ({}/{})", state.insights.models.len(), models.len());
    egui::CollapsingHeader::new(RichText::new(header).strong())
        .id_salt("camera_models")
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            if models.is_empty() {
                ui.weak("No model information for the selected makes.");
            }
            for model in &models {
                let mut checked = state.insights.models.contains(model);
                if ui.checkbox(&mut checked, model).changed() {
                    state.toggle_model(model);
                }
            }
        });
}

fn video_filters(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Data Filter");
    ui.label("Select a date range to filter videos");
    ui.separator();

    let mut changed = date_range(ui, "videos", &mut state.video.start, &mut state.video.end);
    if let Some((lo, hi)) = state.video.bounds {
        ui.weak(format!("Dated videos span {lo} to {hi}"));
    }

    ui.add_space(6.0);
    changed |= ui
        .checkbox(
            &mut state.video.show_videos,
            "Display videos for selected time period",
        )
        .changed();

    if changed {
        state.refilter_videos();
    }
}

/// Start / end pickers.  Returns whether either date changed.
fn date_range(
    ui: &mut Ui,
    id: &str,
    start: &mut chrono::NaiveDate,
    end: &mut chrono::NaiveDate,
) -> bool {
    let mut changed = false;
    egui::Grid::new(format!("{id}_dates"))
        .num_columns(2)
        .show(ui, |ui: &mut Ui| {
            ui.label("Start date");
            changed |= ui
                .add(DatePickerButton::new(start).id_salt(&format!("{id}_start")))
                .changed();
            ui.end_row();

            ui.label("End date");
            changed |= ui
                .add(DatePickerButton::new(end).id_salt(&format!("{id}_end")))
                .changed();
            ui.end_row();
        });
    if *start > *end {
        ui.colored_label(Color32::YELLOW, "Start date is after end date: nothing matches.");
    }
    changed
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu, page selector and status line.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open image table…").clicked() {
                ui.close_menu();
                if let Some(path) = pick_table("Open image table") {
                    state.open_image_table(&path);
                }
            }
            if ui.button("Open video table…").clicked() {
                ui.close_menu();
                if let Some(path) = pick_table("Open video table") {
                    state.open_video_table(&path);
                }
            }
        });

        ui.separator();

        for page in Page::ALL {
            ui.selectable_value(&mut state.page, page, page.title());
        }

        ui.separator();
        ui.label(format!(
            "{} images, {} videos",
            state.images.len(),
            state.videos.len()
        ));

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

fn pick_table(title: &str) -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Supported files", &["csv", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file()
}
