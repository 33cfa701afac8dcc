use std::collections::BTreeMap;

use compound_explorer::data::aggregate::total;
use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::ColorMap;
use crate::state::{AppState, Page};
use crate::ui::{grid, plot};

const RELEASE_URL: &str = "https://www.cia.gov/library/abbottabad-compound/index.html";

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the body of the selected page.
pub fn central(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match state.page {
            Page::About => about(ui),
            Page::Classification => classification(ui, state),
            Page::ImageInsights => image_insights(ui, state),
            Page::VideoInsights => video_insights(ui, state),
            Page::Disclaimer => disclaimer(ui),
        });
}

fn classification(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Image Classification Results");
    ui.label(
        "Every image was scored between 0 and 1 against a fixed set of keyword \
         categories with the pre-trained CLIP model. Pick a category and a \
         threshold in the sidebar to browse the images that match it.",
    );
    how_to_use(
        ui,
        "classification_help",
        &[
            "Select category: choose a keyword category from the sidebar dropdown.",
            "Set threshold: move the slider to keep images scoring at or above it.",
            "View images: browse the grid; each caption shows the file name and \
             its score for the selected category.",
        ],
        "Find images that clearly show eyes: select \"eye\", set the threshold \
         to 0.80 and review the grid.",
    );
    ui.add_space(8.0);

    let columns = state.config.gallery.columns;
    let view = &mut state.classification;
    if view.categories.is_empty() {
        ui.weak("The loaded table has no categories.");
        return;
    }
    ui.strong(format!(
        "Images for category '{}' with score above {:.2}",
        view.category, view.threshold
    ));
    ui.add_space(4.0);
    grid::asset_grid(ui, "classification_grid", &mut view.gallery, columns);
}

fn image_insights(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Image Metadata Insights");
    ui.label(
        "Images whose capture time could be read from their metadata. The chart \
         counts images per day in the selected period; days without images are \
         skipped.",
    );
    how_to_use(
        ui,
        "insights_help",
        &[
            "Select date range: pick a start and an end date in the sidebar.",
            "Display metadata: tick the camera, date and time option to caption \
             each image with its camera and capture time, and to filter by \
             camera make and model.",
            "Browse images: the chart and the grid follow the selected range.",
        ],
        "Find images captured on one day: set the start and end dates to that \
         same day.",
    );
    ui.add_space(8.0);

    let columns = state.config.gallery.columns;
    let view = &mut state.insights;
    plot::count_plot(
        ui,
        "insights_plot",
        "Number of images over selected time period",
        &view.series,
        &view.series_by_make,
        &view.colors,
    );
    ui.weak(format!(
        "{} dated images on {} days",
        total(&view.series),
        view.series.len()
    ));
    ui.add_space(8.0);
    ui.strong(format!("Images from {} to {}", view.start, view.end));
    ui.add_space(4.0);
    grid::asset_grid(ui, "insights_grid", &mut view.gallery, columns);
}

fn video_insights(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Video Insights");
    ui.add_space(8.0);

    let columns = state.config.gallery.columns;
    let view = &mut state.video;
    plot::count_plot(
        ui,
        "video_plot",
        "Number of videos over selected time period",
        &view.series,
        &BTreeMap::new(),
        &ColorMap::default(),
    );
    ui.weak(format!(
        "{} videos on {} days",
        total(&view.series),
        view.series.len()
    ));
    ui.add_space(8.0);
    ui.strong(format!("Videos from {} to {}", view.start, view.end));

    let records = state.videos.select(&view.rows);
    ui.push_id("video_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto().at_least(160.0))
            .column(Column::auto().at_least(150.0))
            .column(Column::remainder())
            .max_scroll_height(240.0)
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong("File");
                });
                header.col(|ui| {
                    ui.strong("Timestamp");
                });
                header.col(|ui| {
                    ui.strong("URL");
                });
            })
            .body(|body| {
                body.rows(18.0, records.len(), |mut row| {
                    let rec = records[row.index()];
                    row.col(|ui| {
                        ui.label(&rec.file_name);
                    });
                    row.col(|ui| {
                        ui.label(
                            rec.timestamp
                                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                                .unwrap_or_default(),
                        );
                    });
                    row.col(|ui| {
                        ui.hyperlink(&rec.source_url);
                    });
                });
            });
    });

    if view.show_videos {
        ui.add_space(8.0);
        grid::asset_grid(ui, "video_grid", &mut view.gallery, columns);
    }
}

/// Collapsed numbered steps plus one worked example.
fn how_to_use(ui: &mut Ui, id: &str, steps: &[&str], example: &str) {
    egui::CollapsingHeader::new("How to use")
        .id_salt(id)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            for (n, step) in steps.iter().enumerate() {
                ui.label(format!("{}. {step}", n + 1));
            }
            ui.add_space(4.0);
            ui.strong("Example");
            ui.label(example);
        });
}

// ---------------------------------------------------------------------------
// Text pages
// ---------------------------------------------------------------------------

fn about(ui: &mut Ui) {
    ui.heading("Abbottabad Compound Material");
    ui.label(
        "An interactive browser for the images released by the CIA from the \
         material seized in the 2011 raid on the Abbottabad compound. Images can \
         be filtered by classification category and score, or by capture date \
         and camera.",
    );
    ui.add_space(8.0);
    ui.label(
        "The authors are not affiliated with, authorized or endorsed by any of the \
         persons, organizations or states shown or mentioned. Views expressed in \
         the material are not those of the authors.",
    );

    ui.add_space(12.0);
    ui.heading("Image insights");
    ui.label(
        "Each image was classified beforehand with OpenAI's CLIP model against \
         predefined keywords (eye, mask, disaster, statue, ...). A score around \
         0.2 is a weak match, around 0.5 a moderate one, 0.8 or higher a strong \
         one. Some images also carry capture time and camera make/model.",
    );

    ui.add_space(12.0);
    ui.heading("The November 2017 release");
    ui.horizontal_wrapped(|ui: &mut Ui| {
        ui.label("All images come from the November 2017 release:");
        ui.hyperlink_to("CIA library", RELEASE_URL);
    });
    ui.add_space(4.0);
    ui.label(
        RichText::new(
            "Warning: the collection may contain offensive or disturbing content \
             and may not be suitable for all ages. It was seized from a terrorist \
             organization by the US Central Intelligence Agency.",
        )
        .strong(),
    );

    egui::CollapsingHeader::new("How CLIP classification works")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.label(
                "CLIP (Contrastive Language-Image Pretraining) encodes images and \
                 text into a shared embedding space. For an image and a list of \
                 keywords it computes the similarity of the image vector to each \
                 keyword vector and turns it into a probability per keyword.",
            );
            ui.label(
                "Images were processed once against the keyword list; this \
                 application only browses the resulting scores.",
            );
        });
}

fn disclaimer(ui: &mut Ui) {
    ui.heading("CIA Disclaimer");
    ui.horizontal_wrapped(|ui: &mut Ui| {
        ui.label("Reproduced from the");
        ui.hyperlink_to("CIA website", RELEASE_URL);
    });
    ui.add_space(8.0);
    ui.strong("November 2017 Release of Abbottabad Compound Material");
    ui.label(
        "On 1 November 2017 the Central Intelligence Agency released additional \
         materials recovered in the 2 May 2011 raid on Usama Bin Ladin's compound \
         in Abbottabad, Pakistan. Material still withheld includes copyrighted \
         works, material whose release would damage national security, \
         pornography, malware, and blank, corrupted or duplicate files.",
    );
    ui.add_space(8.0);
    ui.strong("Copyright Disclaimer");
    ui.label(
        "The files underwent interagency review and an effort was made to remove \
         copyrighted material, but they may still contain copyrighted works. \
         Further reproduction, distribution or public display of any copyrighted \
         work is generally prohibited without the permission of the copyright \
         owner. Copyright owners may request removal via the CIA Office of Public \
         Affairs.",
    );
}
