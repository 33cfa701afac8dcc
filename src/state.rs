use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::NaiveDate;
use compound_explorer::config::ExplorerConfig;
use compound_explorer::data::aggregate::{count_by_date, count_by_date_and_make, DateCount};
use compound_explorer::data::filter::{
    camera_make_options, camera_model_options, date_bounds, filter_by_category, filter_by_date,
    filter_by_date_and_camera,
};
use compound_explorer::data::loader::{load_image_table, load_video_table};
use compound_explorer::data::model::{ImageTable, VideoTable};
use compound_explorer::fetch::{AssetFetcher, AssetKind};

use crate::color::ColorMap;
use crate::gallery::{Gallery, GalleryItem};

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    About,
    Classification,
    ImageInsights,
    VideoInsights,
    Disclaimer,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::About,
        Page::Classification,
        Page::ImageInsights,
        Page::VideoInsights,
        Page::Disclaimer,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::About => "About",
            Page::Classification => "Image Classification",
            Page::ImageInsights => "Image Insights",
            Page::VideoInsights => "Video Insights",
            Page::Disclaimer => "CIA Disclaimer",
        }
    }
}

// ---------------------------------------------------------------------------
// Per-page views
// ---------------------------------------------------------------------------

/// Category + threshold browsing.
pub struct ClassificationView {
    /// Categories sorted by name.
    pub categories: Vec<String>,
    pub category: String,
    pub threshold: f64,
    pub rows: Vec<usize>,
    pub gallery: Gallery,
}

/// Date range + camera browsing over dated images.
pub struct InsightsView {
    pub bounds: Option<(NaiveDate, NaiveDate)>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub show_camera_info: bool,
    pub make_options: BTreeSet<String>,
    pub makes: BTreeSet<String>,
    pub model_options: BTreeSet<String>,
    pub models: BTreeSet<String>,
    pub rows: Vec<usize>,
    pub series: Vec<DateCount>,
    /// One series per make, only when makes are selected.
    pub series_by_make: BTreeMap<String, Vec<DateCount>>,
    pub colors: ColorMap,
    pub gallery: Gallery,
}

pub struct VideoView {
    pub bounds: Option<(NaiveDate, NaiveDate)>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Matching rows sorted by timestamp.
    pub rows: Vec<usize>,
    pub series: Vec<DateCount>,
    pub show_videos: bool,
    pub gallery: Gallery,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: ExplorerConfig,
    pub images: ImageTable,
    pub videos: VideoTable,
    pub page: Page,
    pub classification: ClassificationView,
    pub insights: InsightsView,
    pub video: VideoView,
    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(
        config: ExplorerConfig,
        images: ImageTable,
        videos: VideoTable,
        fetcher: AssetFetcher,
    ) -> Self {
        let page_size = config.gallery.page_size;
        let classification = ClassificationView {
            categories: Vec::new(),
            category: String::new(),
            threshold: config.default_threshold,
            rows: Vec::new(),
            gallery: Gallery::new(fetcher.clone(), AssetKind::Image, page_size),
        };
        let insights = InsightsView {
            bounds: None,
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
            show_camera_info: false,
            make_options: BTreeSet::new(),
            makes: BTreeSet::new(),
            model_options: BTreeSet::new(),
            models: BTreeSet::new(),
            rows: Vec::new(),
            series: Vec::new(),
            series_by_make: BTreeMap::new(),
            colors: ColorMap::default(),
            gallery: Gallery::new(fetcher.clone(), AssetKind::Image, page_size),
        };
        let video = VideoView {
            bounds: None,
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
            rows: Vec::new(),
            series: Vec::new(),
            show_videos: false,
            gallery: Gallery::new(fetcher, AssetKind::Video, page_size),
        };

        let mut state = Self {
            config,
            images,
            videos,
            page: Page::About,
            classification,
            insights,
            video,
            status_message: None,
        };
        state.reset_image_views();
        state.reset_video_view();
        state
    }

    // -- Table replacement ------------------------------------------------

    /// Replace the image table wholesale.  On failure the current table stays.
    pub fn open_image_table(&mut self, path: &Path) {
        match load_image_table(path) {
            Ok(table) => {
                self.images = table;
                self.status_message = None;
                self.reset_image_views();
            }
            Err(e) => {
                log::error!("Failed to load image table: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    pub fn open_video_table(&mut self, path: &Path) {
        match load_video_table(path) {
            Ok(table) => {
                self.videos = table;
                self.status_message = None;
                self.reset_video_view();
            }
            Err(e) => {
                log::error!("Failed to load video table: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    fn reset_image_views(&mut self) {
        let view = &mut self.classification;
        view.categories = self.images.sorted_categories();
        if !view.categories.contains(&view.category) {
            view.category = view.categories.first().cloned().unwrap_or_default();
        }

        let view = &mut self.insights;
        view.bounds = date_bounds(self.images.records());
        if let Some((lo, hi)) = view.bounds {
            view.start = lo;
            view.end = hi;
        }
        view.make_options = camera_make_options(&self.images);
        view.colors = ColorMap::new(&view.make_options);
        view.makes.clear();
        view.models.clear();

        self.refilter_classification();
        self.refilter_insights();
    }

    fn reset_video_view(&mut self) {
        let view = &mut self.video;
        view.bounds = date_bounds(self.videos.records());
        if let Some((lo, hi)) = view.bounds {
            view.start = lo;
            view.end = hi;
        }
        self.refilter_videos();
    }

    // -- Classification ---------------------------------------------------

    /// Recompute the matching images after a category / threshold change.
    pub fn refilter_classification(&mut self) {
        let view = &mut self.classification;
        if view.category.is_empty() {
            view.rows.clear();
            view.gallery.clear();
            return;
        }
        match filter_by_category(&self.images, &view.category, view.threshold) {
            Ok(rows) => view.rows = rows,
            Err(e) => {
                log::error!("Classification filter rejected: {e}");
                self.status_message = Some(format!("Error: {e}"));
                view.rows.clear();
            }
        }

        let idx = self.images.category_index(&view.category);
        let items = self
            .images
            .select(&view.rows)
            .into_iter()
            .map(|rec| GalleryItem {
                url: rec.source_url.clone(),
                caption: match idx {
                    Some(i) => format!("{} - score: {:.2}", rec.file_name, rec.score(i)),
                    None => rec.file_name.clone(),
                },
            })
            .collect();
        view.gallery.set_items(items);
    }

    // -- Image insights ---------------------------------------------------

    /// Recompute the date/camera subset, its series and the model choices.
    pub fn refilter_insights(&mut self) {
        let view = &mut self.insights;
        let no_models = BTreeSet::new();

        if view.show_camera_info && !view.makes.is_empty() {
            let by_make =
                filter_by_date_and_camera(&self.images, view.start, view.end, &view.makes, &no_models);
            view.model_options = camera_model_options(&self.images, &by_make);
            let options = &view.model_options;
            view.models.retain(|m| options.contains(m));
        } else {
            view.model_options.clear();
            view.models.clear();
        }

        let (makes, models) = if view.show_camera_info {
            (&view.makes, &view.models)
        } else {
            (&no_models, &no_models)
        };
        view.rows = filter_by_date_and_camera(&self.images, view.start, view.end, makes, models);

        let selected = self.images.select(&view.rows);
        view.series = count_by_date(selected.iter().copied());
        view.series_by_make = if makes.is_empty() {
            BTreeMap::new()
        } else {
            count_by_date_and_make(selected.iter().copied())
        };

        let show_info = view.show_camera_info;
        let items = selected
            .into_iter()
            .map(|rec| {
                let caption = if show_info {
                    let model = rec.camera_model.as_deref().unwrap_or(" ");
                    let when = rec
                        .timestamp
                        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_default();
                    format!(
                        "{} - Camera: {} {} - Date: {}",
                        rec.file_name, rec.camera_make, model, when
                    )
                } else {
                    rec.file_name.clone()
                };
                GalleryItem {
                    url: rec.source_url.clone(),
                    caption,
                }
            })
            .collect();
        view.gallery.set_items(items);
    }

    pub fn toggle_make(&mut self, make: &str) {
        let makes = &mut self.insights.makes;
        if !makes.remove(make) {
            makes.insert(make.to_string());
        }
        self.refilter_insights();
    }

    pub fn toggle_model(&mut self, model: &str) {
        let models = &mut self.insights.models;
        if !models.remove(model) {
            models.insert(model.to_string());
        }
        self.refilter_insights();
    }

    pub fn clear_makes(&mut self) {
        self.insights.makes.clear();
        self.refilter_insights();
    }

    // -- Videos -----------------------------------------------------------

    pub fn refilter_videos(&mut self) {
        let view = &mut self.video;
        let mut rows = filter_by_date(self.videos.records(), view.start, view.end);
        let records = self.videos.records();
        rows.sort_by_key(|&i| records[i].timestamp);
        view.series = count_by_date(self.videos.select(&rows));
        view.rows = rows;

        if view.show_videos {
            let items = self
                .videos
                .select(&view.rows)
                .into_iter()
                .map(|rec| GalleryItem {
                    url: rec.source_url.clone(),
                    caption: format!(
                        "{} - Date: {}",
                        rec.file_name,
                        rec.timestamp
                            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                            .unwrap_or_default()
                    ),
                })
                .collect();
            view.gallery.set_items(items);
        } else {
            view.gallery.clear();
        }
    }

    /// Drain finished fetches for every gallery.
    pub fn poll_galleries(&mut self) {
        self.classification.gallery.poll();
        self.insights.gallery.poll();
        self.video.gallery.poll();
    }
}
