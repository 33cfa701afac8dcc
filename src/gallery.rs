use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use compound_explorer::error::FetchFailure;
use compound_explorer::fetch::{Asset, AssetFetcher, AssetKind, FetchOutcome};
use eframe::egui;

// ---------------------------------------------------------------------------
// Gallery items
// ---------------------------------------------------------------------------

/// One matched row waiting to be shown.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryItem {
    pub url: String,
    pub caption: String,
}

/// Fetch state of one item on the current page.
pub enum Slot {
    Pending,
    Ready {
        asset: Asset,
        /// Uploaded lazily on first paint.
        texture: Option<egui::TextureHandle>,
    },
    Failed(FetchFailure),
}

impl Slot {
    /// Texture for a ready image, uploaded on the first call.  The decoded
    /// pixels are released once the texture holds them.
    pub fn image_texture(&mut self, ctx: &egui::Context) -> Option<&egui::TextureHandle> {
        let Slot::Ready {
            asset: Asset::Image(img),
            texture,
        } = self
        else {
            return None;
        };
        if texture.is_none() {
            let size = [img.width as usize, img.height as usize];
            let pixels = egui::ColorImage::from_rgba_unmultiplied(size, &img.rgba);
            *texture = Some(ctx.load_texture(
                img.url.clone(),
                pixels,
                egui::TextureOptions::LINEAR,
            ));
            img.rgba = Vec::new();
        }
        texture.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Gallery – paged, background-fetched grid contents
// ---------------------------------------------------------------------------

/// Items for one page are fetched in order on a worker thread, one outcome per
/// item.  Replacing the items drops the receiver, which stops the worker at
/// its next send.
pub struct Gallery {
    fetcher: AssetFetcher,
    kind: AssetKind,
    page_size: usize,
    items: Vec<GalleryItem>,
    page: usize,
    slots: Vec<Slot>,
    rx: Option<Receiver<(usize, FetchOutcome)>>,
    needs_start: bool,
}

impl Gallery {
    pub fn new(fetcher: AssetFetcher, kind: AssetKind, page_size: usize) -> Self {
        Self {
            fetcher,
            kind,
            page_size: page_size.max(1),
            items: Vec::new(),
            page: 0,
            slots: Vec::new(),
            rx: None,
            needs_start: false,
        }
    }

    /// Replace the gallery contents.  A no-op when nothing changed, so callers
    /// can push on every filter change without refetching.
    pub fn set_items(&mut self, items: Vec<GalleryItem>) {
        if items == self.items {
            return;
        }
        self.items = items;
        self.page = 0;
        self.reset_page();
    }

    pub fn clear(&mut self) {
        self.set_items(Vec::new());
    }

    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.items.len().div_ceil(self.page_size)
    }

    pub fn set_page(&mut self, page: usize) {
        let page = page.min(self.page_count().saturating_sub(1));
        if page != self.page {
            self.page = page;
            self.reset_page();
        }
    }

    /// Items on the current page paired with their slots.
    pub fn page_entries(&mut self) -> impl Iterator<Item = (&GalleryItem, &mut Slot)> {
        let start = self.page * self.page_size;
        self.items[start..].iter().zip(self.slots.iter_mut())
    }

    pub fn pending(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, Slot::Pending))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, Slot::Failed(_)))
            .count()
    }

    fn page_range(&self) -> std::ops::Range<usize> {
        let start = (self.page * self.page_size).min(self.items.len());
        let end = (start + self.page_size).min(self.items.len());
        start..end
    }

    fn reset_page(&mut self) {
        self.rx = None;
        self.slots = self.page_range().map(|_| Slot::Pending).collect();
        self.needs_start = !self.slots.is_empty();
    }

    /// Spawn the worker for the current page if it has not been started yet.
    pub fn ensure_started(&mut self, ctx: &egui::Context) {
        if !self.needs_start {
            return;
        }
        self.needs_start = false;

        let urls: Vec<String> = self.items[self.page_range()]
            .iter()
            .map(|item| item.url.clone())
            .collect();
        let (tx, rx) = mpsc::channel();
        let fetcher = self.fetcher.clone();
        let kind = self.kind;
        let ctx = ctx.clone();

        log::debug!("Fetching {} assets for page {}", urls.len(), self.page + 1);
        thread::spawn(move || {
            for (pos, url) in urls.iter().enumerate() {
                let outcome = fetcher.fetch(url, kind);
                if tx.send((pos, outcome)).is_err() {
                    // Page replaced; nobody is listening.
                    break;
                }
                ctx.request_repaint();
            }
        });
        self.rx = Some(rx);
    }

    /// Move finished fetches into their slots.
    pub fn poll(&mut self) {
        let Some(rx) = &self.rx else {
            return;
        };
        loop {
            match rx.try_recv() {
                Ok((pos, outcome)) => {
                    if let Some(slot) = self.slots.get_mut(pos) {
                        *slot = match outcome {
                            Ok(asset) => Slot::Ready {
                                asset,
                                texture: None,
                            },
                            Err(failure) => Slot::Failed(failure),
                        };
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.rx = None;
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use compound_explorer::config::FetchConfig;
    use compound_explorer::fetch::DecodedImage;

    use super::*;

    fn items(n: usize) -> Vec<GalleryItem> {
        (0..n)
            .map(|i| GalleryItem {
                url: format!("http://127.0.0.1:9/{i}.jpg"),
                caption: format!("{i}.jpg"),
            })
            .collect()
    }

    fn gallery(page_size: usize) -> Gallery {
        let fetcher = AssetFetcher::new(&FetchConfig::default()).unwrap();
        Gallery::new(fetcher, AssetKind::Image, page_size)
    }

    #[test]
    fn pages_cover_all_items() {
        let mut g = gallery(4);
        g.set_items(items(10));
        assert_eq!(g.page_count(), 3);
        assert_eq!(g.pending(), 4);

        g.set_page(2);
        assert_eq!(g.page(), 2);
        assert_eq!(g.pending(), 2);
        let captions: Vec<String> = g.page_entries().map(|(item, _)| item.caption.clone()).collect();
        assert_eq!(captions, ["8.jpg", "9.jpg"]);

        g.set_page(99);
        assert_eq!(g.page(), 2);
    }

    #[test]
    fn texture_upload_releases_pixels() {
        let ctx = egui::Context::default();
        let mut slot = Slot::Ready {
            asset: Asset::Image(DecodedImage {
                url: "http://127.0.0.1:9/0.jpg".to_string(),
                width: 2,
                height: 2,
                rgba: vec![255; 16],
            }),
            texture: None,
        };

        let first = slot.image_texture(&ctx).map(|t| t.id());
        assert!(first.is_some());
        let second = slot.image_texture(&ctx).map(|t| t.id());
        assert_eq!(first, second);

        match &slot {
            Slot::Ready {
                asset: Asset::Image(img),
                ..
            } => assert!(img.rgba.is_empty()),
            _ => panic!("slot should stay ready"),
        }
        assert!(Slot::Pending.image_texture(&ctx).is_none());
    }

    #[test]
    fn same_items_do_not_reset_the_page() {
        let mut g = gallery(4);
        g.set_items(items(10));
        g.set_page(1);
        g.set_items(items(10));
        assert_eq!(g.page(), 1);

        g.set_items(items(3));
        assert_eq!(g.page(), 0);
        assert_eq!(g.pending(), 3);

        g.clear();
        assert_eq!(g.page_count(), 0);
        assert_eq!(g.pending(), 0);
    }
}
