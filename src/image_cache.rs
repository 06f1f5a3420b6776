// @file image_cache.rs
// @brief url-keyed icon bitmap cache with coalesced pending loads

use crate::color::Rgba;
use anyhow::{Context, Result, anyhow};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    /// row-major RGBA, 4 bytes per pixel
    pub rgba: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Bitmap> {
        if rgba.len() != width as usize * height as usize * 4 {
            return Err(anyhow!("bitmap {}x{} needs {} bytes, got {}", width, height, width * height * 4, rgba.len()));
        }
        Ok(Bitmap { width, height, rgba })
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Rgba::new(self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3])
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ImageState {
    Loaded(Rc<Bitmap>),
    Failed,
}

/// Starts loading `url`; completion is reported back through `ImageCache::resolve`.
pub trait ImageFetcher {
    fn fetch(&mut self, url: &str);
}

type Continuation = Box<dyn FnOnce(&ImageState)>;

enum Entry {
    Pending(Vec<Continuation>),
    Ready(ImageState),
}

/// Each url is fetched at most once. Failures are cached like successes and
/// are not retried.
#[derive(Default)]
pub struct ImageCache {
    entries: HashMap<String, Entry>,
}

impl ImageCache {
    pub fn new() -> ImageCache {
        ImageCache::default()
    }

    pub fn request<F>(&mut self, url: &str, fetcher: &mut dyn ImageFetcher, continuation: F)
    where
        F: FnOnce(&ImageState) + 'static,
    {
        match self.entries.get_mut(url) {
            Some(Entry::Ready(state)) => continuation(state),
            Some(Entry::Pending(queue)) => queue.push(Box::new(continuation)),
            None => {
                log::debug!("image cache: fetching {url}");
                let first: Continuation = Box::new(continuation);
                self.entries.insert(url.to_string(), Entry::Pending(vec![first]));
                fetcher.fetch(url);
            }
        }
    }

    /// Stores the outcome for `url` and runs its queued continuations in the
    /// order they were enqueued. Returns how many ran.
    pub fn resolve(&mut self, url: &str, result: Result<Bitmap>) -> usize {
        let state = match result {
            Ok(bitmap) => ImageState::Loaded(Rc::new(bitmap)),
            Err(e) => {
                log::warn!("image cache: failed to load {url}: {e:#}");
                ImageState::Failed
            }
        };
        let queue = match self.entries.insert(url.to_string(), Entry::Ready(state.clone())) {
            Some(Entry::Pending(queue)) => queue,
            _ => Vec::new(),
        };
        let n = queue.len();
        for continuation in queue {
            continuation(&state);
        }
        n
    }

    /// Final state of `url`; `None` while pending or never requested.
    pub fn get(&self, url: &str) -> Option<&ImageState> {
        match self.entries.get(url) {
            Some(Entry::Ready(state)) => Some(state),
            _ => None,
        }
    }

    pub fn is_pending(&self, url: &str) -> bool {
        matches!(self.entries.get(url), Some(Entry::Pending(_)))
    }
}

/// Fetcher that records requested paths; `load_files` decodes them from disk.
#[derive(Debug, Default)]
pub struct FileFetcher {
    queue: Vec<String>,
}

impl FileFetcher {
    pub fn new() -> FileFetcher {
        FileFetcher::default()
    }

    pub fn queued(&self) -> &[String] {
        &self.queue
    }

    pub fn load_files(&mut self, cache: &mut ImageCache) -> usize {
        let mut loaded = 0;
        for path in std::mem::take(&mut self.queue) {
            let result = load_bitmap(&path);
            if result.is_ok() {
                loaded += 1;
            }
            cache.resolve(&path, result);
        }
        loaded
    }
}

impl ImageFetcher for FileFetcher {
    fn fetch(&mut self, url: &str) {
        self.queue.push(url.to_string());
    }
}

pub fn load_bitmap(path: &str) -> Result<Bitmap> {
    let img = image::open(path).with_context(|| format!("failed to open icon {path}"))?.to_rgba8();
    let (width, height) = img.dimensions();
    Bitmap::new(width, height, img.into_raw())
}
