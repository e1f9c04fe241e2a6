//! Lazy texture cache with a background loader.
//!
//! Requests go to a worker thread; finished loads come back over a channel and
//! are picked up by [`AssetCache::poll`]. A texture that failed to load stays
//! incomplete for good: it is logged once and skipped on every frame.

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use crate::TextureRef;

/// Where texture pixels come from.
pub trait TextureSource: Send + Sync {
    fn load(&self, path: &TextureRef) -> Result<RgbaImage, AssetError>;
}

/// Textures read from disk, relative to a root directory.
#[derive(Debug, Clone)]
pub struct FsTextureSource {
    root: PathBuf,
}

impl FsTextureSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TextureSource for FsTextureSource {
    fn load(&self, path: &TextureRef) -> Result<RgbaImage, AssetError> {
        let full = self.root.join(path.as_str());
        let img = image::open(&full).map_err(|source| AssetError::Decode {
            path: path.clone(),
            source,
        })?;
        Ok(img.to_rgba8())
    }
}

/// Textures held in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryTextureSource {
    images: HashMap<TextureRef, RgbaImage>,
}

impl MemoryTextureSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<TextureRef>, image: RgbaImage) {
        self.images.insert(path.into(), image);
    }

    pub fn with(mut self, path: impl Into<TextureRef>, image: RgbaImage) -> Self {
        self.insert(path, image);
        self
    }
}

impl TextureSource for MemoryTextureSource {
    fn load(&self, path: &TextureRef) -> Result<RgbaImage, AssetError> {
        self.images
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound { path: path.clone() })
    }
}

/// Load a texture and scale it to one grid cell.
pub fn load_tile(
    source: &dyn TextureSource,
    path: &TextureRef,
    block_size: u32,
) -> Result<RgbaImage, AssetError> {
    let img = source.load(path)?;
    if img.width() == block_size && img.height() == block_size {
        return Ok(img);
    }
    Ok(imageops::resize(&img, block_size, block_size, FilterType::Nearest))
}

/// Lookup of ready cell-sized tiles by path.
pub trait TileLookup {
    fn tile(&self, path: &TextureRef) -> Option<&RgbaImage>;
}

impl TileLookup for HashMap<TextureRef, RgbaImage> {
    fn tile(&self, path: &TextureRef) -> Option<&RgbaImage> {
        self.get(path)
    }
}

#[derive(Debug)]
enum Slot {
    Pending,
    Ready(RgbaImage),
    Failed,
}

/// What the cache currently knows about a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetState {
    Missing,
    Pending,
    Ready,
    Failed,
}

type Completion = (TextureRef, Result<RgbaImage, AssetError>);

pub struct AssetCache {
    slots: HashMap<TextureRef, Slot>,
    requests: Option<Sender<TextureRef>>,
    completions: Receiver<Completion>,
    worker: Option<JoinHandle<()>>,
}

impl AssetCache {
    /// Start a loader thread reading from `source` and scaling to `block_size`.
    pub fn new(source: Arc<dyn TextureSource>, block_size: u32) -> Self {
        let (req_tx, req_rx) = channel::unbounded::<TextureRef>();
        let (done_tx, done_rx) = channel::unbounded::<Completion>();

        let worker = std::thread::Builder::new()
            .name("minedraw-assets".into())
            .spawn(move || {
                for path in req_rx {
                    trace!(path = %path, "loading texture");
                    let result = load_tile(source.as_ref(), &path, block_size);
                    if done_tx.send((path, result)).is_err() {
                        break;
                    }
                }
            })
            .ok();
        if worker.is_none() {
            warn!("could not start texture loader thread, textures will stay pending");
        }

        Self {
            slots: HashMap::new(),
            requests: Some(req_tx),
            completions: done_rx,
            worker,
        }
    }

    pub fn state(&self, path: &TextureRef) -> AssetState {
        match self.slots.get(path) {
            None => AssetState::Missing,
            Some(Slot::Pending) => AssetState::Pending,
            Some(Slot::Ready(_)) => AssetState::Ready,
            Some(Slot::Failed) => AssetState::Failed,
        }
    }

    /// Ask for a texture. Does nothing if it is already known.
    pub fn request(&mut self, path: &TextureRef) {
        if self.slots.contains_key(path) {
            return;
        }
        let sent = self
            .requests
            .as_ref()
            .is_some_and(|tx| tx.send(path.clone()).is_ok());
        if sent {
            debug!(path = %path, "texture requested");
            self.slots.insert(path.clone(), Slot::Pending);
        } else {
            warn!(path = %path, "texture loader unavailable");
            self.slots.insert(path.clone(), Slot::Failed);
        }
    }

    pub fn pending(&self) -> usize {
        self.slots
            .values()
            .filter(|s| matches!(s, Slot::Pending))
            .count()
    }

    fn complete(&mut self, (path, result): Completion) -> bool {
        match result {
            Ok(tile) => {
                debug!(path = %path, "texture ready");
                self.slots.insert(path, Slot::Ready(tile));
                true
            }
            Err(e) => {
                warn!(path = %path, error = %e, "texture failed to load");
                self.slots.insert(path, Slot::Failed);
                false
            }
        }
    }

    /// Drain finished loads. Returns how many textures became ready.
    pub fn poll(&mut self) -> usize {
        let mut ready = 0;
        while let Ok(done) = self.completions.try_recv() {
            if self.complete(done) {
                ready += 1;
            }
        }
        ready
    }

    /// Block until nothing is pending or `timeout` elapses. Returns how many
    /// textures became ready.
    pub fn wait_idle(&mut self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut ready = 0;
        while self.pending() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.completions.recv_timeout(remaining) {
                Ok(done) => {
                    if self.complete(done) {
                        ready += 1;
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        ready
    }
}

impl TileLookup for AssetCache {
    fn tile(&self, path: &TextureRef) -> Option<&RgbaImage> {
        match self.slots.get(path) {
            Some(Slot::Ready(tile)) => Some(tile),
            _ => None,
        }
    }
}

impl Drop for AssetCache {
    fn drop(&mut self) {
        // Closing the request channel ends the worker loop.
        drop(self.requests.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("texture not found: {path}")]
    NotFound { path: TextureRef },

    #[error("could not decode texture {path}: {source}")]
    Decode {
        path: TextureRef,
        #[source]
        source: image::ImageError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(size: u32, rgba: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(size, size, Rgba(rgba))
    }

    #[test]
    fn tiles_are_scaled_to_block_size() {
        let source = MemoryTextureSource::new().with("dirt.png", solid(16, [90, 60, 30, 255]));
        let tile = load_tile(&source, &"dirt.png".into(), 32).unwrap();
        assert_eq!(tile.dimensions(), (32, 32));
        assert_eq!(*tile.get_pixel(31, 31), Rgba([90, 60, 30, 255]));
    }

    #[test]
    fn request_then_wait_makes_texture_ready() {
        let source = MemoryTextureSource::new().with("dirt.png", solid(4, [1, 2, 3, 255]));
        let mut cache = AssetCache::new(Arc::new(source), 8);
        let dirt = TextureRef::new("dirt.png");

        assert_eq!(cache.state(&dirt), AssetState::Missing);
        cache.request(&dirt);
        cache.request(&dirt);
        assert!(cache.pending() <= 1);

        assert_eq!(cache.wait_idle(Duration::from_secs(5)), 1);
        assert_eq!(cache.state(&dirt), AssetState::Ready);
        assert_eq!(cache.tile(&dirt).unwrap().dimensions(), (8, 8));
    }

    #[test]
    fn failed_texture_is_never_ready() {
        let mut cache = AssetCache::new(Arc::new(MemoryTextureSource::new()), 8);
        let missing = TextureRef::new("missing.png");
        cache.request(&missing);
        assert_eq!(cache.wait_idle(Duration::from_secs(5)), 0);
        assert_eq!(cache.state(&missing), AssetState::Failed);

        // No retry on a second request.
        cache.request(&missing);
        assert_eq!(cache.pending(), 0);
        assert!(cache.tile(&missing).is_none());
    }

    #[test]
    fn fs_source_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsTextureSource::new(dir.path());
        assert!(matches!(
            source.load(&"textures/block/none.png".into()),
            Err(AssetError::Decode { .. })
        ));

        let path = dir.path().join("red.png");
        solid(2, [255, 0, 0, 255]).save(&path).unwrap();
        let img = source.load(&"red.png".into()).unwrap();
        assert_eq!(img.dimensions(), (2, 2));
    }
}
