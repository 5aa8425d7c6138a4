//! Latest camera frame and crop region pushed by the browser

use crate::error::ScanError;
use crate::preprocessing::{CropRegion, PixelBuffer};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Input for one pipeline invocation
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub frame: Arc<PixelBuffer>,
    pub region: CropRegion,
}

#[derive(Debug, Default)]
struct Inner {
    frame: Option<Arc<PixelBuffer>>,
    region: Option<CropRegion>,
}

/// Most recent frame and crop region.
///
/// Frames are replaced whole, never edited, so a snapshot keeps reading the
/// frame it was taken from while newer ones arrive.
#[derive(Debug, Default)]
pub struct FrameStore {
    inner: RwLock<Inner>,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_frame(&self, frame: PixelBuffer) {
        let (width, height) = frame.dimensions();
        self.inner.write().await.frame = Some(Arc::new(frame));
        tracing::debug!("Stored camera frame {}x{}", width, height);
    }

    /// Store the region clamped to the display and return what was stored
    pub async fn set_region(&self, region: CropRegion) -> CropRegion {
        let clamped = region.clamped();
        self.inner.write().await.region = Some(clamped);
        clamped
    }

    pub async fn region(&self) -> Option<CropRegion> {
        self.inner.read().await.region
    }

    /// Frame and region for one pipeline run.
    ///
    /// Without a region the whole frame is used.
    pub async fn snapshot(&self) -> Result<FrameSnapshot, ScanError> {
        let inner = self.inner.read().await;
        let frame = inner.frame.clone().ok_or(ScanError::NotReady)?;
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(ScanError::NotReady);
        }
        let region = inner
            .region
            .unwrap_or_else(|| CropRegion::full(width, height));

        Ok(FrameSnapshot { frame, region })
    }
}
