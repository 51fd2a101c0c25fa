//! Camera backends and the live feed they produce.
//!
//! Opening a backend is a one-shot, blocking request that either yields a
//! [`LiveFeed`] or a [`CameraError`]. The feed's producer (a GStreamer
//! pipeline, a generator thread, ...) writes the most recent frame into a
//! shared slot; the UI only ever reads that slot. Dropping the feed stops
//! the producer.

use std::fmt;
use std::sync::{Arc, Mutex};

use image::RgbaImage;

use crate::config::Config;
use crate::error::CameraError;

#[cfg(feature = "gstreamer")]
pub mod gst;
pub mod still;
pub mod synthetic;

pub use still::StillCamera;
pub use synthetic::SyntheticCamera;

/// Latest frame published by a camera producer
pub type FrameSlot = Arc<Mutex<Option<RgbaImage>>>;

/// Something that can hand out a live video feed.
pub trait CameraBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Request camera access. Blocking; run it off the UI task.
    fn open(&self) -> Result<LiveFeed, CameraError>;
}

/// A running camera producer bound to its latest-frame slot.
pub struct LiveFeed {
    source: String,
    latest: FrameSlot,
    stop: Option<Box<dyn FnOnce() + Send>>,
}

impl LiveFeed {
    pub fn new(
        source: impl Into<String>,
        latest: FrameSlot,
        stop: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            source: source.into(),
            latest,
            stop: Some(Box::new(stop)),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Copy of the most recent frame, `None` until the first one arrives.
    pub fn latest_frame(&self) -> Option<RgbaImage> {
        self.with_latest(|frame| frame.cloned())
    }

    /// Borrow the most recent frame without copying it.
    pub fn with_latest<R>(&self, f: impl FnOnce(Option<&RgbaImage>) -> R) -> R {
        match self.latest.lock() {
            Ok(latest) => f(latest.as_ref()),
            Err(_) => f(None),
        }
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
            tracing::debug!(source = %self.source, "camera feed released");
        }
    }
}

impl fmt::Debug for LiveFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveFeed")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraKind {
    Gstreamer,
    Synthetic,
    Still,
}

impl Default for CameraKind {
    fn default() -> Self {
        if cfg!(feature = "gstreamer") {
            CameraKind::Gstreamer
        } else {
            CameraKind::Synthetic
        }
    }
}

impl CameraKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CameraKind::Gstreamer => "gstreamer",
            CameraKind::Synthetic => "synthetic",
            CameraKind::Still => "still",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "gstreamer" | "gst" => Some(CameraKind::Gstreamer),
            "synthetic" | "test" => Some(CameraKind::Synthetic),
            "still" | "file" => Some(CameraKind::Still),
            _ => None,
        }
    }

    pub fn all() -> Vec<CameraKind> {
        vec![CameraKind::Gstreamer, CameraKind::Synthetic, CameraKind::Still]
    }

    pub fn names() -> String {
        Self::all()
            .iter()
            .map(|kind| kind.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Backend that always fails to open; the failure is logged like any other.
pub struct UnavailableCamera {
    reason: String,
}

impl UnavailableCamera {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl CameraBackend for UnavailableCamera {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn open(&self) -> Result<LiveFeed, CameraError> {
        Err(CameraError::Unavailable(self.reason.clone()))
    }
}

/// Build the backend selected by `config`.
pub fn backend_for(config: &Config) -> anyhow::Result<Arc<dyn CameraBackend>> {
    let backend: Arc<dyn CameraBackend> = match config.camera_kind()? {
        CameraKind::Gstreamer => gstreamer_backend(config.device.clone()),
        CameraKind::Synthetic => Arc::new(SyntheticCamera::default()),
        CameraKind::Still => Arc::new(StillCamera::new(config.still_image.clone())),
    };
    Ok(backend)
}

#[cfg(feature = "gstreamer")]
fn gstreamer_backend(device: Option<String>) -> Arc<dyn CameraBackend> {
    Arc::new(gst::GstCamera::new(device))
}

#[cfg(not(feature = "gstreamer"))]
fn gstreamer_backend(_device: Option<String>) -> Arc<dyn CameraBackend> {
    Arc::new(UnavailableCamera::new(
        "built without GStreamer support (rebuild with --features gstreamer)",
    ))
}

/// Helper for backends that publish a single fixed frame.
pub(crate) fn slot_with(frame: Option<RgbaImage>) -> FrameSlot {
    Arc::new(Mutex::new(frame))
}
