use std::path::PathBuf;

use crate::camera::{slot_with, CameraBackend, LiveFeed};
use crate::error::CameraError;

/// Serves one image from disk as if it were a camera that never moves.
pub struct StillCamera {
    path: Option<PathBuf>,
}

impl StillCamera {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl CameraBackend for StillCamera {
    fn name(&self) -> &str {
        "still"
    }

    fn open(&self) -> Result<LiveFeed, CameraError> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| CameraError::Unavailable("no still image configured".to_string()))?;

        let frame = image::open(&path)
            .map_err(|source| CameraError::StillImage {
                path: path.clone(),
                source,
            })?
            .to_rgba8();

        tracing::info!(path = %path.display(), width = frame.width(), height = frame.height(), "still image camera opened");
        Ok(LiveFeed::new(
            format!("still:{}", path.display()),
            slot_with(Some(frame)),
            || {},
        ))
    }
}
