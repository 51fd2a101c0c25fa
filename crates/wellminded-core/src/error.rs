//! Error types shared by the capture session, the camera backends and the
//! vision client.
//!
//! The taxonomy is flat: camera failures are only logged,
//! everything that happens on send ends up as a blocking alert whose text
//! comes from [`SendError::alert`].

use std::path::PathBuf;

use thiserror::Error;

/// Failure to open or run a camera backend.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera backend unavailable: {0}")]
    Unavailable(String),

    #[error("failed to load still image {path:?}: {source}")]
    StillImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("camera pipeline error: {0}")]
    Pipeline(String),
}

/// Failure to turn a live frame into a storable image.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("failed to encode frame as PNG: {0}")]
    Encode(#[from] image::ImageError),
}

/// Everything that can stop a frame + message pair from becoming a reply.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("a captured frame and a non-empty message are required")]
    MissingInput,

    #[error("encoded image payload has invalid length {0} (not a multiple of 4)")]
    InvalidPayload(usize),

    #[error("request to vision endpoint failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("vision endpoint returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("send task failed: {0}")]
    Task(String),
}

impl SendError {
    /// Text shown to the user in the blocking alert.
    pub fn alert(&self) -> &'static str {
        match self {
            SendError::MissingInput => "Capture an image and write a message before sending.",
            SendError::InvalidPayload(_) => {
                "The image you are trying to send is invalid. Please try again."
            }
            SendError::Request(_) | SendError::Status(_) | SendError::Task(_) => {
                "There was an error processing the request."
            }
        }
    }

    /// Precondition failures are raised before anything touches the network.
    pub fn is_precondition(&self) -> bool {
        matches!(self, SendError::MissingInput | SendError::InvalidPayload(_))
    }
}
