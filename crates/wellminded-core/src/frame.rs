//! Still frames captured from the live feed.
//!
//! A captured frame is held the way it will be sent: as a data URI
//! (`data:image/png;base64,...`). The decoded pixels are kept next to it so
//! the UI can show the still without decoding the PNG again.

use std::io::Cursor;
use std::sync::OnceLock;

use base64::{engine::general_purpose, Engine as _};
use image::{ImageFormat, RgbaImage};
use regex::Regex;

use crate::error::{FrameError, SendError};

/// What a zero-area bitmap encodes to. Sent as-is, it fails the payload check.
pub const EMPTY_DATA_URI: &str = "data:,";

const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    data_uri: String,
    preview: Option<RgbaImage>,
}

impl CapturedFrame {
    /// Encode one frame at its intrinsic dimensions as a PNG data URI.
    pub fn encode(image: &RgbaImage) -> Result<Self, FrameError> {
        if image.width() == 0 || image.height() == 0 {
            return Ok(Self::empty());
        }

        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        Ok(Self {
            data_uri: format!(
                "{}{}",
                PNG_DATA_URI_PREFIX,
                general_purpose::STANDARD.encode(&png)
            ),
            preview: Some(image.clone()),
        })
    }

    /// The frame taken before the camera delivered any picture.
    pub fn empty() -> Self {
        Self {
            data_uri: EMPTY_DATA_URI.to_string(),
            preview: None,
        }
    }

    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    pub fn preview(&self) -> Option<&RgbaImage> {
        self.preview.as_ref()
    }

    /// The raw base64 payload, i.e. the data URI without its scheme prefix.
    pub fn payload(&self) -> &str {
        strip_data_uri_prefix(&self.data_uri)
    }

    /// Payload ready for the wire, or `InvalidPayload` when its length is
    /// not a multiple of 4.
    pub fn checked_payload(&self) -> Result<&str, SendError> {
        let payload = self.payload();
        validate_payload(payload)?;
        Ok(payload)
    }
}

/// Strip a leading `data:image/png;base64,` or `data:image/jpeg;base64,`.
/// Anything else is returned unchanged.
pub fn strip_data_uri_prefix(data_uri: &str) -> &str {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    let prefix = PREFIX.get_or_init(|| {
        Regex::new(r"^data:image/(png|jpeg);base64,").expect("data URI prefix pattern is valid")
    });

    match prefix.find(data_uri) {
        Some(m) => &data_uri[m.end()..],
        None => data_uri,
    }
}

/// Structural sanity check only: base64 text comes in groups of four.
pub fn validate_payload(payload: &str) -> Result<(), SendError> {
    if payload.len() % 4 != 0 {
        return Err(SendError::InvalidPayload(payload.len()));
    }
    Ok(())
}
