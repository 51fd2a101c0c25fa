//! State of the capture screen: live feed vs still, flash, the message being
//! composed, the in-flight flag and the transcript.
//!
//! The session never performs I/O itself. It hands out [`CameraRequest`]s and
//! [`SendRequest`]s for the caller to run and takes the results back through
//! [`CaptureSession::accepts_feed`] and [`CaptureSession::finish_send`]. Time
//! is passed in explicitly so the flash deadline can be driven by the UI
//! tick (or by a test).

use std::time::{Duration, Instant};

use image::RgbaImage;
use tracing::{debug, info};

use crate::ai::ChatBackend;
use crate::error::{FrameError, SendError};
use crate::frame::CapturedFrame;
use crate::reply::format_reply;
use crate::state::Transcript;

/// How long the white flash stays up after a capture
pub const FLASH_DURATION: Duration = Duration::from_millis(200);

/// Ticket for one camera acquisition. Only the latest ticket is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraRequest(u64);

/// A validated frame + message pair, ready to go on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    /// Base64 image payload, data-URI prefix already stripped
    pub img: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    /// The flash is over and the still replaced the live feed
    FlashEnded,
}

#[derive(Debug)]
pub struct CaptureSession {
    capturing: bool,
    flash_until: Option<Instant>,
    captured: Option<CapturedFrame>,
    transcript: Transcript,
    message: String,
    in_flight: bool,
    camera_ticket: u64,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSession {
    pub fn new() -> Self {
        Self {
            capturing: true,
            flash_until: None,
            captured: None,
            transcript: Transcript::new(),
            message: String::new(),
            in_flight: false,
            camera_ticket: 0,
        }
    }

    /// Screen entry: the session starts out capturing, so ask for the camera.
    pub fn enter(&mut self) -> CameraRequest {
        self.next_camera_request()
    }

    fn next_camera_request(&mut self) -> CameraRequest {
        self.camera_ticket += 1;
        CameraRequest(self.camera_ticket)
    }

    /// Whether a feed opened for `request` should be bound to the video
    /// surface. Stale tickets and feeds arriving after a capture are refused.
    pub fn accepts_feed(&self, request: CameraRequest) -> bool {
        request.0 == self.camera_ticket && self.capturing && self.captured.is_none()
    }

    /// Snapshot the live surface.
    ///
    /// `frame` is the latest picture from the feed, `None` when the feed is
    /// bound but has not produced anything yet (zero intrinsic size). Returns
    /// `false` when there is nothing to capture from because a still is
    /// already shown.
    pub fn capture(&mut self, frame: Option<&RgbaImage>, now: Instant) -> Result<bool, FrameError> {
        if !self.capturing || self.captured.is_some() {
            return Ok(false);
        }

        let captured = match frame {
            Some(image) => CapturedFrame::encode(image)?,
            None => CapturedFrame::empty(),
        };
        debug!(data_uri_len = captured.data_uri().len(), "captured frame");

        self.captured = Some(captured);
        self.flash_until = Some(now + FLASH_DURATION);
        Ok(true)
    }

    /// Advance timers. Ends the flash (and the capturing state) once its
    /// deadline has passed.
    pub fn tick(&mut self, now: Instant) -> Option<TickEvent> {
        match self.flash_until {
            Some(deadline) if now >= deadline => {
                self.flash_until = None;
                self.capturing = false;
                Some(TickEvent::FlashEnded)
            }
            _ => None,
        }
    }

    /// Drop the still and go back to the live feed.
    pub fn retry(&mut self) -> CameraRequest {
        self.captured = None;
        self.flash_until = None;
        self.capturing = true;
        info!("retrying capture");
        self.next_camera_request()
    }

    /// Check preconditions and build the request. Sets the in-flight flag
    /// on success; on error nothing changes.
    pub fn prepare_send(&mut self) -> Result<SendRequest, SendError> {
        let frame = match &self.captured {
            Some(frame) if !self.message.trim().is_empty() => frame,
            _ => return Err(SendError::MissingInput),
        };

        let img = frame.checked_payload()?.to_string();

        self.in_flight = true;
        Ok(SendRequest {
            img,
            text: self.message.clone(),
        })
    }

    /// Settle a request started with [`prepare_send`](Self::prepare_send).
    ///
    /// The in-flight flag is always cleared. On success the user's message
    /// and the formatted reply are appended together and the input is
    /// cleared; on failure the transcript and the input are left alone.
    pub fn finish_send(
        &mut self,
        request: &SendRequest,
        result: Result<String, SendError>,
    ) -> Result<(), SendError> {
        self.in_flight = false;
        let reply = result?;

        self.transcript
            .push_exchange(request.text.clone(), format_reply(&reply));
        self.message.clear();
        info!(transcript_len = self.transcript.len(), "reply received");
        Ok(())
    }

    /// Prepare, send through `backend` and settle in one go.
    pub async fn send_with(&mut self, backend: &dyn ChatBackend) -> Result<(), SendError> {
        let request = self.prepare_send()?;
        let result = backend.send(&request).await;
        self.finish_send(&request, result)
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    pub fn is_flashing(&self) -> bool {
        self.flash_until.is_some()
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn captured(&self) -> Option<&CapturedFrame> {
        self.captured.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn message_mut(&mut self) -> &mut String {
        &mut self.message
    }
}
