// GStreamer camera backend
//
// Pipeline:
//
//   v4l2src device=<dev> | autovideosrc
//     ! videoconvert
//     ! video/x-raw,format=RGBA
//     ! appsink name=frames max-buffers=1 drop=true sync=false
//
// The appsink callback copies each sample into the shared frame slot,
// dropping row padding. Only video is requested; no resolution caps are set
// so the device picks its default mode.

use std::sync::Arc;

use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use image::RgbaImage;

use crate::camera::{CameraBackend, FrameSlot, LiveFeed};
use crate::error::CameraError;

const APPSINK_NAME: &str = "frames";

pub struct GstCamera {
    device: Option<String>,
}

impl GstCamera {
    pub fn new(device: Option<String>) -> Self {
        Self { device }
    }

    fn source_description(&self) -> String {
        match &self.device {
            Some(device) => format!("v4l2src device={}", device),
            None => "autovideosrc".to_string(),
        }
    }
}

impl CameraBackend for GstCamera {
    fn name(&self) -> &str {
        "gstreamer"
    }

    fn open(&self) -> Result<LiveFeed, CameraError> {
        gst::init().map_err(|e| CameraError::Unavailable(format!("GStreamer init failed: {}", e)))?;

        let source = self.source_description();
        let description = format!(
            "{} ! videoconvert ! video/x-raw,format=RGBA ! appsink name={} max-buffers=1 drop=true sync=false",
            source, APPSINK_NAME
        );

        let pipeline = gst::parse::launch(&description)
            .map_err(|e| CameraError::Pipeline(e.to_string()))?
            .downcast::<gst::Pipeline>()
            .map_err(|_| CameraError::Pipeline("launch description is not a pipeline".to_string()))?;

        let sink = pipeline
            .by_name(APPSINK_NAME)
            .and_then(|element| element.downcast::<gst_app::AppSink>().ok())
            .ok_or_else(|| CameraError::Pipeline("missing appsink in camera pipeline".to_string()))?;

        let slot: FrameSlot = Arc::default();
        let sink_slot = Arc::clone(&slot);
        sink.set_callbacks(
            gst_app::AppSinkCallbacks::builder()
                .new_sample(move |sink| {
                    let sample = sink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                    if let Some(frame) = sample_to_rgba(&sample) {
                        if let Ok(mut latest) = sink_slot.lock() {
                            *latest = Some(frame);
                        }
                    }
                    Ok(gst::FlowSuccess::Ok)
                })
                .build(),
        );

        pipeline
            .set_state(gst::State::Playing)
            .map_err(|e| CameraError::Pipeline(format!("failed to start camera: {}", e)))?;

        // Busy or forbidden devices report on the bus right after start
        if let Some(bus) = pipeline.bus() {
            if let Some(message) =
                bus.timed_pop_filtered(gst::ClockTime::from_mseconds(500), &[gst::MessageType::Error])
            {
                if let gst::MessageView::Error(err) = message.view() {
                    let _ = pipeline.set_state(gst::State::Null);
                    return Err(CameraError::Pipeline(format!(
                        "{} ({})",
                        err.error(),
                        err.debug().map(|d| d.to_string()).unwrap_or_else(|| "no debug info".to_string())
                    )));
                }
            }
        }

        tracing::info!(source = %source, "camera pipeline playing");
        Ok(LiveFeed::new(source, slot, move || {
            let _ = pipeline.set_state(gst::State::Null);
        }))
    }
}

fn sample_to_rgba(sample: &gst::Sample) -> Option<RgbaImage> {
    let caps = sample.caps()?;
    let info = gst_video::VideoInfo::from_caps(caps).ok()?;
    let buffer = sample.buffer()?;
    let map = buffer.map_readable().ok()?;

    let width = info.width() as usize;
    let height = info.height() as usize;
    let stride = info.stride().first().copied()? as usize;
    let row_bytes = width * 4;
    if stride < row_bytes {
        return None;
    }

    let mut pixels = Vec::with_capacity(row_bytes * height);
    for row in map.as_slice().chunks(stride).take(height) {
        pixels.extend_from_slice(row.get(..row_bytes)?);
    }

    RgbaImage::from_raw(width as u32, height as u32, pixels)
}
