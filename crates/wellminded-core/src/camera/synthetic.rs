use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use image::{Rgba, RgbaImage};

use crate::camera::{slot_with, CameraBackend, LiveFeed};
use crate::error::CameraError;

/// Animated test pattern for machines without a camera.
#[derive(Debug, Clone)]
pub struct SyntheticCamera {
    pub width: u32,
    pub height: u32,
    pub frame_interval: Duration,
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            frame_interval: Duration::from_millis(66), // ~15 fps
        }
    }
}

impl CameraBackend for SyntheticCamera {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn open(&self) -> Result<LiveFeed, CameraError> {
        let (width, height, interval) = (self.width, self.height, self.frame_interval);

        // First frame is ready before the feed is handed out
        let slot = slot_with(Some(test_pattern(width, height, 0)));
        let running = Arc::new(AtomicBool::new(true));

        let producer_slot = Arc::clone(&slot);
        let producer_running = Arc::clone(&running);
        thread::Builder::new()
            .name("synthetic-camera".to_string())
            .spawn(move || {
                let mut index: u32 = 1;
                while producer_running.load(Ordering::Relaxed) {
                    thread::sleep(interval);
                    let frame = test_pattern(width, height, index);
                    if let Ok(mut latest) = producer_slot.lock() {
                        *latest = Some(frame);
                    }
                    index = index.wrapping_add(1);
                }
            })
            .map_err(|e| CameraError::Pipeline(format!("failed to start generator thread: {}", e)))?;

        tracing::info!(width, height, "synthetic camera opened");
        Ok(LiveFeed::new("synthetic", slot, move || {
            running.store(false, Ordering::Relaxed);
        }))
    }
}

/// Diagonal lavender gradient with a bright bar sweeping left to right.
pub fn test_pattern(width: u32, height: u32, index: u32) -> RgbaImage {
    let bar_width = (width / 12).max(1);
    let bar_x = if width == 0 { 0 } else { (index * 4) % width };

    RgbaImage::from_fn(width, height, |x, y| {
        if x >= bar_x && x < bar_x + bar_width {
            return Rgba([255, 255, 255, 255]);
        }
        let t = (x + y) as f32 / (width + height).max(1) as f32;
        let r = (161.0 * (1.0 - t) + 40.0 * t) as u8;
        let g = (157.0 * (1.0 - t) + 44.0 * t) as u8;
        let b = (251.0 * (1.0 - t) + 90.0 * t) as u8;
        Rgba([r, g, b, 255])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_frame_available_immediately() {
        let camera = SyntheticCamera {
            width: 16,
            height: 8,
            frame_interval: Duration::from_millis(5),
        };
        let feed = camera.open().unwrap();
        assert_eq!(feed.latest_frame().map(|f| f.dimensions()), Some((16, 8)));
    }

    #[test]
    fn test_frames_keep_coming_until_dropped() {
        let camera = SyntheticCamera {
            width: 48,
            height: 8,
            frame_interval: Duration::from_millis(5),
        };
        let feed = camera.open().unwrap();
        let first = feed.latest_frame().unwrap();

        let mut changed = false;
        for _ in 0..100 {
            thread::sleep(Duration::from_millis(5));
            if feed.latest_frame().as_ref() != Some(&first) {
                changed = true;
                break;
            }
        }
        assert!(changed, "generator never published a new frame");
    }

    #[test]
    fn test_pattern_bar_moves() {
        let a = test_pattern(48, 4, 0);
        let b = test_pattern(48, 4, 3);
        assert_eq!(a.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
        assert_ne!(a, b);
    }
}
