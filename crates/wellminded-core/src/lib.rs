pub mod ai;
pub mod camera;
pub mod config;
pub mod error;
pub mod frame;
pub mod landing;
pub mod reply;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use ai::{ChatBackend, VisionClient};
pub use camera::{CameraBackend, CameraKind, LiveFeed};
pub use config::Config;
pub use error::{CameraError, FrameError, SendError};
pub use frame::CapturedFrame;
pub use landing::Landing;
pub use reply::format_reply;
pub use session::{CameraRequest, CaptureSession, SendRequest, TickEvent};
pub use state::{ChatMessage, Sender, Transcript};
