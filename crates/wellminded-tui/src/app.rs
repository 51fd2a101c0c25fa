use std::sync::Arc;
use std::time::Instant;

use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use wellminded_core::{
    CameraBackend, CameraError, CameraRequest, CaptureSession, ChatBackend, Landing, LiveFeed,
    SendError, SendRequest, TickEvent,
};

use crate::confetti::ConfettiBurst;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Landing,
    Capture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub type CameraTask = JoinHandle<Result<LiveFeed, CameraError>>;
pub type SendTask = JoinHandle<Result<String, SendError>>;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,

    // Screens
    pub landing: Landing,
    pub session: CaptureSession,
    pub capture_entered_at: Option<Instant>,

    // Message input
    pub message_cursor: usize, // cursor position in the session message, in chars

    // Modal alert; blocks all other input until dismissed
    pub alert: Option<String>,

    // Camera
    pub feed: Option<LiveFeed>,
    pub camera_task: Option<(CameraRequest, CameraTask)>,
    pub confetti: Option<ConfettiBurst>,

    // Remote request
    pub send_task: Option<(SendRequest, SendTask)>,

    // Transcript scrolling
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Animation state
    pub animation_frame: u8,

    // Panel areas for mouse hit-testing (updated during render)
    pub video_area: Option<Rect>,
    pub chat_area: Option<Rect>,

    camera: Arc<dyn CameraBackend>,
    chat: Arc<dyn ChatBackend>,
}

impl App {
    pub fn new(camera: Arc<dyn CameraBackend>, chat: Arc<dyn ChatBackend>, now: Instant) -> Self {
        Self {
            should_quit: false,
            screen: Screen::Landing,
            input_mode: InputMode::Normal,
            landing: Landing::new(now),
            session: CaptureSession::new(),
            capture_entered_at: None,
            message_cursor: 0,
            alert: None,
            feed: None,
            camera_task: None,
            confetti: None,
            send_task: None,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            video_area: None,
            chat_area: None,
            camera,
            chat,
        }
    }

    pub fn camera_name(&self) -> &str {
        self.camera.name()
    }

    /// Route change landing -> capture. Happens once per run.
    pub fn enter_capture(&mut self, now: Instant) {
        if self.screen == Screen::Capture {
            return;
        }
        info!("entering capture screen");
        self.screen = Screen::Capture;
        self.capture_entered_at = Some(now);
        self.input_mode = InputMode::Normal;

        let request = self.session.enter();
        self.request_camera(request);
    }

    /// Ask for camera access off the UI task. A newer request replaces an
    /// outstanding one; its feed is discarded when it arrives.
    fn request_camera(&mut self, request: CameraRequest) {
        let camera = Arc::clone(&self.camera);
        debug!(camera = camera.name(), "requesting camera access");
        let handle = tokio::task::spawn_blocking(move || camera.open());
        self.camera_task = Some((request, handle));
    }

    pub fn tick(&mut self, now: Instant) {
        self.animation_frame = (self.animation_frame + 1) % 12;

        match self.screen {
            Screen::Landing => {
                if self.landing.tick(now) {
                    self.enter_capture(now);
                }
            }
            Screen::Capture => {
                if let Some(TickEvent::FlashEnded) = self.session.tick(now) {
                    // The still now replaces the video surface
                    self.feed = None;
                    self.confetti = Some(ConfettiBurst::new(now));
                }
            }
        }

        if self.confetti.as_ref().is_some_and(|c| c.is_finished(now)) {
            self.confetti = None;
        }
    }

    /// Snapshot the live feed. Without a bound feed there is no surface to
    /// read from and nothing happens.
    pub fn capture(&mut self, now: Instant) {
        let Some(feed) = &self.feed else {
            debug!("capture ignored, no video surface");
            return;
        };

        let session = &mut self.session;
        match feed.with_latest(|frame| session.capture(frame, now)) {
            Ok(true) => info!(source = feed.source(), "frame captured"),
            Ok(false) => {}
            Err(e) => error!(error = %e, "failed to encode captured frame"),
        }
    }

    pub fn retry(&mut self) {
        if self.session.is_capturing() && self.session.captured().is_none() {
            return;
        }
        self.confetti = None;
        let request = self.session.retry();
        self.request_camera(request);
    }

    pub fn send(&mut self) {
        if self.send_task.is_some() {
            return;
        }

        match self.session.prepare_send() {
            Ok(request) => {
                info!(img_len = request.img.len(), text_len = request.text.len(), "sending image and text");
                let future = self.chat.send(&request);
                self.send_task = Some((request, tokio::spawn(future)));
                self.input_mode = InputMode::Normal;
                self.scroll_chat_to_bottom();
            }
            Err(e) if e.is_precondition() => {
                match &e {
                    SendError::InvalidPayload(len) => error!(payload_len = len, "invalid image payload"),
                    _ => warn!(error = %e, "send rejected"),
                }
                self.alert = Some(e.alert().to_string());
            }
            Err(e) => {
                error!(error = %e, "failed to prepare request");
                self.alert = Some(e.alert().to_string());
            }
        }
    }

    /// Settle background work that has completed since the last call.
    pub async fn poll_tasks(&mut self) {
        if self.camera_task.as_ref().is_some_and(|(_, handle)| handle.is_finished()) {
            if let Some((request, handle)) = self.camera_task.take() {
                match handle.await {
                    Ok(Ok(feed)) => self.bind_feed(request, feed),
                    Ok(Err(e)) => error!(error = %e, "camera access failed"),
                    Err(e) => error!(error = %e, "camera task failed"),
                }
            }
        }

        if self.send_task.as_ref().is_some_and(|(_, handle)| handle.is_finished()) {
            if let Some((request, handle)) = self.send_task.take() {
                let result = match handle.await {
                    Ok(result) => result,
                    Err(e) => Err(SendError::Task(e.to_string())),
                };
                self.settle_send(&request, result);
            }
        }
    }

    fn bind_feed(&mut self, request: CameraRequest, feed: LiveFeed) {
        if self.session.accepts_feed(request) {
            info!(source = feed.source(), "camera feed bound");
            self.feed = Some(feed);
        } else {
            debug!(source = feed.source(), "discarding stale camera feed");
        }
    }

    fn settle_send(&mut self, request: &SendRequest, result: Result<String, SendError>) {
        match self.session.finish_send(request, result) {
            Ok(()) => {
                self.message_cursor = 0;
                self.scroll_chat_to_bottom();
            }
            Err(e) => {
                error!(error = %e, "failed to send image and text");
                self.alert = Some(e.alert().to_string());
            }
        }
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_chat_scroll());
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = self.max_chat_scroll();
    }

    fn max_chat_scroll(&self) -> u16 {
        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };
        self.chat_line_count().saturating_sub(visible_height)
    }

    /// Rendered height of the transcript, matching the layout in `ui`.
    fn chat_line_count(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 { self.chat_width as usize } else { 50 };

        let mut total_lines: usize = 0;
        for message in self.session.transcript() {
            total_lines = total_lines.saturating_add(1); // "You" / "Emoting" label
            for line in message.text.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                total_lines = total_lines.saturating_add(char_count / wrap_width + 1);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.session.in_flight() {
            total_lines = total_lines.saturating_add(2); // "Emoting" + spinner
        }
        total_lines.min(u16::MAX as usize) as u16
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use futures_util::future::BoxFuture;
    use image::{Rgba, RgbaImage};
    use wellminded_core::camera::FrameSlot;
    use wellminded_core::session::FLASH_DURATION;
    use wellminded_core::landing::EXIT_DELAY;

    /// Camera whose feed always shows the same frame
    pub struct FixedCamera {
        frame: Option<RgbaImage>,
    }

    impl FixedCamera {
        pub fn lavender() -> Self {
            Self {
                frame: Some(RgbaImage::from_pixel(8, 6, Rgba([161, 157, 251, 255]))),
            }
        }
    }

    impl CameraBackend for FixedCamera {
        fn name(&self) -> &str {
            "fixed"
        }

        fn open(&self) -> Result<LiveFeed, CameraError> {
            let slot: FrameSlot = Arc::new(Mutex::new(self.frame.clone()));
            Ok(LiveFeed::new("fixed", slot, || {}))
        }
    }

    /// Chat backend that replies with a canned answer or fails
    pub struct CannedChat {
        pub reply: Option<String>,
        pub requests: Mutex<Vec<SendRequest>>,
    }

    impl CannedChat {
        pub fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(reply.to_string()),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    impl ChatBackend for CannedChat {
        fn send(&self, request: &SendRequest) -> BoxFuture<'static, Result<String, SendError>> {
            self.requests.lock().unwrap().push(request.clone());
            let reply = self.reply.clone();
            Box::pin(async move {
                reply.ok_or_else(|| SendError::Task("backend unavailable".to_string()))
            })
        }
    }

    pub fn test_app(chat: Arc<dyn ChatBackend>) -> App {
        App::new(Arc::new(FixedCamera::lavender()), chat, Instant::now())
    }

    /// Poll until outstanding tasks have settled.
    pub async fn settle(app: &mut App) {
        for _ in 0..200 {
            app.poll_tasks().await;
            if app.camera_task.is_none() && app.send_task.is_none() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("background tasks did not settle");
    }

    /// App on the capture screen with a still captured and the flash over.
    pub async fn captured_app(chat: Arc<dyn ChatBackend>) -> App {
        let mut app = test_app(chat);
        let t0 = Instant::now();
        app.enter_capture(t0);
        settle(&mut app).await;
        app.capture(t0);
        app.tick(t0 + FLASH_DURATION);
        app
    }

    #[tokio::test]
    async fn test_landing_hands_off_after_delay() {
        let mut app = test_app(CannedChat::replying("hi"));
        let t0 = Instant::now();
        app.landing.start(t0);

        app.tick(t0 + Duration::from_millis(500));
        assert_eq!(app.screen, Screen::Landing);

        app.tick(t0 + EXIT_DELAY);
        assert_eq!(app.screen, Screen::Capture);
        assert!(app.camera_task.is_some());

        settle(&mut app).await;
        assert!(app.feed.is_some());
    }

    #[tokio::test]
    async fn test_capture_flash_and_confetti() {
        let mut app = test_app(CannedChat::replying("hi"));
        let t0 = Instant::now();
        app.enter_capture(t0);
        settle(&mut app).await;

        app.capture(t0);
        assert!(app.session.is_flashing());
        assert!(app.session.is_capturing());
        assert!(app.feed.is_some());

        app.tick(t0 + FLASH_DURATION);
        assert!(!app.session.is_flashing());
        assert!(!app.session.is_capturing());
        assert!(app.feed.is_none());
        assert!(app.confetti.is_some());
        assert!(app.session.captured().unwrap().preview().is_some());
    }

    #[tokio::test]
    async fn test_capture_without_feed_is_ignored() {
        let mut app = test_app(CannedChat::replying("hi"));
        app.enter_capture(Instant::now());
        app.capture(Instant::now());
        assert!(app.session.captured().is_none());
        settle(&mut app).await;
    }

    #[tokio::test]
    async fn test_retry_rebinds_camera() {
        let mut app = captured_app(CannedChat::replying("hi")).await;
        app.retry();
        assert!(app.session.captured().is_none());
        assert!(app.session.is_capturing());
        assert!(app.confetti.is_none());

        settle(&mut app).await;
        assert!(app.feed.is_some());
    }

    #[tokio::test]
    async fn test_send_appends_exchange() {
        let chat = CannedChat::replying("**Nice** smile");
        let mut app = captured_app(chat.clone()).await;
        app.session.message_mut().push_str("feeling good");
        app.message_cursor = 12;

        app.send();
        assert!(app.session.in_flight());
        settle(&mut app).await;

        assert!(!app.session.in_flight());
        assert!(app.alert.is_none());
        assert_eq!(app.session.transcript().len(), 2);
        assert_eq!(app.session.transcript().messages()[1].text, "Nice smile");
        assert_eq!(app.session.message(), "");
        assert_eq!(app.message_cursor, 0);
        assert_eq!(chat.requests.lock().unwrap()[0].text, "feeling good");
    }

    #[tokio::test]
    async fn test_send_without_frame_alerts() {
        let chat = CannedChat::replying("hi");
        let mut app = test_app(chat.clone());
        app.enter_capture(Instant::now());
        app.session.message_mut().push_str("hello");

        app.send();
        assert!(app.send_task.is_none());
        assert_eq!(
            app.alert.as_deref(),
            Some("Capture an image and write a message before sending.")
        );
        assert!(chat.requests.lock().unwrap().is_empty());
        settle(&mut app).await;
    }

    #[tokio::test]
    async fn test_failed_send_alerts_and_keeps_message() {
        let mut app = captured_app(CannedChat::failing()).await;
        app.session.message_mut().push_str("hello");

        app.send();
        settle(&mut app).await;

        assert!(app.session.transcript().is_empty());
        assert!(!app.session.in_flight());
        assert_eq!(app.session.message(), "hello");
        assert_eq!(
            app.alert.as_deref(),
            Some("There was an error processing the request.")
        );
    }

    #[tokio::test]
    async fn test_second_send_ignored_while_in_flight() {
        let chat = CannedChat::replying("ok");
        let mut app = captured_app(chat.clone()).await;
        app.session.message_mut().push_str("hello");

        app.send();
        app.send();
        settle(&mut app).await;

        assert_eq!(chat.requests.lock().unwrap().len(), 1);
        assert_eq!(app.session.transcript().len(), 2);
    }

    /// Camera whose open always fails
    struct BrokenCamera;

    impl CameraBackend for BrokenCamera {
        fn name(&self) -> &str {
            "broken"
        }

        fn open(&self) -> Result<LiveFeed, CameraError> {
            Err(CameraError::Unavailable("device busy".to_string()))
        }
    }

    #[tokio::test]
    async fn test_camera_failure_is_only_logged() {
        let mut app = App::new(Arc::new(BrokenCamera), CannedChat::replying("hi"), Instant::now());
        let t0 = Instant::now();
        app.enter_capture(t0);
        settle(&mut app).await;

        assert!(app.feed.is_none());
        assert!(app.alert.is_none());

        app.capture(t0);
        assert!(app.session.captured().is_none());
        assert!(app.alert.is_none());
    }

    #[tokio::test]
    async fn test_very_long_reply_keeps_scroll_in_range() {
        let mut app = captured_app(CannedChat::replying(&"-".repeat(70_000))).await;
        app.session.message_mut().push_str("hello");

        app.send();
        settle(&mut app).await;

        assert_eq!(app.session.transcript().len(), 2);
        assert_eq!(app.chat_line_count(), u16::MAX);
        assert_eq!(app.chat_scroll, u16::MAX - 20);

        app.scroll_chat_down(10);
        assert_eq!(app.chat_scroll, u16::MAX - 20);
    }
}
