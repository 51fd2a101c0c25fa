//! Landing screen state: entrance animation, the sticker icon menu and the
//! delayed hand-off to the capture screen.

use std::time::{Duration, Instant};

use tracing::info;

/// Time the exit animation gets before the route changes
pub const EXIT_DELAY: Duration = Duration::from_secs(1);

/// Duration of the icon tray expand/collapse animation
pub const MENU_ANIMATION: Duration = Duration::from_millis(300);

/// Duration of the entrance animation
pub const ENTRANCE_ANIMATION: Duration = Duration::from_millis(700);

#[derive(Debug, Clone)]
pub struct Landing {
    shown_at: Instant,
    menu_open: bool,
    menu_toggled_at: Option<Instant>,
    leaving_since: Option<Instant>,
    navigated: bool,
}

impl Landing {
    pub fn new(now: Instant) -> Self {
        Self {
            shown_at: now,
            menu_open: false,
            menu_toggled_at: None,
            leaving_since: None,
            navigated: false,
        }
    }

    pub fn toggle_menu(&mut self, now: Instant) {
        self.menu_open = !self.menu_open;
        self.menu_toggled_at = Some(now);
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu_open
    }

    /// Start the exit animation. Pressing start again does not restart it.
    pub fn start(&mut self, now: Instant) {
        if self.leaving_since.is_none() {
            info!("leaving landing screen");
            self.leaving_since = Some(now);
        }
    }

    pub fn is_leaving(&self) -> bool {
        self.leaving_since.is_some()
    }

    /// Returns `true` exactly once: on the first tick at least
    /// [`EXIT_DELAY`] after [`start`](Self::start).
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.leaving_since {
            Some(since) if !self.navigated && now.duration_since(since) >= EXIT_DELAY => {
                self.navigated = true;
                true
            }
            _ => false,
        }
    }

    /// 0.0 (just shown) to 1.0 (fully in).
    pub fn entrance_progress(&self, now: Instant) -> f32 {
        progress(now.saturating_duration_since(self.shown_at), ENTRANCE_ANIMATION)
    }

    /// 0.0 (still in place) to 1.0 (gone).
    pub fn exit_progress(&self, now: Instant) -> f32 {
        match self.leaving_since {
            Some(since) => progress(now.saturating_duration_since(since), EXIT_DELAY),
            None => 0.0,
        }
    }

    /// 0.0 (tray hidden) to 1.0 (tray fully out), eased.
    pub fn menu_progress(&self, now: Instant) -> f32 {
        let raw = match self.menu_toggled_at {
            Some(at) => progress(now.saturating_duration_since(at), MENU_ANIMATION),
            None => 1.0,
        };
        let eased = ease_out(raw);
        if self.menu_open {
            eased
        } else {
            1.0 - eased
        }
    }
}

fn progress(elapsed: Duration, total: Duration) -> f32 {
    if total.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / total.as_secs_f32()).clamp(0.0, 1.0)
}

fn ease_out(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}
