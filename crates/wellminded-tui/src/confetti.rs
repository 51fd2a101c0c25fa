//! A one-shot confetti burst drawn over the video pane after a capture.
//!
//! Positions are pure functions of elapsed time, so the burst needs no
//! per-tick state and renders the same for the same instant.

use std::time::{Duration, Instant};

use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};

pub const PARTICLE_COUNT: usize = 100;
pub const SPREAD_DEGREES: f32 = 70.0;
/// Launch point as a fraction of the pane (x, y)
pub const ORIGIN: (f32, f32) = (0.36, 0.9);
pub const SCALAR: f32 = 2.0;
pub const LIFETIME: Duration = Duration::from_millis(2500);

/// Downward acceleration in pane heights per second squared
const GRAVITY: f32 = 1.1;
/// Velocity decay rate per second
const DRAG: f32 = 1.6;

const PALETTE: [Color; 5] = [
    Color::Rgb(161, 157, 251),
    Color::Rgb(138, 131, 209),
    Color::Rgb(206, 147, 216),
    Color::Rgb(255, 255, 255),
    Color::Rgb(255, 214, 102),
];

const GLYPHS: [&str; 4] = ["▪", "●", "◆", "✦"];

#[derive(Debug, Clone)]
pub struct Particle {
    vx: f32,
    vy: f32,
    pub color: Color,
    pub glyph: &'static str,
}

#[derive(Debug, Clone)]
pub struct ConfettiBurst {
    started: Instant,
    particles: Vec<Particle>,
}

impl ConfettiBurst {
    pub fn new(now: Instant) -> Self {
        Self::with_count(PARTICLE_COUNT, now)
    }

    pub fn with_count(count: usize, now: Instant) -> Self {
        let spread = SPREAD_DEGREES.to_radians();
        let particles = (0..count)
            .map(|i| {
                // Low-discrepancy sequences stand in for a random generator
                let u = fract(i as f32 * 0.618_034);
                let v = fract(i as f32 * 0.754_878 + 0.5);

                let angle = std::f32::consts::FRAC_PI_2 + (u - 0.5) * spread;
                let speed = (0.6 + 0.4 * v) * SCALAR * 0.5;

                Particle {
                    vx: speed * angle.cos(),
                    vy: -speed * angle.sin(),
                    color: PALETTE[i % PALETTE.len()],
                    glyph: GLYPHS[(i / PALETTE.len()) % GLYPHS.len()],
                }
            })
            .collect();

        Self { started: now, particles }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) >= LIFETIME
    }

    /// Position of `particle` in pane coordinates (0..1 is inside the pane).
    pub fn position(&self, particle: &Particle, now: Instant) -> (f32, f32) {
        let t = now.saturating_duration_since(self.started).as_secs_f32();
        let travelled = (1.0 - (-DRAG * t).exp()) / DRAG;
        let x = ORIGIN.0 + particle.vx * travelled;
        let y = ORIGIN.1 + particle.vy * travelled + 0.5 * GRAVITY * t * t;
        (x, y)
    }
}

fn fract(value: f32) -> f32 {
    value - value.floor()
}

/// Renders a burst at a given instant.
pub struct ConfettiView<'a> {
    burst: &'a ConfettiBurst,
    now: Instant,
}

impl<'a> ConfettiView<'a> {
    pub fn new(burst: &'a ConfettiBurst, now: Instant) -> Self {
        Self { burst, now }
    }
}

impl Widget for ConfettiView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() || self.burst.is_finished(self.now) {
            return;
        }

        for particle in self.burst.particles() {
            let (x, y) = self.burst.position(particle, self.now);
            if !(0.0..1.0).contains(&x) || !(0.0..1.0).contains(&y) {
                continue;
            }
            let col = area.x + (x * area.width as f32) as u16;
            let row = area.y + (y * area.height as f32) as u16;
            if let Some(cell) = buf.cell_mut((col, row)) {
                cell.set_symbol(particle.glyph).set_fg(particle.color);
            }
        }
    }
}
