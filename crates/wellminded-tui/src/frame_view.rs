use image::RgbaImage;
use ratatui::{buffer::Buffer, layout::Rect, style::Color, widgets::Widget};

/// Draws an RGBA image with upper-half-block cells: the foreground is the
/// top pixel, the background the bottom one. Aspect ratio is preserved and
/// the picture is centred in the area.
pub struct FrameView<'a> {
    image: &'a RgbaImage,
}

impl<'a> FrameView<'a> {
    pub fn new(image: &'a RgbaImage) -> Self {
        Self { image }
    }
}

impl Widget for FrameView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (img_w, img_h) = self.image.dimensions();
        if area.is_empty() || img_w == 0 || img_h == 0 {
            return;
        }

        // One column and two pixel rows per cell
        let target_w = area.width as f32;
        let target_h = area.height as f32 * 2.0;
        let scale = (target_w / img_w as f32).min(target_h / img_h as f32);

        let draw_w = ((img_w as f32 * scale).round() as u16).clamp(1, area.width);
        let draw_rows = ((img_h as f32 * scale).round() as u32).max(1);
        let draw_h = (draw_rows.div_ceil(2) as u16).clamp(1, area.height);

        let x0 = area.x + (area.width - draw_w) / 2;
        let y0 = area.y + (area.height - draw_h) / 2;

        for cy in 0..draw_h {
            for cx in 0..draw_w {
                let top = self.sample(cx as u32, cy as u32 * 2, draw_w as u32, draw_rows);
                let bottom = self.sample(cx as u32, cy as u32 * 2 + 1, draw_w as u32, draw_rows);
                if let Some(cell) = buf.cell_mut((x0 + cx, y0 + cy)) {
                    cell.set_symbol("▀").set_fg(top).set_bg(bottom);
                }
            }
        }
    }
}

impl FrameView<'_> {
    /// Nearest-neighbour lookup from the scaled grid back into the image.
    fn sample(&self, px: u32, py: u32, grid_w: u32, grid_h: u32) -> Color {
        let (img_w, img_h) = self.image.dimensions();
        let sx = ((px as u64 * img_w as u64) / grid_w.max(1) as u64).min(img_w as u64 - 1) as u32;
        let sy = ((py as u64 * img_h as u64) / grid_h.max(1) as u64).min(img_h as u64 - 1) as u32;
        let [r, g, b, _] = self.image.get_pixel(sx, sy).0;
        Color::Rgb(r, g, b)
    }
}
