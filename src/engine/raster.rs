//=========================================================================
// Placeholder Raster
//=========================================================================
//
// Software rasterizer for the headless engine. Produces BGRA frames that
// make view state visible without a real web renderer:
//
//   background  ← colour hashed from the URL (white for about:blank)
//   stripes     ← scroll position (one darker band every 64 px)
//   border      ← 2 px when the view has focus
//   marker      ← 5×5 square at the cursor
//
//=========================================================================

//=== Internal Imports ====================================================

use crate::core::paint::BYTES_PER_PIXEL;

/// BGRA colour.
pub(crate) type Bgra = [u8; 4];

const WHITE: Bgra = [0xFF, 0xFF, 0xFF, 0xFF];
const FOCUS: Bgra = [0xE0, 0x90, 0x20, 0xFF];
const CURSOR: Bgra = [0x20, 0x20, 0x20, 0xFF];

const STRIPE_PERIOD: i64 = 64;
const STRIPE_HEIGHT: i64 = 8;
const FOCUS_BORDER: u32 = 2;
const CURSOR_RADIUS: i64 = 2;

//=== Scene ===============================================================

/// Snapshot of a view, in physical pixels.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Scene {
    pub width: u32,
    pub height: u32,
    pub background: Bgra,
    pub focused: bool,
    pub cursor: Option<(i64, i64)>,
    pub scroll_y: i64,
}

//=== Rendering ===========================================================

/// Renders `scene` into a fresh `width * height * 4` buffer.
///
/// Returns `None` when the buffer size overflows `usize`.
pub(crate) fn render(scene: &Scene) -> Option<Vec<u8>> {
    let width = scene.width as usize;
    let height = scene.height as usize;
    let length = width.checked_mul(height)?.checked_mul(BYTES_PER_PIXEL)?;
    let mut pixels = vec![0u8; length];

    let stripe = darken(scene.background);
    for y in 0..height {
        let band = (y as i64 + scene.scroll_y).rem_euclid(STRIPE_PERIOD);
        let color = if band < STRIPE_HEIGHT { stripe } else { scene.background };
        let row = &mut pixels[y * width * BYTES_PER_PIXEL..(y + 1) * width * BYTES_PER_PIXEL];
        for px in row.chunks_exact_mut(BYTES_PER_PIXEL) {
            px.copy_from_slice(&color);
        }
    }

    if scene.focused {
        draw_border(&mut pixels, scene.width, scene.height, FOCUS);
    }

    if let Some((cx, cy)) = scene.cursor {
        fill_rect(
            &mut pixels,
            scene.width,
            scene.height,
            (cx - CURSOR_RADIUS, cy - CURSOR_RADIUS),
            (cx + CURSOR_RADIUS, cy + CURSOR_RADIUS),
            CURSOR,
        );
    }

    Some(pixels)
}

/// Background colour for `url`: FNV-1a hash folded into a mid-range BGRA.
pub(crate) fn url_color(url: &str) -> Bgra {
    if url.is_empty() || url == "about:blank" {
        return WHITE;
    }

    let mut hash: u32 = 0x811C_9DC5;
    for byte in url.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }

    let channel = |shift: u32| 0x40 + ((hash >> shift) & 0xFF) as u8 / 2;
    [channel(0), channel(8), channel(16), 0xFF]
}

//--- Internal Helpers ----------------------------------------------------

fn darken(color: Bgra) -> Bgra {
    [color[0] / 4 * 3, color[1] / 4 * 3, color[2] / 4 * 3, color[3]]
}

fn draw_border(pixels: &mut [u8], width: u32, height: u32, color: Bgra) {
    let w = width as i64;
    let h = height as i64;
    let b = FOCUS_BORDER as i64;
    fill_rect(pixels, width, height, (0, 0), (w - 1, b - 1), color);
    fill_rect(pixels, width, height, (0, h - b), (w - 1, h - 1), color);
    fill_rect(pixels, width, height, (0, 0), (b - 1, h - 1), color);
    fill_rect(pixels, width, height, (w - b, 0), (w - 1, h - 1), color);
}

/// Fills the inclusive rectangle `from..=to`, clipped to the frame.
fn fill_rect(
    pixels: &mut [u8],
    width: u32,
    height: u32,
    from: (i64, i64),
    to: (i64, i64),
    color: Bgra,
) {
    let x0 = from.0.max(0);
    let y0 = from.1.max(0);
    let x1 = to.0.min(width as i64 - 1);
    let y1 = to.1.min(height as i64 - 1);
    if x0 > x1 || y0 > y1 {
        return;
    }

    let stride = width as usize * BYTES_PER_PIXEL;
    for y in y0..=y1 {
        let start = y as usize * stride + x0 as usize * BYTES_PER_PIXEL;
        let end = y as usize * stride + (x1 as usize + 1) * BYTES_PER_PIXEL;
        for px in pixels[start..end].chunks_exact_mut(BYTES_PER_PIXEL) {
            px.copy_from_slice(&color);
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::paint::Frame;

    fn scene(width: u32, height: u32) -> Scene {
        Scene {
            width,
            height,
            background: WHITE,
            focused: false,
            cursor: None,
            scroll_y: STRIPE_HEIGHT,
        }
    }

    #[test]
    fn buffer_matches_dimensions() {
        let pixels = render(&scene(10, 7)).unwrap();
        assert_eq!(pixels.len(), 10 * 7 * 4);
        assert!(Frame::new(10, 7, &pixels).is_some());
    }

    #[test]
    fn overflowing_buffer_is_refused() {
        let mut s = scene(1, 1);
        s.width = u32::MAX;
        s.height = u32::MAX;
        assert!(render(&s).is_none());
    }

    #[test]
    fn blank_urls_are_white() {
        assert_eq!(url_color(""), WHITE);
        assert_eq!(url_color("about:blank"), WHITE);
    }

    #[test]
    fn url_colors_are_stable_and_distinct() {
        let a = url_color("https://example.com/");
        assert_eq!(a, url_color("https://example.com/"));
        assert_ne!(a, url_color("https://example.org/"));
        assert_eq!(a[3], 0xFF, "Frames are opaque");
    }

    #[test]
    fn focus_draws_border() {
        let mut s = scene(8, 8);
        s.focused = true;
        let pixels = render(&s).unwrap();
        let frame = Frame::new(8, 8, &pixels).unwrap();

        assert_eq!(frame.pixel(0, 0), Some(FOCUS));
        assert_eq!(frame.pixel(7, 7), Some(FOCUS));
        assert_eq!(frame.pixel(4, 4), Some(WHITE));
    }

    #[test]
    fn cursor_marker_is_clipped() {
        let mut s = scene(4, 4);
        s.cursor = Some((0, 0));
        let pixels = render(&s).unwrap();
        let frame = Frame::new(4, 4, &pixels).unwrap();

        assert_eq!(frame.pixel(0, 0), Some(CURSOR));
        assert_eq!(frame.pixel(2, 2), Some(CURSOR));
        assert_eq!(frame.pixel(3, 3), Some(WHITE));
    }

    #[test]
    fn scroll_moves_stripes() {
        let mut s = scene(1, STRIPE_PERIOD as u32);
        s.scroll_y = 0;
        let top = render(&s).unwrap();
        assert_eq!(Frame::new(1, 64, &top).unwrap().pixel(0, 0), Some(darken(WHITE)));

        s.scroll_y = STRIPE_HEIGHT;
        let scrolled = render(&s).unwrap();
        assert_eq!(Frame::new(1, 64, &scrolled).unwrap().pixel(0, 0), Some(WHITE));
    }
}
