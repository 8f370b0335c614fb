//=========================================================================
// Paint Delivery
//=========================================================================
//
// Frames travel from the engine to the host through a per-browser gate.
//
// Architecture:
// ```text
//   Engine thread               Bridge                    Host
//   ─────────────               ──────                    ────
//   PaintSink::deliver() ──►  PaintGate (Mutex) ──►  PaintHandler::on_paint()
//                                   ▲
//   Browser::destroy() ── close() ──┘   (waits for an in-flight paint)
// ```
//
// Once a gate is closed no further frame reaches the host handler, even
// if the engine still holds a sink. Handlers run on whatever thread the
// engine paints from and must not block or call back into the same
// browser's `destroy`.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

//=== External Crates =====================================================

use log::{error, trace};

//=== Internal Imports ====================================================

use super::BrowserId;

/// Bytes per pixel in every frame (BGRA8).
pub const BYTES_PER_PIXEL: usize = 4;

//=== Frame ===============================================================

/// One rendered frame, borrowed from the engine for the duration of a
/// paint callback.
///
/// Pixels are packed BGRA8 rows with a stride of `width * 4` bytes.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    width: u32,
    height: u32,
    buffer: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Wraps a pixel buffer. Returns `None` when the buffer length does not
    /// match `width * height * 4`.
    pub fn new(width: u32, height: u32, buffer: &'a [u8]) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(BYTES_PER_PIXEL)?;
        (buffer.len() == expected).then_some(Self { width, height, buffer })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    pub fn buffer_length(&self) -> usize {
        self.buffer.len()
    }

    pub fn stride(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    /// BGRA value of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.stride() + x as usize * BYTES_PER_PIXEL;
        let px = &self.buffer[offset..offset + BYTES_PER_PIXEL];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Copies the frame out of the engine-owned buffer.
    pub fn to_owned_frame(&self) -> OwnedFrame {
        OwnedFrame {
            width: self.width,
            height: self.height,
            pixels: self.buffer.to_vec(),
        }
    }
}

//=== OwnedFrame ==========================================================

/// A frame copied out of a paint callback so it can outlive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl OwnedFrame {
    /// Borrows the copy as a [`Frame`].
    pub fn as_frame(&self) -> Option<Frame<'_>> {
        Frame::new(self.width, self.height, &self.pixels)
    }
}

//=== PaintHandler ========================================================

/// Receives frames for one browser.
///
/// `on_paint` may be called from an engine thread other than the one that
/// created the browser, concurrently with the host's own work. The frame
/// buffer is only valid for the duration of the call; copy it out with
/// [`Frame::to_owned_frame`] if it must be kept.
pub trait PaintHandler: Send + Sync {
    fn on_paint(&self, frame: &Frame<'_>);
}

impl<F> PaintHandler for F
where
    F: Fn(&Frame<'_>) + Send + Sync,
{
    fn on_paint(&self, frame: &Frame<'_>) {
        self(frame)
    }
}

//=== PaintGate ===========================================================

/// Holds a browser's paint handler until the browser is destroyed.
pub(crate) struct PaintGate {
    handler: Mutex<Option<Box<dyn PaintHandler>>>,
    delivered: AtomicU64,
}

impl PaintGate {
    pub(crate) fn new(handler: Option<Box<dyn PaintHandler>>) -> Arc<Self> {
        Arc::new(Self {
            handler: Mutex::new(handler),
            delivered: AtomicU64::new(0),
        })
    }

    /// Drops the handler. Blocks until a paint running on another thread
    /// has returned.
    pub(crate) fn close(&self) {
        let handler = self.lock().take();
        drop(handler);
    }

    pub(crate) fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    pub(crate) fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    fn deliver(&self, browser: BrowserId, frame: &Frame<'_>) -> bool {
        let guard = self.lock();
        let Some(handler) = guard.as_ref() else {
            trace!(target: "paint", "Dropping frame for closed browser {}", browser);
            return false;
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.on_paint(frame)));
        if outcome.is_err() {
            error!(target: "paint", "Paint handler for browser {} panicked", browser);
            return false;
        }

        self.delivered.fetch_add(1, Ordering::Relaxed);
        true
    }

    fn lock(&self) -> MutexGuard<'_, Option<Box<dyn PaintHandler>>> {
        self.handler.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

//=== PaintSink ===========================================================

/// Engine-side end of a browser's paint path.
///
/// Engines keep a sink per browser and call [`PaintSink::deliver`] whenever
/// a frame is ready. Cloning is cheap; every clone feeds the same gate.
#[derive(Clone)]
pub struct PaintSink {
    browser: BrowserId,
    gate: Arc<PaintGate>,
}

impl PaintSink {
    pub(crate) fn new(browser: BrowserId, gate: Arc<PaintGate>) -> Self {
        Self { browser, gate }
    }

    /// Sink whose frames go straight to `handler`, for driving an engine
    /// without a [`crate::Browser`] around it.
    pub fn detached(browser: BrowserId, handler: impl PaintHandler + 'static) -> Self {
        Self::new(browser, PaintGate::new(Some(Box::new(handler))))
    }

    /// Browser this sink delivers to.
    pub fn browser(&self) -> BrowserId {
        self.browser
    }

    /// Hands `frame` to the host. Returns `false` if the browser was
    /// destroyed (or its handler failed) and the frame was dropped.
    pub fn deliver(&self, frame: &Frame<'_>) -> bool {
        self.gate.deliver(self.browser, frame)
    }

    /// Returns `false` once the browser has been destroyed.
    pub fn is_open(&self) -> bool {
        self.gate.is_open()
    }
}

impl std::fmt::Debug for PaintSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaintSink")
            .field("browser", &self.browser)
            .field("open", &self.is_open())
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::Duration;

    //--- Test Helpers -----------------------------------------------------

    fn counting_gate() -> (Arc<PaintGate>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let gate = PaintGate::new(Some(Box::new(move |_: &Frame<'_>| {
            seen.fetch_add(1, Ordering::SeqCst);
        })));
        (gate, count)
    }

    //=====================================================================
    // Frame Tests
    //=====================================================================

    #[test]
    fn frame_rejects_mismatched_buffer() {
        let pixels = vec![0u8; 2 * 2 * 4];
        assert!(Frame::new(2, 2, &pixels).is_some());
        assert!(Frame::new(3, 2, &pixels).is_none());
        assert!(Frame::new(2, 2, &pixels[..15]).is_none());
    }

    #[test]
    fn frame_pixel_lookup_uses_stride() {
        let mut pixels = vec![0u8; 3 * 2 * 4];
        let offset = 3 * 4 + 2 * 4;
        pixels[offset..offset + 4].copy_from_slice(&[1, 2, 3, 4]);

        let frame = Frame::new(3, 2, &pixels).unwrap();
        assert_eq!(frame.stride(), 12);
        assert_eq!(frame.pixel(2, 1), Some([1, 2, 3, 4]));
        assert_eq!(frame.pixel(3, 0), None);
    }

    #[test]
    fn owned_frame_round_trips_to_borrowed() {
        let pixels = vec![7u8; 4];
        let owned = Frame::new(1, 1, &pixels).unwrap().to_owned_frame();
        assert_eq!(owned.as_frame().unwrap().pixel(0, 0), Some([7, 7, 7, 7]));
    }

    //=====================================================================
    // Gate Tests
    //=====================================================================

    #[test]
    fn sink_delivers_until_closed() {
        let (gate, count) = counting_gate();
        let sink = PaintSink::new(BrowserId::new(1), Arc::clone(&gate));
        let pixels = vec![0u8; 4];
        let frame = Frame::new(1, 1, &pixels).unwrap();

        assert!(sink.deliver(&frame));
        gate.close();
        assert!(!sink.deliver(&frame), "Closed gate must drop frames");

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(gate.delivered(), 1);
        assert!(!sink.is_open());
    }

    #[test]
    fn gate_without_handler_drops_frames() {
        let gate = PaintGate::new(None);
        let sink = PaintSink::new(BrowserId::new(2), gate);
        let pixels = vec![0u8; 4];
        assert!(!sink.deliver(&Frame::new(1, 1, &pixels).unwrap()));
    }

    #[test]
    fn panicking_handler_is_contained() {
        let gate = PaintGate::new(Some(Box::new(|_: &Frame<'_>| panic!("host bug"))));
        let sink = PaintSink::new(BrowserId::new(3), Arc::clone(&gate));
        let pixels = vec![0u8; 4];

        assert!(!sink.deliver(&Frame::new(1, 1, &pixels).unwrap()));
        assert!(gate.is_open(), "Gate stays usable after a handler panic");
    }

    #[test]
    fn close_waits_for_in_flight_paint() {
        let finished = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&finished);
        let (entered_tx, entered_rx) = crossbeam_channel::bounded(1);
        let gate = PaintGate::new(Some(Box::new(move |_: &Frame<'_>| {
            let _ = entered_tx.send(());
            thread::sleep(Duration::from_millis(50));
            flag.store(1, Ordering::SeqCst);
        })));
        let sink = PaintSink::new(BrowserId::new(4), Arc::clone(&gate));

        let painter = thread::spawn(move || {
            let pixels = vec![0u8; 4];
            sink.deliver(&Frame::new(1, 1, &pixels).unwrap())
        });

        entered_rx.recv().unwrap();
        gate.close();

        assert_eq!(finished.load(Ordering::SeqCst), 1, "close() returned mid-paint");
        assert!(painter.join().unwrap());
    }
}
