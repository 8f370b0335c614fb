//=========================================================================
// Engine Seam
//
// Contract between the bridge and an embedded browser engine.
//
// The bridge owns lifecycle bookkeeping, handles, paint gating and the C
// surface; everything a real browser does (layout, JS, networking,
// compositing) lives behind these two traits.
//
// Architecture:
// ```text
//   runtime ──► Engine            (one per process)
//                 └─ create_browser() ──► EngineBrowser  (one per Browser)
//                                             │
//                         PaintSink ◄─────────┘  frames, any thread
// ```
//
// Implementations:
// - `headless`: software engine rendering placeholder frames (default)
// - `recording`: mock that records every call, for tests
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::ffi::c_void;
use std::ptr::NonNull;

//=== Submodules ==========================================================

mod compositor;
pub mod headless;
mod raster;
pub mod recording;

//=== Internal Imports ====================================================

use crate::config::Settings;
use crate::core::input::{KeyEvent, MouseClickEvent, MouseMoveEvent, MouseWheelEvent};
use crate::core::paint::PaintSink;
use crate::core::view::{DeviceScale, ViewSize};
use crate::core::BrowserId;
use crate::error::EngineError;

//=== Public API ==========================================================

pub use headless::{HeadlessEngine, PaintMode};
pub use recording::{CallLog, EngineCall, RecordingEngine, RecordingHandle};

//=== ProcessRole =========================================================

/// Outcome of [`Engine::execute_process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessRole {
    /// Main browser process: continue normal host start-up.
    Browser,

    /// The binary was relaunched as an engine helper, which has finished.
    /// The process should exit with this code.
    Helper(i32),
}

impl ProcessRole {
    /// C encoding: `-1` for the browser process, the exit code otherwise.
    pub fn to_raw(self) -> i32 {
        match self {
            Self::Browser => -1,
            Self::Helper(code) => code,
        }
    }
}

//=== ParentView ==========================================================

/// Native view a windowed browser attaches to (NSView, HWND, ...).
///
/// The bridge never dereferences it; it is handed to the engine as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentView(NonNull<c_void>);

// The pointer is an opaque token owned by the host UI toolkit.
unsafe impl Send for ParentView {}

impl ParentView {
    /// Returns `None` for a null pointer (off-screen browser).
    pub fn from_raw(raw: *mut c_void) -> Option<Self> {
        NonNull::new(raw).map(Self)
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.0.as_ptr()
    }
}

//=== BrowserParams =======================================================

/// Everything an engine needs to allocate one browser.
#[derive(Debug, Clone)]
pub struct BrowserParams {
    pub id: BrowserId,
    pub url: String,
    pub size: ViewSize,
    pub scale: DeviceScale,
    pub parent_view: Option<ParentView>,
}

impl BrowserParams {
    /// `true` when the browser renders off-screen through its paint sink.
    pub fn is_off_screen(&self) -> bool {
        self.parent_view.is_none()
    }
}

//=== Engine ==============================================================

/// Process-wide side of an embedded engine.
///
/// All methods are called from the UI thread (the thread that called
/// `initialize`), except `execute_process`, which runs before it.
pub trait Engine: Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Starts the engine. Called once per initialize/shutdown cycle.
    fn initialize(&mut self, settings: &Settings) -> Result<(), EngineError>;

    /// Runs a helper sub-process if `args` describe one.
    fn execute_process(&mut self, args: &[String]) -> ProcessRole;

    /// Stops the engine. All browsers are closed by then.
    fn shutdown(&mut self);

    /// Performs one slice of engine work (navigation, rendering, timers).
    fn do_message_loop_work(&mut self);

    /// Allocates a browser that delivers its frames to `sink`.
    fn create_browser(
        &mut self,
        params: BrowserParams,
        sink: PaintSink,
    ) -> Result<Box<dyn EngineBrowser>, EngineError>;
}

//=== EngineBrowser =======================================================

/// Engine-side state of one browser.
///
/// Calls arrive in host order and are fire-and-forget; changes become
/// visible through later paints.
pub trait EngineBrowser: Send {
    fn resize(&mut self, size: ViewSize);

    fn load_url(&mut self, url: &str);

    fn set_device_scale(&mut self, scale: DeviceScale);

    fn set_focus(&mut self, focus: bool);

    fn send_key_event(&mut self, event: KeyEvent);

    fn send_mouse_move(&mut self, event: MouseMoveEvent);

    fn send_mouse_click(&mut self, event: MouseClickEvent);

    fn send_mouse_wheel(&mut self, event: MouseWheelEvent);

    /// Releases engine resources. Called exactly once, last.
    fn close(&mut self);
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_role_raw_encoding() {
        assert_eq!(ProcessRole::Browser.to_raw(), -1);
        assert_eq!(ProcessRole::Helper(0).to_raw(), 0);
        assert_eq!(ProcessRole::Helper(3).to_raw(), 3);
    }

    #[test]
    fn parent_view_null_is_off_screen() {
        assert!(ParentView::from_raw(std::ptr::null_mut()).is_none());

        let mut token = 0u8;
        let view = ParentView::from_raw(&mut token as *mut u8 as *mut c_void).unwrap();
        let params = BrowserParams {
            id: BrowserId::new(1),
            url: String::new(),
            size: ViewSize::clamped(1, 1),
            scale: DeviceScale::ONE,
            parent_view: Some(view),
        };
        assert!(!params.is_off_screen());
    }
}
