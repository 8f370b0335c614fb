//=========================================================================
// Headless Engine
//
// Self-contained software engine used when no native engine is installed.
// It keeps per-view state, renders placeholder frames for views that
// changed, and delivers them through each browser's paint sink.
//
// Architecture:
// ```text
//   HeadlessBrowser ──mutates──► ViewState (Arc<Mutex>) ◄──┐
//                                   dirty = true           │
//                                                          │
//   do_message_loop_work() ── for each dirty view ─────────┘
//        │  snapshot → raster::render()
//        ├─ PaintMode::Inline   → deliver on the UI thread
//        └─ PaintMode::Threaded → Compositor thread delivers
// ```
//
// Views render at their physical size (logical size × device scale).
// Parent views are accepted but ignored: every view renders off-screen.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

//=== External Crates =====================================================

use log::{debug, error, info, trace, warn};

//=== Internal Imports ====================================================

use super::compositor::{Compositor, PaintJob};
use super::raster::{self, Scene};
use super::{BrowserParams, Engine, EngineBrowser, ProcessRole};
use crate::config::Settings;
use crate::core::input::{InputEvent, KeyEvent, MouseClickEvent, MouseMoveEvent, MouseWheelEvent};
use crate::core::paint::PaintSink;
use crate::core::view::{DeviceScale, ViewSize};
use crate::core::BrowserId;
use crate::error::EngineError;

/// Number of recent input events kept per view.
const INPUT_HISTORY: usize = 64;

//=== PaintMode ===========================================================

/// Where the headless engine invokes paint handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintMode {
    /// On the thread calling `do_message_loop_work`.
    Inline,

    /// On a compositor thread fed by a queue of `queue_capacity` frames.
    Threaded { queue_capacity: usize },
}

impl Default for PaintMode {
    fn default() -> Self {
        Self::Threaded { queue_capacity: 8 }
    }
}

//=== ViewState ===========================================================

struct ViewState {
    id: BrowserId,
    url: String,
    size: ViewSize,
    scale: DeviceScale,
    focused: bool,
    cursor: Option<(i32, i32)>,
    scroll_y: i64,
    navigations: u64,
    dirty: bool,
    closed: bool,
    history: VecDeque<InputEvent>,
    sink: PaintSink,
}

impl ViewState {
    fn record(&mut self, event: InputEvent) {
        if self.history.len() == INPUT_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(event);
    }

    fn scene(&self) -> Scene {
        let (width, height) = self.size.physical(self.scale);
        let factor = self.scale.get() as f64;
        let to_physical = |v: i32| (v as f64 * factor).round() as i64;

        Scene {
            width,
            height,
            background: raster::url_color(&self.url),
            focused: self.focused,
            cursor: self.cursor.map(|(x, y)| (to_physical(x), to_physical(y))),
            scroll_y: self.scroll_y,
        }
    }
}

type SharedView = Arc<Mutex<ViewState>>;

fn lock_view(view: &SharedView) -> MutexGuard<'_, ViewState> {
    view.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

//=== HeadlessEngine ======================================================

/// Software engine rendering placeholder frames.
///
/// # Default Values
///
/// - **Paint mode**: threaded, queue of 8 frames
pub struct HeadlessEngine {
    mode: PaintMode,
    running: bool,
    views: Vec<SharedView>,
    compositor: Option<Compositor>,
    command_line: Vec<String>,
    frames_rendered: u64,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self::with_paint_mode(PaintMode::default())
    }

    /// # Panics
    ///
    /// Panics if a threaded mode has `queue_capacity == 0`.
    pub fn with_paint_mode(mode: PaintMode) -> Self {
        if let PaintMode::Threaded { queue_capacity } = mode {
            assert!(queue_capacity > 0, "Paint queue capacity must be positive");
        }
        Self {
            mode,
            running: false,
            views: Vec::new(),
            compositor: None,
            command_line: Vec::new(),
            frames_rendered: 0,
        }
    }

    pub fn paint_mode(&self) -> PaintMode {
        self.mode
    }

    /// Arguments the engine was started with, switches included.
    pub fn command_line(&self) -> &[String] {
        &self.command_line
    }

    /// Frames rendered since construction.
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Number of browsers currently open.
    pub fn open_views(&self) -> usize {
        self.views.iter().filter(|v| !lock_view(v).closed).count()
    }

    fn check_resource(path: Option<&Path>) -> Result<(), EngineError> {
        match path {
            Some(path) if !path.exists() => Err(EngineError::MissingResource(path.to_path_buf())),
            _ => Ok(()),
        }
    }

    fn render_view(&mut self, view: &SharedView) {
        let (scene, sink) = {
            let mut state = lock_view(view);
            if state.closed || !state.dirty {
                return;
            }
            state.dirty = false;
            (state.scene(), state.sink.clone())
        };

        let Some(pixels) = raster::render(&scene) else {
            error!(
                target: "headless",
                "Frame {}x{} for browser {} does not fit in memory",
                scene.width,
                scene.height,
                sink.browser()
            );
            return;
        };

        let job = PaintJob {
            sink,
            width: scene.width,
            height: scene.height,
            pixels,
        };
        self.frames_rendered += 1;

        match (&self.mode, &self.compositor) {
            (PaintMode::Threaded { .. }, Some(compositor)) => {
                if let Err(job) = compositor.submit(job) {
                    trace!(
                        target: "headless",
                        "Paint queue full, re-rendering browser {} next pump",
                        job.sink.browser()
                    );
                    lock_view(view).dirty = true;
                }
            }
            _ => {
                job.deliver();
            }
        }
    }
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for HeadlessEngine {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn initialize(&mut self, settings: &Settings) -> Result<(), EngineError> {
        if self.running {
            return Err(EngineError::startup("headless engine already running"));
        }

        Self::check_resource(settings.framework_path())?;
        Self::check_resource(settings.resources_path())?;
        Self::check_resource(settings.locales_path())?;

        if let Some(cache) = settings.cache_path() {
            fs::create_dir_all(cache).map_err(|e| {
                EngineError::startup(format!("cannot create cache {}: {}", cache.display(), e))
            })?;
        }

        if let Some(port) = settings.remote_debugging_port() {
            warn!(target: "headless", "Remote debugging (port {}) is not available headless", port);
        }

        if let PaintMode::Threaded { queue_capacity } = self.mode {
            let compositor = Compositor::spawn(queue_capacity)
                .map_err(|e| EngineError::startup(format!("compositor thread: {}", e)))?;
            self.compositor = Some(compositor);
        }

        self.command_line = settings.engine_args();
        self.running = true;
        info!(
            target: "headless",
            "Headless engine started ({:?}, command line: {:?})",
            self.mode,
            self.command_line
        );
        Ok(())
    }

    fn execute_process(&mut self, args: &[String]) -> ProcessRole {
        match args.iter().find(|a| a.starts_with("--type=")) {
            Some(kind) => {
                info!(target: "headless", "Helper process launch ({}), nothing to run", kind);
                ProcessRole::Helper(0)
            }
            None => ProcessRole::Browser,
        }
    }

    fn shutdown(&mut self) {
        for view in self.views.drain(..) {
            lock_view(&view).closed = true;
        }
        if let Some(mut compositor) = self.compositor.take() {
            compositor.stop();
        }
        self.running = false;
        info!(target: "headless", "Headless engine stopped ({} frames)", self.frames_rendered);
    }

    fn do_message_loop_work(&mut self) {
        if !self.running {
            return;
        }

        self.views.retain(|view| !lock_view(view).closed);

        let views = self.views.clone();
        for view in &views {
            self.render_view(view);
        }
    }

    fn create_browser(
        &mut self,
        params: BrowserParams,
        sink: PaintSink,
    ) -> Result<Box<dyn EngineBrowser>, EngineError> {
        if !self.running {
            return Err(EngineError::NotRunning);
        }

        if !params.is_off_screen() {
            debug!(
                target: "headless",
                "Browser {} has a parent view, rendering off-screen anyway",
                params.id
            );
        }

        let view = Arc::new(Mutex::new(ViewState {
            id: params.id,
            url: params.url,
            size: params.size,
            scale: params.scale,
            focused: false,
            cursor: None,
            scroll_y: 0,
            navigations: 1,
            dirty: true,
            closed: false,
            history: VecDeque::with_capacity(INPUT_HISTORY),
            sink,
        }));
        self.views.push(Arc::clone(&view));

        Ok(Box::new(HeadlessBrowser { view }))
    }
}

//=== HeadlessBrowser =====================================================

/// Per-browser handle into the headless engine.
pub struct HeadlessBrowser {
    view: SharedView,
}

impl HeadlessBrowser {
    fn update<F: FnOnce(&mut ViewState)>(&self, f: F) {
        let mut state = lock_view(&self.view);
        if state.closed {
            trace!(target: "headless", "Ignoring call on closed browser {}", state.id);
            return;
        }
        f(&mut state);
    }
}

impl EngineBrowser for HeadlessBrowser {
    fn resize(&mut self, size: ViewSize) {
        self.update(|s| {
            if s.size != size {
                s.size = size;
                s.dirty = true;
            }
        });
    }

    fn load_url(&mut self, url: &str) {
        self.update(|s| {
            s.url = url.to_string();
            s.scroll_y = 0;
            s.navigations += 1;
            s.dirty = true;
            debug!(target: "headless", "Browser {} navigation #{} to {}", s.id, s.navigations, url);
        });
    }

    fn set_device_scale(&mut self, scale: DeviceScale) {
        self.update(|s| {
            if s.scale != scale {
                s.scale = scale;
                s.dirty = true;
            }
        });
    }

    fn set_focus(&mut self, focus: bool) {
        self.update(|s| {
            if s.focused != focus {
                s.focused = focus;
                s.dirty = true;
            }
        });
    }

    fn send_key_event(&mut self, event: KeyEvent) {
        self.update(|s| s.record(event.into()));
    }

    fn send_mouse_move(&mut self, event: MouseMoveEvent) {
        self.update(|s| {
            s.record(event.into());
            s.cursor = if event.mouse_leave { None } else { Some((event.x, event.y)) };
            s.dirty = true;
        });
    }

    fn send_mouse_click(&mut self, event: MouseClickEvent) {
        self.update(|s| {
            s.record(event.into());
            s.cursor = Some((event.x, event.y));
            s.dirty = true;
        });
    }

    fn send_mouse_wheel(&mut self, event: MouseWheelEvent) {
        self.update(|s| {
            s.record(event.into());
            if event.delta_y != 0 {
                // Positive delta scrolls content down (towards the top)
                s.scroll_y = (s.scroll_y - event.delta_y as i64).max(0);
                s.dirty = true;
            }
        });
    }

    fn close(&mut self) {
        let mut state = lock_view(&self.view);
        state.closed = true;
        state.history.clear();
        debug!(target: "headless", "Browser {} closed", state.id);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
