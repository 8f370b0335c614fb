//=========================================================================
// Browser
//
// Owning handle to one engine browser instance.
//
// Architecture:
// ```text
//   BrowserBuilder ──build()──► Browser ──destroy()/drop──► released
//                                 │
//                                 ├─ EngineBrowser  (engine side)
//                                 ├─ PaintGate      (host paint handler)
//                                 └─ KeystrokeTracker (debug ordering check)
// ```
//
// Destroy order: close the paint gate (waits for an in-flight paint), close
// the engine browser, release the runtime's live count. After `destroy`
// every call is a logged no-op and the paint handler is never invoked.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::sync::Arc;

//=== External Crates =====================================================

use log::{debug, info, warn};

//=== Internal Imports ====================================================

use crate::core::input::{
    InputEvent, KeyEvent, KeystrokeTracker, Modifiers, MouseButton, MouseClickEvent,
    MouseMoveEvent, MouseWheelEvent,
};
use crate::core::paint::{PaintGate, PaintHandler, PaintSink};
use crate::core::view::{DeviceScale, ViewSize};
use crate::core::BrowserId;
use crate::engine::{BrowserParams, EngineBrowser, ParentView};
use crate::error::BridgeResult;
use crate::runtime;

//=== BrowserBuilder ======================================================

/// Builder for a [`Browser`].
///
/// # Default Values
///
/// - **Size**: 800×600
/// - **Device scale**: 1.0
/// - **Parent view**: none (off-screen)
/// - **Paint handler**: none (frames are dropped)
///
/// # Examples
///
/// ```no_run
/// use stoa_bridge::prelude::*;
///
/// stoa_bridge::runtime::initialize(&Settings::default()).unwrap();
///
/// let mut browser = BrowserBuilder::new("https://example.com/")
///     .with_size(1024, 768)
///     .with_paint_handler(|frame: &Frame<'_>| {
///         println!("{}x{}", frame.width(), frame.height());
///     })
///     .build()
///     .unwrap();
///
/// stoa_bridge::runtime::do_message_loop_work().unwrap();
/// browser.destroy();
/// ```
pub struct BrowserBuilder {
    url: String,
    size: ViewSize,
    scale: DeviceScale,
    parent_view: Option<ParentView>,
    handler: Option<HandlerFactory>,
}

type HandlerFactory = Box<dyn FnOnce(BrowserId) -> Box<dyn PaintHandler>>;

impl BrowserBuilder {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            size: ViewSize::clamped(800, 600),
            scale: DeviceScale::ONE,
            parent_view: None,
            handler: None,
        }
    }

    /// Sets the logical view size. Values below 1 clamp to 1.
    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.size = ViewSize::clamped(width, height);
        self
    }

    /// Sets the device pixel ratio. Non-finite or non-positive values
    /// fall back to 1.0.
    pub fn with_device_scale(mut self, scale: f32) -> Self {
        self.scale = DeviceScale::clamped(scale);
        self
    }

    /// Attaches the browser to a native view (windowed mode).
    pub fn with_parent_view(mut self, parent: ParentView) -> Self {
        self.parent_view = Some(parent);
        self
    }

    /// Sets the handler receiving every frame, possibly on an engine thread.
    pub fn with_paint_handler(mut self, handler: impl PaintHandler + 'static) -> Self {
        self.handler = Some(Box::new(move |_| Box::new(handler) as Box<dyn PaintHandler>));
        self
    }

    /// Sets a paint handler that needs the browser's id, built once the id
    /// is assigned.
    pub fn with_paint_handler_for<F, H>(mut self, make: F) -> Self
    where
        F: FnOnce(BrowserId) -> H + 'static,
        H: PaintHandler + 'static,
    {
        self.handler = Some(Box::new(move |id| Box::new(make(id)) as Box<dyn PaintHandler>));
        self
    }

    /// Allocates the browser in the running engine.
    ///
    /// # Errors
    ///
    /// - [`crate::BridgeError::NotInitialized`] before `runtime::initialize`
    /// - [`crate::BridgeError::Engine`] if the engine cannot allocate
    pub fn build(self) -> BridgeResult<Browser> {
        let id = runtime::next_browser_id();
        let handler = self.handler.map(|make| make(id));
        let has_handler = handler.is_some();
        let gate = PaintGate::new(handler);
        let sink = PaintSink::new(id, Arc::clone(&gate));

        let params = BrowserParams {
            id,
            url: self.url.clone(),
            size: self.size,
            scale: self.scale,
            parent_view: self.parent_view,
        };
        let windowed = !params.is_off_screen();

        let engine = match runtime::create_browser(params, sink) {
            Ok(engine) => engine,
            Err(e) => {
                gate.close();
                return Err(e);
            }
        };

        info!(
            target: "browser",
            "Browser {} created ({}x{} @{}, {}, url: {})",
            id,
            self.size.width(),
            self.size.height(),
            self.scale.get(),
            if windowed { "windowed" } else { "off-screen" },
            self.url
        );
        if !has_handler {
            debug!(target: "browser", "Browser {} has no paint handler, frames are dropped", id);
        }

        Ok(Browser {
            id,
            engine: Some(engine),
            gate,
            keys: KeystrokeTracker::new(),
            size: self.size,
            scale: self.scale,
            url: self.url,
        })
    }
}

//=== Browser =============================================================

/// One live browser instance.
///
/// Dropping a `Browser` destroys it. Must be destroyed before
/// [`runtime::shutdown`].
///
/// # Deadlock
///
/// Destroying a browser from inside its own paint handler blocks forever:
/// destroy waits for the in-flight paint to return.
pub struct Browser {
    id: BrowserId,
    engine: Option<Box<dyn EngineBrowser>>,
    gate: Arc<PaintGate>,
    keys: KeystrokeTracker,
    size: ViewSize,
    scale: DeviceScale,
    url: String,
}

impl Browser {
    pub fn builder(url: impl Into<String>) -> BrowserBuilder {
        BrowserBuilder::new(url)
    }

    //--- Queries ----------------------------------------------------------

    pub fn id(&self) -> BrowserId {
        self.id
    }

    /// Last URL requested, not necessarily loaded yet.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn size(&self) -> ViewSize {
        self.size
    }

    pub fn device_scale(&self) -> DeviceScale {
        self.scale
    }

    /// `false` once destroyed.
    pub fn is_alive(&self) -> bool {
        self.engine.is_some()
    }

    /// Frames handed to the paint handler so far.
    pub fn frames_delivered(&self) -> u64 {
        self.gate.delivered()
    }

    //--- View -------------------------------------------------------------

    /// Changes the logical size. The next paint reports the new size.
    pub fn resize(&mut self, width: i32, height: i32) {
        let size = ViewSize::clamped(width, height);
        if let Some(engine) = self.live("resize") {
            engine.resize(size);
            self.size = size;
        }
    }

    /// Starts navigating to `url`. Completion is only visible in paints.
    pub fn load_url(&mut self, url: &str) {
        if let Some(engine) = self.live("load_url") {
            engine.load_url(url);
            self.url = url.to_string();
        }
    }

    pub fn set_device_scale(&mut self, scale: f32) {
        let scale = DeviceScale::clamped(scale);
        if let Some(engine) = self.live("set_device_scale") {
            engine.set_device_scale(scale);
            self.scale = scale;
        }
    }

    pub fn set_focus(&mut self, focus: bool) {
        if let Some(engine) = self.live("set_focus") {
            engine.set_focus(focus);
            if !focus {
                self.keys.reset();
            }
        }
    }

    //--- Input ------------------------------------------------------------

    /// Forwards a key event as-is. Ordering problems are logged, never
    /// corrected.
    pub fn send_key_event(&mut self, event: KeyEvent) {
        let id = self.id;
        let Some(engine) = self.engine.as_mut() else {
            warn!(target: "browser", "send_key_event on destroyed browser {}", id);
            return;
        };
        if let Err(violation) = self.keys.observe(&event) {
            debug!(target: "browser", "Browser {}: {}", id, violation);
        }
        engine.send_key_event(event);
    }

    pub fn send_mouse_move(&mut self, x: i32, y: i32, modifiers: Modifiers, mouse_leave: bool) {
        if let Some(engine) = self.live("send_mouse_move") {
            engine.send_mouse_move(MouseMoveEvent {
                x,
                y,
                modifiers,
                mouse_leave,
            });
        }
    }

    pub fn send_mouse_click(
        &mut self,
        x: i32,
        y: i32,
        modifiers: Modifiers,
        button: MouseButton,
        mouse_up: bool,
        click_count: i32,
    ) {
        if let Some(engine) = self.live("send_mouse_click") {
            engine.send_mouse_click(MouseClickEvent {
                x,
                y,
                modifiers,
                button,
                mouse_up,
                click_count,
            });
        }
    }

    pub fn send_mouse_wheel(&mut self, x: i32, y: i32, modifiers: Modifiers, delta_x: i32, delta_y: i32) {
        if let Some(engine) = self.live("send_mouse_wheel") {
            engine.send_mouse_wheel(MouseWheelEvent {
                x,
                y,
                modifiers,
                delta_x,
                delta_y,
            });
        }
    }

    /// Forwards any input event.
    pub fn send_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key(e) => self.send_key_event(e),
            InputEvent::MouseMove(e) => {
                if let Some(engine) = self.live("send_mouse_move") {
                    engine.send_mouse_move(e);
                }
            }
            InputEvent::MouseClick(e) => {
                if let Some(engine) = self.live("send_mouse_click") {
                    engine.send_mouse_click(e);
                }
            }
            InputEvent::MouseWheel(e) => {
                if let Some(engine) = self.live("send_mouse_wheel") {
                    engine.send_mouse_wheel(e);
                }
            }
        }
    }

    //--- Lifecycle --------------------------------------------------------

    /// Releases the engine browser. Idempotent.
    ///
    /// When this returns, the paint handler has been dropped and will not be
    /// called again.
    pub fn destroy(&mut self) {
        let Some(mut engine) = self.engine.take() else {
            return;
        };

        self.gate.close();
        engine.close();
        runtime::browser_released(self.id);

        info!(
            target: "browser",
            "Browser {} destroyed after {} frame(s)",
            self.id,
            self.gate.delivered()
        );
    }

    fn live(&mut self, op: &str) -> Option<&mut Box<dyn EngineBrowser>> {
        if self.engine.is_none() {
            warn!(target: "browser", "{} on destroyed browser {}", op, self.id);
        }
        self.engine.as_mut()
    }
}

impl Drop for Browser {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for Browser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Browser")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("size", &self.size)
            .field("scale", &self.scale)
            .field("alive", &self.is_alive())
            .finish()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
