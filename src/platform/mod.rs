//=========================================================================
// Platform Subsystem
//
// Bridges Winit (OS-level events) with one bridge browser.
//
// Architecture:
// ```text
//  Main (UI) Thread:                       Paint Thread:
//  ┌──────────────────────────────┐       ┌──────────────────────┐
//  │  Winit Event Loop            │       │  Engine compositor   │
//  │   ↓                          │       │   ↓                  │
//  │  InputProcessor              │       │  FrameForwarder      │
//  │   ├─ Converts Winit          │       │   └─ try_send(copy)  │
//  │   └─ Tracks modifiers/clicks │       └──────────┬───────────┘
//  │   ↓                          │                  │
//  │  Browser (send_* / resize)   │                  │ bounded MPSC
//  │   ↓                          │                  │ HostEvent
//  │  about_to_wait               │                  │
//  │   ├─ do_message_loop_work()  │                  │
//  │   └─ FrameCollector ◄────────┼──────────────────┘
//  │        └─ PNG dump (once)    │
//  └──────────────────────────────┘
// ```
//
// Key Design Decisions:
// - **about_to_wait = pump boundary**: one message loop slice per loop
//   iteration, then a ~60 Hz wake-up via `ControlFlow::WaitUntil`
// - **Sticky modifiers**: modifier state persists across events until
//   explicitly changed
// - **Paint never blocks**: the forwarder drops frames on a full channel
// - **Main thread requirement**: Winit mandates main thread on macOS/iOS,
//   and the bridge's UI thread is the thread that called `initialize`
//
//=========================================================================

//=== Submodules ==========================================================

mod frame_dump;
mod input_processor;

//=== Standard Library Imports ============================================

use std::time::{Duration, Instant};

//=== External Crates =====================================================

use crossbeam_channel::Sender;
use log::*;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

//=== Internal Imports ====================================================

use crate::browser::{Browser, BrowserBuilder};
use crate::core::host_bridge::{FrameCollector, FrameForwarder, HostControl, HostEvent};
use crate::error::BridgeError;
use crate::host::HostConfig;
use crate::runtime;
use input_processor::InputProcessor;

pub use frame_dump::DumpError;

//=== Constants ===========================================================

const PUMP_INTERVAL: Duration = Duration::from_millis(16);

//=== PlatformError =======================================================

/// Failures that end the host loop.
#[derive(thiserror::Error, Debug)]
pub enum PlatformError {
    #[error("event loop creation failed: {0}")]
    EventLoopCreation(#[source] winit::error::EventLoopError),

    #[error("event loop error: {0}")]
    EventLoopExecution(#[source] winit::error::EventLoopError),

    #[error("window creation failed: {0}")]
    WindowCreation(#[from] winit::error::OsError),

    #[error("browser creation failed: {0}")]
    Browser(#[from] BridgeError),

    #[error(transparent)]
    Dump(#[from] DumpError),
}

//=== Platform ============================================================

/// Window, browser and frame plumbing for the demo host.
///
/// Runs on the main thread. Must be created after `runtime::initialize`
/// on the same thread.
pub(crate) struct Platform {
    config: HostConfig,

    /// OS window handle (None until `resumed()` called).
    window: Option<Window>,

    /// Browser bound to the window (None until `resumed()` called).
    browser: Option<Browser>,

    input_processor: InputProcessor,
    frame_sender: Sender<HostEvent>,
    collector: FrameCollector,
    dumped: bool,

    /// First fatal error, reported by `run()`.
    failure: Option<PlatformError>,
}

impl Platform {
    //--- Construction -----------------------------------------------------

    pub(crate) fn new(config: HostConfig) -> Self {
        let (frame_sender, frame_receiver) = crossbeam_channel::bounded(config.channel_capacity);
        info!(target: "platform", "Platform subsystem initialized");
        Self {
            config,
            window: None,
            browser: None,
            input_processor: InputProcessor::new(1.0),
            frame_sender,
            collector: FrameCollector::new(frame_receiver),
            dumped: false,
            failure: None,
        }
    }

    //--- Execution --------------------------------------------------------

    /// Runs the event loop until the window closes, then destroys the
    /// browser.
    ///
    /// # Errors
    ///
    /// Returns the first [`PlatformError`] hit while creating the event
    /// loop, the window or the browser, or while dumping a frame.
    pub(crate) fn run(mut self) -> Result<u64, PlatformError> {
        debug!(target: "platform", "Starting Winit event loop");

        let event_loop = EventLoop::new().map_err(PlatformError::EventLoopCreation)?;
        event_loop
            .run_app(&mut self)
            .map_err(PlatformError::EventLoopExecution)?;

        if let Some(mut browser) = self.browser.take() {
            browser.destroy();
        }

        match self.failure.take() {
            Some(e) => Err(e),
            None => Ok(self.collector.received()),
        }
    }

    //--- Internal Helpers -------------------------------------------------

    fn create_browser(&self, window: &Window) -> Result<Browser, BridgeError> {
        let sender = self.frame_sender.clone();
        BrowserBuilder::new(self.config.url.clone())
            .with_size(self.config.width, self.config.height)
            .with_device_scale(window.scale_factor() as f32)
            .with_paint_handler_for(move |id| FrameForwarder::new(id, sender))
            .build()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: PlatformError) {
        error!(target: "platform", "{}", error);
        if self.failure.is_none() {
            self.failure = Some(error);
        }
        event_loop.exit();
    }

    /// Drains painted frames and handles the one-shot dump.
    fn handle_frames(&mut self, event_loop: &ActiveEventLoop) {
        if self.collector.collect() == HostControl::Exit {
            info!(target: "platform", "Frame channel closed");
            event_loop.exit();
            return;
        }

        let Some(browser) = &self.browser else {
            return;
        };
        let Some(frame) = self.collector.latest(browser.id()) else {
            return;
        };

        if let Some(window) = &self.window {
            window.set_title(&format!(
                "Stoa: {} ({}x{}, {} frames)",
                browser.url(),
                frame.width,
                frame.height,
                self.collector.received()
            ));
        }

        if self.dumped {
            return;
        }
        let Some(path) = self.config.dump_path.clone() else {
            return;
        };

        self.dumped = true;
        if let Err(e) = frame_dump::save_png(frame, &path) {
            self.fail(event_loop, e.into());
            return;
        }
        if self.config.exit_after_dump {
            info!(target: "platform", "Frame dumped, exiting");
            event_loop.exit();
        }
    }
}

fn logical_size(size: PhysicalSize<u32>, scale_factor: f64) -> (i32, i32) {
    let logical: LogicalSize<f64> = size.to_logical(scale_factor);
    (logical.width.round() as i32, logical.height.round() as i32)
}

//=== Winit Integration ===================================================

impl ApplicationHandler for Platform {
    /// Called when app becomes active (startup or mobile resume).
    ///
    /// Creates the window and the browser bound to it.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            debug!(target: "platform", "Window already exists (mobile resume?)");
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title("Stoa")
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));

        let window = match event_loop.create_window(attrs) {
            Ok(window) => window,
            Err(e) => return self.fail(event_loop, e.into()),
        };
        info!(
            target: "platform",
            "Window created: {}x{} @ {}x DPI",
            window.inner_size().width,
            window.inner_size().height,
            window.scale_factor()
        );
        self.input_processor.set_scale_factor(window.scale_factor());

        match self.create_browser(&window) {
            Ok(mut browser) => {
                browser.set_focus(window.has_focus());
                self.browser = Some(browser);
            }
            Err(e) => return self.fail(event_loop, e.into()),
        }

        self.window = Some(window);
    }

    /// Handles per-window events.
    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        if let WindowEvent::CloseRequested = event {
            info!(target: "platform", "Window close requested");
            event_loop.exit();
            return;
        }

        let Some(browser) = self.browser.as_mut() else {
            return;
        };

        match event {
            WindowEvent::Resized(size) => {
                let (width, height) = logical_size(size, self.input_processor.scale_factor());
                debug!(target: "platform", "Resized to {}x{} (logical)", width, height);
                browser.resize(width, height);
            }

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                debug!(target: "platform", "Scale factor changed to {}", scale_factor);
                self.input_processor.set_scale_factor(scale_factor);
                browser.set_device_scale(scale_factor as f32);
            }

            WindowEvent::Focused(focused) => {
                if !focused {
                    self.input_processor.reset();
                }
                browser.set_focus(focused);
            }

            WindowEvent::ModifiersChanged(state) => {
                trace!(target: "platform::input", "Modifiers changed: {:?}", state);
                self.input_processor.update_modifiers(state.state());
            }

            WindowEvent::KeyboardInput { event: key_event, .. } => {
                let events = self.input_processor.process_key_event(&key_event);
                if events.is_empty() {
                    trace!(target: "platform::input", "Unmapped key ignored");
                }
                for event in events {
                    browser.send_key_event(event);
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let event = self.input_processor.process_cursor_moved(position);
                browser.send_mouse_move(event.x, event.y, event.modifiers, event.mouse_leave);
            }

            WindowEvent::CursorLeft { .. } => {
                let event = self.input_processor.process_cursor_left();
                browser.send_mouse_move(event.x, event.y, event.modifiers, event.mouse_leave);
            }

            WindowEvent::MouseInput { state, button, .. } => {
                match self.input_processor.process_mouse_button(button, state, Instant::now()) {
                    Some(event) => browser.send_input(event.into()),
                    None => trace!(target: "platform::input", "Unmapped mouse button {:?}", button),
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let event = self.input_processor.process_mouse_wheel(delta);
                browser.send_input(event.into());
            }

            _ => {
                // Ignore: Moved, Occluded, RedrawRequested, etc.
            }
        }
    }

    /// Pump boundary: one engine slice, then collect frames.
    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        match runtime::do_message_loop_work() {
            Ok(()) => {}
            Err(e) => return self.fail(event_loop, e.into()),
        }

        self.handle_frames(event_loop);
        event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + PUMP_INTERVAL));
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut browser) = self.browser.take() {
            browser.destroy();
        }
        info!(target: "platform", "Event loop exiting after {} frame(s)", self.collector.received());
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
