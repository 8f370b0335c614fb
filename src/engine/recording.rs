//=========================================================================
// Recording Engine
//=========================================================================
//
// Mock engine that records every call it receives, in order, and lets a
// test drive paints by hand.
//
// Architecture:
//   Bridge → RecordingEngine / RecordingBrowser → CallLog (shared)
//                                   └─ sinks ──► RecordingHandle::emit()
//
// Sinks are retained after a browser closes, so a test can emit a frame
// for a destroyed browser and check that the host never sees it.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

//=== External Dependencies ===============================================

use log::debug;

//=== Internal Dependencies ===============================================

use super::{BrowserParams, Engine, EngineBrowser, ProcessRole};
use crate::config::Settings;
use crate::core::input::{KeyEvent, MouseClickEvent, MouseMoveEvent, MouseWheelEvent};
use crate::core::paint::{Frame, PaintSink, BYTES_PER_PIXEL};
use crate::core::view::{DeviceScale, ViewSize};
use crate::core::BrowserId;
use crate::error::EngineError;

//=== EngineCall ==========================================================

/// One call observed by the recording engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Initialize { args: Vec<String> },
    ExecuteProcess { args: Vec<String> },
    Shutdown,
    MessageLoopWork,
    CreateBrowser { id: BrowserId, url: String, width: u32, height: u32, scale: f32, windowed: bool },
    Resize { id: BrowserId, width: u32, height: u32 },
    LoadUrl { id: BrowserId, url: String },
    SetDeviceScale { id: BrowserId, scale: f32 },
    SetFocus { id: BrowserId, focus: bool },
    Key { id: BrowserId, event: KeyEvent },
    MouseMove { id: BrowserId, event: MouseMoveEvent },
    MouseClick { id: BrowserId, event: MouseClickEvent },
    MouseWheel { id: BrowserId, event: MouseWheelEvent },
    Close { id: BrowserId },
}

impl EngineCall {
    /// Browser the call targets, if any.
    pub fn browser(&self) -> Option<BrowserId> {
        match self {
            Self::CreateBrowser { id, .. }
            | Self::Resize { id, .. }
            | Self::LoadUrl { id, .. }
            | Self::SetDeviceScale { id, .. }
            | Self::SetFocus { id, .. }
            | Self::Key { id, .. }
            | Self::MouseMove { id, .. }
            | Self::MouseClick { id, .. }
            | Self::MouseWheel { id, .. }
            | Self::Close { id } => Some(*id),
            _ => None,
        }
    }
}

//=== CallLog =============================================================

/// Shared, ordered list of recorded calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<EngineCall>>>,
}

impl CallLog {
    fn push(&self, call: EngineCall) {
        self.lock().push(call);
    }

    /// Snapshot of all calls so far.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.lock().clone()
    }

    /// Calls that target `id`, in order.
    pub fn for_browser(&self, id: BrowserId) -> Vec<EngineCall> {
        self.lock()
            .iter()
            .filter(|c| c.browser() == Some(id))
            .cloned()
            .collect()
    }

    /// Number of calls matching `predicate`.
    pub fn count<F: Fn(&EngineCall) -> bool>(&self, predicate: F) -> usize {
        self.lock().iter().filter(|c| predicate(c)).count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<EngineCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

//=== Shared Browser Table ================================================

#[derive(Clone)]
struct BrowserEntry {
    sink: PaintSink,
    size: ViewSize,
    scale: DeviceScale,
    closed: bool,
}

type BrowserTable = Arc<Mutex<BTreeMap<BrowserId, BrowserEntry>>>;

fn lock_table(table: &BrowserTable) -> MutexGuard<'_, BTreeMap<BrowserId, BrowserEntry>> {
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

//=== RecordingHandle ======================================================

/// Test-side view into a [`RecordingEngine`] after it has been handed to
/// the bridge.
#[derive(Clone)]
pub struct RecordingHandle {
    log: CallLog,
    browsers: BrowserTable,
}

impl RecordingHandle {
    pub fn log(&self) -> &CallLog {
        &self.log
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.log.calls()
    }

    /// Ids of every browser ever created, closed ones included.
    pub fn browsers(&self) -> Vec<BrowserId> {
        lock_table(&self.browsers).keys().copied().collect()
    }

    /// Whether the engine saw `close` for `id`.
    pub fn is_closed(&self, id: BrowserId) -> bool {
        lock_table(&self.browsers).get(&id).is_some_and(|e| e.closed)
    }

    /// Pushes a solid frame of `width × height` through the browser's sink,
    /// even if the browser was closed. Returns whether the host received it.
    pub fn emit(&self, id: BrowserId, width: u32, height: u32) -> bool {
        let Some(sink) = lock_table(&self.browsers).get(&id).map(|e| e.sink.clone()) else {
            return false;
        };
        let pixels = vec![0xFF; width as usize * height as usize * BYTES_PER_PIXEL];
        match Frame::new(width, height, &pixels) {
            Some(frame) => sink.deliver(&frame),
            None => false,
        }
    }
}

//=== RecordingEngine =====================================================

/// Mock [`Engine`] that records calls and supports fault injection.
///
/// With `paint_on_pump` enabled, every open browser receives a frame of its
/// current physical size on each `do_message_loop_work`.
pub struct RecordingEngine {
    log: CallLog,
    browsers: BrowserTable,
    fail_initialize: bool,
    fail_create: bool,
    paint_on_pump: bool,
    panic_on_pump: bool,
    helper_exit_code: Option<i32>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self {
            log: CallLog::default(),
            browsers: Arc::new(Mutex::new(BTreeMap::new())),
            fail_initialize: false,
            fail_create: false,
            paint_on_pump: false,
            panic_on_pump: false,
            helper_exit_code: None,
        }
    }

    /// Makes `initialize` fail.
    pub fn failing_initialize(mut self) -> Self {
        self.fail_initialize = true;
        self
    }

    /// Makes `create_browser` fail.
    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Paints every open browser on each message loop pump.
    pub fn painting_on_pump(mut self) -> Self {
        self.paint_on_pump = true;
        self
    }

    /// Makes `do_message_loop_work` panic after recording the call.
    pub fn panicking_on_pump(mut self) -> Self {
        self.panic_on_pump = true;
        self
    }

    /// Reports a helper process exiting with `code` from `execute_process`.
    pub fn as_helper(mut self, code: i32) -> Self {
        self.helper_exit_code = Some(code);
        self
    }

    /// Handle for inspecting the engine once it is installed.
    pub fn recorder(&self) -> RecordingHandle {
        RecordingHandle {
            log: self.log.clone(),
            browsers: Arc::clone(&self.browsers),
        }
    }
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for RecordingEngine {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn initialize(&mut self, settings: &Settings) -> Result<(), EngineError> {
        self.log.push(EngineCall::Initialize {
            args: settings.engine_args(),
        });
        if self.fail_initialize {
            return Err(EngineError::startup("injected initialize failure"));
        }
        Ok(())
    }

    fn execute_process(&mut self, args: &[String]) -> ProcessRole {
        self.log.push(EngineCall::ExecuteProcess { args: args.to_vec() });
        match self.helper_exit_code {
            Some(code) => ProcessRole::Helper(code),
            None => ProcessRole::Browser,
        }
    }

    fn shutdown(&mut self) {
        self.log.push(EngineCall::Shutdown);
    }

    fn do_message_loop_work(&mut self) {
        self.log.push(EngineCall::MessageLoopWork);
        if self.panic_on_pump {
            panic!("injected message loop panic");
        }
        if !self.paint_on_pump {
            return;
        }

        let open: Vec<(PaintSink, u32, u32)> = lock_table(&self.browsers)
            .values()
            .filter(|e| !e.closed)
            .map(|e| {
                let (w, h) = e.size.physical(e.scale);
                (e.sink.clone(), w, h)
            })
            .collect();

        for (sink, width, height) in open {
            let pixels = vec![0x80; width as usize * height as usize * BYTES_PER_PIXEL];
            if let Some(frame) = Frame::new(width, height, &pixels) {
                sink.deliver(&frame);
            }
        }
    }

    fn create_browser(
        &mut self,
        params: BrowserParams,
        sink: PaintSink,
    ) -> Result<Box<dyn EngineBrowser>, EngineError> {
        self.log.push(EngineCall::CreateBrowser {
            id: params.id,
            url: params.url.clone(),
            width: params.size.width(),
            height: params.size.height(),
            scale: params.scale.get(),
            windowed: !params.is_off_screen(),
        });
        if self.fail_create {
            return Err(EngineError::browser_allocation("injected create failure"));
        }

        lock_table(&self.browsers).insert(
            params.id,
            BrowserEntry {
                sink,
                size: params.size,
                scale: params.scale,
                closed: false,
            },
        );
        debug!(target: "recording", "Browser {} created", params.id);

        Ok(Box::new(RecordingBrowser {
            id: params.id,
            log: self.log.clone(),
            browsers: Arc::clone(&self.browsers),
        }))
    }
}

//=== RecordingBrowser ====================================================

struct RecordingBrowser {
    id: BrowserId,
    log: CallLog,
    browsers: BrowserTable,
}

impl RecordingBrowser {
    fn update_entry<F: FnOnce(&mut BrowserEntry)>(&self, f: F) {
        if let Some(entry) = lock_table(&self.browsers).get_mut(&self.id) {
            f(entry);
        }
    }
}

impl EngineBrowser for RecordingBrowser {
    fn resize(&mut self, size: ViewSize) {
        self.log.push(EngineCall::Resize {
            id: self.id,
            width: size.width(),
            height: size.height(),
        });
        self.update_entry(|e| e.size = size);
    }

    fn load_url(&mut self, url: &str) {
        self.log.push(EngineCall::LoadUrl {
            id: self.id,
            url: url.to_string(),
        });
    }

    fn set_device_scale(&mut self, scale: DeviceScale) {
        self.log.push(EngineCall::SetDeviceScale {
            id: self.id,
            scale: scale.get(),
        });
        self.update_entry(|e| e.scale = scale);
    }

    fn set_focus(&mut self, focus: bool) {
        self.log.push(EngineCall::SetFocus { id: self.id, focus });
    }

    fn send_key_event(&mut self, event: KeyEvent) {
        self.log.push(EngineCall::Key { id: self.id, event });
    }

    fn send_mouse_move(&mut self, event: MouseMoveEvent) {
        self.log.push(EngineCall::MouseMove { id: self.id, event });
    }

    fn send_mouse_click(&mut self, event: MouseClickEvent) {
        self.log.push(EngineCall::MouseClick { id: self.id, event });
    }

    fn send_mouse_wheel(&mut self, event: MouseWheelEvent) {
        self.log.push(EngineCall::MouseWheel { id: self.id, event });
    }

    fn close(&mut self) {
        self.log.push(EngineCall::Close { id: self.id });
        self.update_entry(|e| e.closed = true);
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
