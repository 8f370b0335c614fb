//=========================================================================
// C Surface
//
// `stoa_cef_*` exports matching `include/stoa_cef_bridge.h`.
//
// Handles:
// ```text
//   stoa_cef_browser_t*  ==  BrowserId as pointer  ──► BROWSERS[id] ──► Browser
// ```
// Ids are never reused, so a stale handle misses the registry instead of
// reaching another browser. Null, unknown and destroyed handles are logged
// no-ops.
//
// Errors collapse to `false` / null / no-op with a log line. Every export
// catches panics; no unwind crosses the C boundary.
//
//=========================================================================

#![allow(non_camel_case_types)]

//=== Standard Library Imports ============================================

use std::collections::BTreeMap;
use std::ffi::{c_char, c_int, c_void, CStr};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::ptr;
use std::sync::{Mutex, MutexGuard};

//=== External Crates =====================================================

use log::{debug, error, trace, warn};

//=== Internal Imports ====================================================

use crate::browser::{Browser, BrowserBuilder};
use crate::config::{self, Settings};
use crate::core::input::{KeyEvent, KeyEventType, Modifiers, MouseButton};
use crate::core::paint::{Frame, PaintHandler};
use crate::engine::ParentView;
use crate::error::BridgeError;
use crate::runtime;

//=== C Types =============================================================

/// Opaque browser handle.
#[repr(C)]
pub struct stoa_cef_browser_t {
    _private: [u8; 0],
}

/// Paint callback: BGRA pixels, `width * 4` bytes per row, valid only for
/// the duration of the call. May be invoked on an engine thread.
pub type stoa_cef_paint_callback = Option<
    unsafe extern "C" fn(
        user_data: *mut c_void,
        width: c_int,
        height: c_int,
        buffer: *const c_void,
        buffer_length: c_int,
    ),
>;

//=== ExternPaintCallback =================================================

/// C function pointer plus user data, as a [`PaintHandler`].
struct ExternPaintCallback {
    callback: unsafe extern "C" fn(*mut c_void, c_int, c_int, *const c_void, c_int),
    user_data: *mut c_void,
}

// The host promises `user_data` may be used from the engine's paint thread.
unsafe impl Send for ExternPaintCallback {}
unsafe impl Sync for ExternPaintCallback {}

impl PaintHandler for ExternPaintCallback {
    fn on_paint(&self, frame: &Frame<'_>) {
        let (Ok(width), Ok(height), Ok(length)) = (
            c_int::try_from(frame.width()),
            c_int::try_from(frame.height()),
            c_int::try_from(frame.buffer_length()),
        ) else {
            error!(
                target: "ffi",
                "Frame {}x{} too large for the C callback",
                frame.width(),
                frame.height()
            );
            return;
        };

        unsafe {
            (self.callback)(
                self.user_data,
                width,
                height,
                frame.buffer().as_ptr() as *const c_void,
                length,
            );
        }
    }
}

//=== Handle Registry =====================================================

static BROWSERS: Mutex<BTreeMap<u64, Browser>> = Mutex::new(BTreeMap::new());

fn registry() -> MutexGuard<'static, BTreeMap<u64, Browser>> {
    BROWSERS.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn handle_key(handle: *mut stoa_cef_browser_t) -> Option<u64> {
    if handle.is_null() {
        None
    } else {
        Some(handle as usize as u64)
    }
}

/// Runs `f` on the browser behind `handle`, or logs and does nothing.
fn with_browser<F: FnOnce(&mut Browser)>(handle: *mut stoa_cef_browser_t, op: &str, f: F) {
    let Some(key) = handle_key(handle) else {
        warn!(target: "ffi", "{}: null browser handle", op);
        return;
    };

    let mut browsers = registry();
    match browsers.get_mut(&key) {
        Some(browser) => f(browser),
        None => warn!(target: "ffi", "{}: unknown browser handle {:#x}", op, key),
    }
}

//=== Boundary Helpers ====================================================

/// Calls `f`, turning a panic into `fallback`.
fn guard<T, F: FnOnce() -> T>(op: &str, fallback: T, f: F) -> T {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            error!(target: "ffi", "{}: panic caught at the C boundary", op);
            fallback
        }
    }
}

/// Reads a C string. Null gives `None`; invalid UTF-8 is replaced.
unsafe fn read_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
}

/// Reads an optional path. Null and empty strings give `None`.
unsafe fn read_path(ptr: *const c_char) -> Option<PathBuf> {
    read_str(ptr).filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Copies `argc`/`argv` into owned strings, skipping null entries.
unsafe fn read_args(argc: c_int, argv: *mut *mut c_char) -> Vec<String> {
    if argv.is_null() || argc <= 0 {
        return Vec::new();
    }
    (0..argc as usize)
        .filter_map(|i| read_str(*argv.add(i)))
        .collect()
}

//=========================================================================
// Process Lifecycle
//=========================================================================

/// Helper-process entry. Returns `-1` in the browser process, otherwise
/// the exit code the helper process should exit with.
#[no_mangle]
pub unsafe extern "C" fn stoa_cef_execute_process(argc: c_int, argv: *mut *mut c_char) -> c_int {
    let args = read_args(argc, argv);
    guard("stoa_cef_execute_process", -1, || {
        runtime::execute_process(&args).to_raw()
    })
}

/// Starts the engine. Path arguments may be null. A `remote_debugging_port`
/// of 0 disables remote debugging.
#[no_mangle]
pub unsafe extern "C" fn stoa_cef_initialize(
    argc: c_int,
    argv: *mut *mut c_char,
    framework_path: *const c_char,
    resources_path: *const c_char,
    locales_path: *const c_char,
    cache_path: *const c_char,
    remote_debugging_port: c_int,
) -> bool {
    let args = read_args(argc, argv);
    let framework = read_path(framework_path);
    let resources = read_path(resources_path);
    let locales = read_path(locales_path);
    let cache = read_path(cache_path);

    guard("stoa_cef_initialize", false, || {
        let port = match config::debug_port_from_raw(remote_debugging_port) {
            Ok(port) => port,
            Err(e) => {
                error!(target: "ffi", "stoa_cef_initialize: {}", e);
                return false;
            }
        };

        let mut builder = Settings::builder().with_args(args);
        if let Some(path) = framework {
            builder = builder.with_framework_path(path);
        }
        if let Some(path) = resources {
            builder = builder.with_resources_path(path);
        }
        if let Some(path) = locales {
            builder = builder.with_locales_path(path);
        }
        if let Some(path) = cache {
            builder = builder.with_cache_path(path);
        }
        if let Some(port) = port {
            builder = builder.with_remote_debugging_port(port);
        }
        let settings = builder.apply_env().build();

        match runtime::initialize(&settings) {
            Ok(()) => true,
            Err(e) => {
                error!(target: "ffi", "stoa_cef_initialize failed: {}", e);
                false
            }
        }
    })
}

/// Stops the engine. Refused (and logged) while browsers are alive.
#[no_mangle]
pub extern "C" fn stoa_cef_shutdown() {
    guard("stoa_cef_shutdown", (), || {
        if let Err(e) = runtime::shutdown() {
            error!(target: "ffi", "stoa_cef_shutdown: {}", e);
        }
    })
}

/// Pumps the engine once. UI thread only.
#[no_mangle]
pub extern "C" fn stoa_cef_do_message_loop_work() {
    guard("stoa_cef_do_message_loop_work", (), || {
        match runtime::do_message_loop_work() {
            Ok(()) => {}
            Err(BridgeError::NotInitialized) => {
                trace!(target: "ffi", "Message loop work before initialize ignored");
            }
            Err(e) => error!(target: "ffi", "stoa_cef_do_message_loop_work: {}", e),
        }
    })
}

//=========================================================================
// Browser Lifecycle
//=========================================================================

/// Creates a browser. `parent_view` null means off-screen; `paint_callback`
/// may be null. Returns null on failure.
#[no_mangle]
pub unsafe extern "C" fn stoa_cef_browser_create(
    initial_url: *const c_char,
    width: c_int,
    height: c_int,
    parent_view: *mut c_void,
    device_scale_factor: f32,
    user_data: *mut c_void,
    paint_callback: stoa_cef_paint_callback,
) -> *mut stoa_cef_browser_t {
    let url = read_str(initial_url).unwrap_or_else(|| {
        warn!(target: "ffi", "stoa_cef_browser_create: null URL, using about:blank");
        "about:blank".to_string()
    });

    guard("stoa_cef_browser_create", ptr::null_mut(), || {
        let mut builder = BrowserBuilder::new(url)
            .with_size(width, height)
            .with_device_scale(device_scale_factor);
        if let Some(parent) = ParentView::from_raw(parent_view) {
            builder = builder.with_parent_view(parent);
        }
        if let Some(callback) = paint_callback {
            builder = builder.with_paint_handler(ExternPaintCallback { callback, user_data });
        }

        match builder.build() {
            Ok(browser) => {
                let key = browser.id().get();
                registry().insert(key, browser);
                debug!(target: "ffi", "Browser handle {:#x} issued", key);
                key as usize as *mut stoa_cef_browser_t
            }
            Err(e) => {
                error!(target: "ffi", "stoa_cef_browser_create failed: {}", e);
                ptr::null_mut()
            }
        }
    })
}

/// Destroys a browser. The paint callback is not invoked after this
/// returns. Null, unknown and already destroyed handles are ignored.
#[no_mangle]
pub extern "C" fn stoa_cef_browser_destroy(browser: *mut stoa_cef_browser_t) {
    guard("stoa_cef_browser_destroy", (), || {
        let Some(key) = handle_key(browser) else {
            return;
        };

        // Released outside the registry lock: destroy waits for an
        // in-flight paint, whose callback may call back into the bridge.
        let removed = registry().remove(&key);
        match removed {
            Some(mut browser) => browser.destroy(),
            None => debug!(target: "ffi", "Destroy of unknown handle {:#x} ignored", key),
        }
    })
}

//=========================================================================
// Browser Control
//=========================================================================

#[no_mangle]
pub extern "C" fn stoa_cef_browser_resize(browser: *mut stoa_cef_browser_t, width: c_int, height: c_int) {
    guard("stoa_cef_browser_resize", (), || {
        with_browser(browser, "stoa_cef_browser_resize", |b| b.resize(width, height))
    })
}

#[no_mangle]
pub unsafe extern "C" fn stoa_cef_browser_load_url(browser: *mut stoa_cef_browser_t, url: *const c_char) {
    let Some(url) = read_str(url) else {
        warn!(target: "ffi", "stoa_cef_browser_load_url: null URL");
        return;
    };
    guard("stoa_cef_browser_load_url", (), || {
        with_browser(browser, "stoa_cef_browser_load_url", |b| b.load_url(&url))
    })
}

#[no_mangle]
pub extern "C" fn stoa_cef_browser_set_device_scale(browser: *mut stoa_cef_browser_t, device_scale_factor: f32) {
    guard("stoa_cef_browser_set_device_scale", (), || {
        with_browser(browser, "stoa_cef_browser_set_device_scale", |b| {
            b.set_device_scale(device_scale_factor)
        })
    })
}

#[no_mangle]
pub extern "C" fn stoa_cef_browser_set_focus(browser: *mut stoa_cef_browser_t, focus: bool) {
    guard("stoa_cef_browser_set_focus", (), || {
        with_browser(browser, "stoa_cef_browser_set_focus", |b| b.set_focus(focus))
    })
}

//=========================================================================
// Input
//=========================================================================

#[no_mangle]
pub extern "C" fn stoa_cef_browser_send_key_event(
    browser: *mut stoa_cef_browser_t,
    event_type: c_int,
    modifiers: c_int,
    character: u32,
    unmodified_character: u32,
    native_key_code: u32,
) {
    guard("stoa_cef_browser_send_key_event", (), || {
        let kind = match KeyEventType::try_from(event_type) {
            Ok(kind) => kind,
            Err(e) => {
                warn!(target: "ffi", "stoa_cef_browser_send_key_event: {}, event dropped", e);
                return;
            }
        };
        let event = KeyEvent {
            kind,
            modifiers: Modifiers::from_raw(modifiers),
            character,
            unmodified_character,
            native_key_code,
        };
        with_browser(browser, "stoa_cef_browser_send_key_event", |b| b.send_key_event(event))
    })
}

#[no_mangle]
pub extern "C" fn stoa_cef_browser_send_mouse_move(
    browser: *mut stoa_cef_browser_t,
    x: c_int,
    y: c_int,
    modifiers: c_int,
    mouse_leave: bool,
) {
    guard("stoa_cef_browser_send_mouse_move", (), || {
        with_browser(browser, "stoa_cef_browser_send_mouse_move", |b| {
            b.send_mouse_move(x, y, Modifiers::from_raw(modifiers), mouse_leave)
        })
    })
}

#[no_mangle]
pub extern "C" fn stoa_cef_browser_send_mouse_click(
    browser: *mut stoa_cef_browser_t,
    x: c_int,
    y: c_int,
    modifiers: c_int,
    button: c_int,
    mouse_up: bool,
    click_count: c_int,
) {
    guard("stoa_cef_browser_send_mouse_click", (), || {
        let button = match MouseButton::try_from(button) {
            Ok(button) => button,
            Err(e) => {
                warn!(target: "ffi", "stoa_cef_browser_send_mouse_click: {}, event dropped", e);
                return;
            }
        };
        with_browser(browser, "stoa_cef_browser_send_mouse_click", |b| {
            b.send_mouse_click(x, y, Modifiers::from_raw(modifiers), button, mouse_up, click_count)
        })
    })
}

#[no_mangle]
pub extern "C" fn stoa_cef_browser_send_mouse_wheel(
    browser: *mut stoa_cef_browser_t,
    x: c_int,
    y: c_int,
    modifiers: c_int,
    delta_x: c_int,
    delta_y: c_int,
) {
    guard("stoa_cef_browser_send_mouse_wheel", (), || {
        with_browser(browser, "stoa_cef_browser_send_mouse_wheel", |b| {
            b.send_mouse_wheel(x, y, Modifiers::from_raw(modifiers), delta_x, delta_y)
        })
    })
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BrowserId;
    use crate::core::view::MAX_VIEW_DIMENSION;
    use crate::engine::{EngineCall, HeadlessEngine, PaintMode, RecordingEngine, RecordingHandle};
    use std::ffi::CString;

    //--- Test Helpers -----------------------------------------------------

    type PaintLog = Mutex<Vec<(c_int, c_int, c_int)>>;

    unsafe extern "C" fn record_paint(
        user_data: *mut c_void,
        width: c_int,
        height: c_int,
        buffer: *const c_void,
        buffer_length: c_int,
    ) {
        if buffer.is_null() {
            return;
        }
        let log = &*(user_data as *const PaintLog);
        log.lock().unwrap().push((width, height, buffer_length));
    }

    fn start(engine: RecordingEngine) -> RecordingHandle {
        let recorder = engine.recorder();
        runtime::install_engine(Box::new(engine)).unwrap();
        let ok = unsafe {
            stoa_cef_initialize(
                0,
                ptr::null_mut(),
                ptr::null(),
                ptr::null(),
                ptr::null(),
                ptr::null(),
                0,
            )
        };
        assert!(ok);
        recorder
    }

    unsafe fn create(url: &str, log: Option<&PaintLog>) -> *mut stoa_cef_browser_t {
        let url = CString::new(url).unwrap();
        let (user_data, callback): (*mut c_void, stoa_cef_paint_callback) = match log {
            Some(log) => (log as *const PaintLog as *mut c_void, Some(record_paint)),
            None => (ptr::null_mut(), None),
        };
        stoa_cef_browser_create(url.as_ptr(), 8, 4, ptr::null_mut(), 1.0, user_data, callback)
    }

    fn id_of(handle: *mut stoa_cef_browser_t) -> BrowserId {
        BrowserId::new(handle as usize as u64)
    }

    //=====================================================================
    // Lifecycle Tests
    //=====================================================================

    #[test]
    fn initialize_create_destroy_shutdown() {
        let _guard = runtime::testing::exclusive();
        let recorder = start(RecordingEngine::new());

        let handle = unsafe { create("https://example.com/", None) };
        assert!(!handle.is_null());
        assert_eq!(runtime::live_browser_count(), 1);

        stoa_cef_browser_destroy(handle);
        stoa_cef_shutdown();

        assert!(!runtime::is_initialized());
        assert!(recorder.is_closed(id_of(handle)));
    }

    #[test]
    fn negative_debug_port_fails_initialize() {
        let _guard = runtime::testing::exclusive();
        runtime::install_engine(Box::new(RecordingEngine::new())).unwrap();

        let ok = unsafe {
            stoa_cef_initialize(0, ptr::null_mut(), ptr::null(), ptr::null(), ptr::null(), ptr::null(), -1)
        };
        assert!(!ok);
        assert!(!runtime::is_initialized());
    }

    #[test]
    fn initialize_passes_arguments() {
        let _guard = runtime::testing::exclusive();
        let engine = RecordingEngine::new();
        let recorder = engine.recorder();
        runtime::install_engine(Box::new(engine)).unwrap();

        let program = CString::new("stoa").unwrap();
        let flag = CString::new("--enable-thing").unwrap();
        let mut argv = [program.as_ptr() as *mut c_char, flag.as_ptr() as *mut c_char];
        let ok = unsafe {
            stoa_cef_initialize(2, argv.as_mut_ptr(), ptr::null(), ptr::null(), ptr::null(), ptr::null(), 0)
        };
        assert!(ok);
        match &recorder.calls()[0] {
            EngineCall::Initialize { args } => {
                assert_eq!(args[..2], ["stoa".to_string(), "--enable-thing".to_string()]);
            }
            other => panic!("expected Initialize, got {:?}", other),
        }
        stoa_cef_shutdown();
    }

    #[test]
    fn execute_process_encoding() {
        let _guard = runtime::testing::exclusive();
        runtime::install_engine(Box::new(RecordingEngine::new())).unwrap();
        assert_eq!(unsafe { stoa_cef_execute_process(0, ptr::null_mut()) }, -1);

        runtime::install_engine(Box::new(RecordingEngine::new().as_helper(5))).unwrap();
        assert_eq!(unsafe { stoa_cef_execute_process(0, ptr::null_mut()) }, 5);
    }

    #[test]
    fn create_before_initialize_returns_null() {
        let _guard = runtime::testing::exclusive();
        let handle = unsafe { create("about:blank", None) };
        assert!(handle.is_null());
    }

    #[test]
    fn shutdown_with_live_browser_is_refused() {
        let _guard = runtime::testing::exclusive();
        start(RecordingEngine::new());

        let handle = unsafe { create("about:blank", None) };
        stoa_cef_shutdown();
        assert!(runtime::is_initialized());

        stoa_cef_browser_destroy(handle);
        stoa_cef_shutdown();
        assert!(!runtime::is_initialized());
    }

    #[test]
    fn panicking_pump_leaves_runtime_usable() {
        let _guard = runtime::testing::exclusive();
        start(RecordingEngine::new().panicking_on_pump());

        let handle = unsafe { create("about:blank", None) };
        stoa_cef_do_message_loop_work();
        stoa_cef_do_message_loop_work();

        stoa_cef_browser_destroy(handle);
        assert_eq!(runtime::live_browser_count(), 0);
        stoa_cef_shutdown();
        assert!(!runtime::is_initialized());
    }

    #[test]
    fn oversized_view_paints_capped_frames() {
        let _guard = runtime::testing::exclusive();
        runtime::install_engine(Box::new(HeadlessEngine::with_paint_mode(PaintMode::Inline)))
            .unwrap();
        let ok = unsafe {
            stoa_cef_initialize(0, ptr::null_mut(), ptr::null(), ptr::null(), ptr::null(), ptr::null(), 0)
        };
        assert!(ok);

        let log: PaintLog = Mutex::new(Vec::new());
        let url = CString::new("about:blank").unwrap();
        let handle = unsafe {
            stoa_cef_browser_create(
                url.as_ptr(),
                c_int::MAX,
                1,
                ptr::null_mut(),
                1.0,
                &log as *const PaintLog as *mut c_void,
                Some(record_paint),
            )
        };
        assert!(!handle.is_null());

        stoa_cef_do_message_loop_work();
        let max = MAX_VIEW_DIMENSION as c_int;
        assert_eq!(*log.lock().unwrap(), vec![(max, 1, max * 4)]);

        stoa_cef_browser_destroy(handle);
        stoa_cef_shutdown();
        assert!(!runtime::is_initialized());
    }

    //=====================================================================
    // Handle Tests
    //=====================================================================

    #[test]
    fn null_and_unknown_handles_are_ignored() {
        let _guard = runtime::testing::exclusive();
        let recorder = start(RecordingEngine::new());
        let unknown = 0xDEAD_usize as *mut stoa_cef_browser_t;

        for handle in [ptr::null_mut(), unknown] {
            stoa_cef_browser_resize(handle, 10, 10);
            stoa_cef_browser_set_focus(handle, true);
            stoa_cef_browser_set_device_scale(handle, 2.0);
            stoa_cef_browser_send_key_event(handle, 1, 0, 0, 0, 0);
            stoa_cef_browser_send_mouse_move(handle, 1, 1, 0, false);
            stoa_cef_browser_send_mouse_click(handle, 1, 1, 0, 0, false, 1);
            stoa_cef_browser_send_mouse_wheel(handle, 1, 1, 0, 0, 10);
            stoa_cef_browser_destroy(handle);
        }

        assert_eq!(recorder.calls().len(), 1, "Only initialize reached the engine");
        stoa_cef_shutdown();
    }

    #[test]
    fn double_destroy_is_a_noop() {
        let _guard = runtime::testing::exclusive();
        let recorder = start(RecordingEngine::new());

        let handle = unsafe { create("about:blank", None) };
        stoa_cef_browser_destroy(handle);
        stoa_cef_browser_destroy(handle);
        stoa_cef_browser_resize(handle, 5, 5);

        assert_eq!(recorder.log().count(|c| matches!(c, EngineCall::Close { .. })), 1);
        assert_eq!(runtime::live_browser_count(), 0);
        stoa_cef_shutdown();
    }

    //=====================================================================
    // Input Tests
    //=====================================================================

    #[test]
    fn invalid_enum_values_are_dropped() {
        let _guard = runtime::testing::exclusive();
        let recorder = start(RecordingEngine::new());

        let handle = unsafe { create("about:blank", None) };
        let id = id_of(handle);
        stoa_cef_browser_send_key_event(handle, 9, 0, 0, 0, 0);
        stoa_cef_browser_send_mouse_click(handle, 0, 0, 0, 3, false, 1);
        stoa_cef_browser_send_key_event(handle, 2, 0, 0, 0, 0x31);

        let inputs: Vec<EngineCall> = recorder
            .log()
            .for_browser(id)
            .into_iter()
            .filter(|c| matches!(c, EngineCall::Key { .. } | EngineCall::MouseClick { .. }))
            .collect();
        assert_eq!(inputs.len(), 1);
        assert!(matches!(
            inputs[0],
            EngineCall::Key { event: KeyEvent { kind: KeyEventType::Up, native_key_code: 0x31, .. }, .. }
        ));

        stoa_cef_browser_destroy(handle);
        stoa_cef_shutdown();
    }

    #[test]
    fn modifier_bits_pass_through() {
        let _guard = runtime::testing::exclusive();
        let recorder = start(RecordingEngine::new());

        let handle = unsafe { create("about:blank", None) };
        let raw = (Modifiers::SHIFT | Modifiers::COMMAND).to_raw() | (1 << 20);
        stoa_cef_browser_send_mouse_move(handle, 2, 3, raw, true);

        let moved = recorder.log().for_browser(id_of(handle)).into_iter().find_map(|c| match c {
            EngineCall::MouseMove { event, .. } => Some(event),
            _ => None,
        });
        let event = moved.unwrap();
        assert_eq!(event.modifiers.to_raw(), raw);
        assert!(event.mouse_leave);

        stoa_cef_browser_destroy(handle);
        stoa_cef_shutdown();
    }

    //=====================================================================
    // Paint Tests
    //=====================================================================

    #[test]
    fn paint_callback_receives_frames_until_destroy() {
        let _guard = runtime::testing::exclusive();
        let recorder = start(RecordingEngine::new());
        let log: PaintLog = Mutex::new(Vec::new());

        let handle = unsafe { create("about:blank", Some(&log)) };
        let id = id_of(handle);
        assert!(recorder.emit(id, 8, 4));

        stoa_cef_browser_destroy(handle);
        assert!(!recorder.emit(id, 8, 4));

        assert_eq!(*log.lock().unwrap(), vec![(8, 4, 8 * 4 * 4)]);
        stoa_cef_shutdown();
    }

    #[test]
    fn null_paint_callback_is_allowed() {
        let _guard = runtime::testing::exclusive();
        let recorder = start(RecordingEngine::new());

        let handle = unsafe { create("about:blank", None) };
        assert!(!recorder.emit(id_of(handle), 2, 2));

        stoa_cef_browser_destroy(handle);
        stoa_cef_shutdown();
    }

    #[test]
    fn load_url_reaches_engine() {
        let _guard = runtime::testing::exclusive();
        let recorder = start(RecordingEngine::new());

        let handle = unsafe { create("about:blank", None) };
        let url = CString::new("https://example.org/").unwrap();
        unsafe { stoa_cef_browser_load_url(handle, url.as_ptr()) };
        unsafe { stoa_cef_browser_load_url(handle, ptr::null()) };

        let id = id_of(handle);
        assert_eq!(
            recorder.log().count(|c| matches!(c, EngineCall::LoadUrl { .. })),
            1
        );
        assert!(recorder.log().for_browser(id).contains(&EngineCall::LoadUrl {
            id,
            url: "https://example.org/".to_string()
        }));

        stoa_cef_browser_destroy(handle);
        stoa_cef_shutdown();
    }
}
