//=========================================================================
// Process Runtime
//
// Process-wide singleton owning the installed engine and the lifecycle
// state shared by every browser.
//
// Lifecycle:
// ```text
//   Uninitialized ──initialize()──► Running { ui_thread } ──shutdown()──► ShutDown
//         ▲                                                                  │
//         └──────────────────────── initialize() again ──────────────────────┘
// ```
//
// Ordering rules:
// - `install_engine` before `initialize` (default: HeadlessEngine)
// - `execute_process` first thing in `main`, before `initialize`
// - the thread calling `initialize` becomes the UI thread; message loop
//   work is only accepted there
// - `shutdown` only once every browser is destroyed
//
// The engine is taken out of the singleton while it runs a message loop
// slice, so a paint handler re-entering the runtime gets an error instead
// of a deadlock.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, ThreadId};

//=== External Crates =====================================================

use log::{debug, error, info, warn};

//=== Internal Imports ====================================================

use crate::config::Settings;
use crate::core::paint::PaintSink;
use crate::core::BrowserId;
use crate::engine::{BrowserParams, Engine, EngineBrowser, HeadlessEngine, ProcessRole};
use crate::error::{BridgeError, BridgeResult, EngineError};
use crate::logging;

//=== Lifecycle ===========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Uninitialized,
    Running { ui_thread: ThreadId },
    ShutDown,
}

//=== Runtime =============================================================

struct Runtime {
    engine: Option<Box<dyn Engine>>,
    engine_busy: bool,
    lifecycle: Lifecycle,
    live_browsers: usize,
}

impl Runtime {
    const fn new() -> Self {
        Self {
            engine: None,
            engine_busy: false,
            lifecycle: Lifecycle::Uninitialized,
            live_browsers: 0,
        }
    }

    fn ui_thread(&self) -> Option<ThreadId> {
        match self.lifecycle {
            Lifecycle::Running { ui_thread } => Some(ui_thread),
            _ => None,
        }
    }

    fn engine_mut(&mut self) -> BridgeResult<&mut Box<dyn Engine>> {
        if self.engine_busy {
            return Err(BridgeError::Reentrant);
        }
        Ok(self
            .engine
            .get_or_insert_with(|| Box::new(HeadlessEngine::new())))
    }
}

static RUNTIME: Mutex<Runtime> = Mutex::new(Runtime::new());
static NEXT_BROWSER_ID: AtomicU64 = AtomicU64::new(1);

fn runtime() -> MutexGuard<'static, Runtime> {
    RUNTIME.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

//=== Public API ==========================================================

/// Selects the engine used by the next [`initialize`].
///
/// Fails while the runtime is running. Replaces any previously installed
/// engine.
pub fn install_engine(engine: Box<dyn Engine>) -> BridgeResult<()> {
    let mut rt = runtime();
    if matches!(rt.lifecycle, Lifecycle::Running { .. }) || rt.engine_busy {
        return Err(BridgeError::AlreadyInitialized);
    }
    info!(target: "runtime", "Installing engine '{}'", engine.name());
    rt.engine = Some(engine);
    Ok(())
}

/// Entry point for helper sub-processes.
///
/// Call first thing in `main`. When it returns [`ProcessRole::Helper`],
/// the process was launched as an engine helper that has finished its
/// work and should exit with the given code.
pub fn execute_process(args: &[String]) -> ProcessRole {
    let mut rt = runtime();
    let role = match rt.engine_mut() {
        Ok(engine) => engine.execute_process(args),
        Err(e) => {
            error!(target: "runtime", "execute_process: {}", e);
            ProcessRole::Browser
        }
    };
    debug!(target: "runtime", "execute_process → {:?}", role);
    role
}

/// Starts the engine. The calling thread becomes the UI thread.
///
/// # Errors
///
/// - [`BridgeError::AlreadyInitialized`] if the runtime is running
/// - [`BridgeError::Engine`] if the engine cannot start
pub fn initialize(settings: &Settings) -> BridgeResult<()> {
    logging::init(settings);

    let mut rt = runtime();
    if matches!(rt.lifecycle, Lifecycle::Running { .. }) {
        return Err(BridgeError::AlreadyInitialized);
    }

    let engine = rt.engine_mut()?;
    let name = engine.name();
    engine.initialize(settings)?;

    let ui_thread = thread::current().id();
    rt.lifecycle = Lifecycle::Running { ui_thread };
    info!(target: "runtime", "Runtime initialized with '{}' engine on {:?}", name, ui_thread);
    Ok(())
}

/// Stops the engine.
///
/// # Errors
///
/// - [`BridgeError::NotInitialized`] if the runtime is not running
/// - [`BridgeError::BrowsersAlive`] if browsers are still alive
pub fn shutdown() -> BridgeResult<()> {
    let mut rt = runtime();
    let ui_thread = rt.ui_thread().ok_or(BridgeError::NotInitialized)?;

    let current = thread::current().id();
    if current != ui_thread {
        warn!(target: "runtime", "shutdown called off the UI thread ({:?})", current);
    }

    if rt.live_browsers > 0 {
        return Err(BridgeError::BrowsersAlive(rt.live_browsers));
    }

    rt.engine_mut()?.shutdown();
    rt.lifecycle = Lifecycle::ShutDown;
    info!(target: "runtime", "Runtime shut down");
    Ok(())
}

/// Runs one slice of engine work. UI thread only.
///
/// A panic inside the engine is contained: the engine is handed back to
/// the runtime and the slice reports [`EngineError::Panicked`].
pub fn do_message_loop_work() -> BridgeResult<()> {
    let mut engine = {
        let mut rt = runtime();
        let ui_thread = rt.ui_thread().ok_or(BridgeError::NotInitialized)?;
        let current = thread::current().id();
        if current != ui_thread {
            return Err(BridgeError::WrongThread {
                expected: ui_thread,
                actual: current,
            });
        }
        if rt.engine_busy {
            return Err(BridgeError::Reentrant);
        }
        let engine = rt.engine.take().ok_or(BridgeError::NotInitialized)?;
        rt.engine_busy = true;
        engine
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| engine.do_message_loop_work()));

    let mut rt = runtime();
    rt.engine = Some(engine);
    rt.engine_busy = false;
    drop(rt);

    outcome.map_err(|payload| {
        let message = panic_message(payload.as_ref());
        error!(target: "runtime", "Engine panicked during message loop work: {}", message);
        EngineError::Panicked(message).into()
    })
}

/// `true` between a successful [`initialize`] and [`shutdown`].
pub fn is_initialized() -> bool {
    matches!(runtime().lifecycle, Lifecycle::Running { .. })
}

/// Number of browsers created and not yet destroyed.
pub fn live_browser_count() -> usize {
    runtime().live_browsers
}

//--- Internal Helpers ----------------------------------------------------

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

//=== Crate API ===========================================================

pub(crate) fn next_browser_id() -> BrowserId {
    BrowserId::new(NEXT_BROWSER_ID.fetch_add(1, Ordering::Relaxed))
}

/// Allocates an engine browser and counts it as live.
pub(crate) fn create_browser(
    params: BrowserParams,
    sink: PaintSink,
) -> BridgeResult<Box<dyn EngineBrowser>> {
    let mut rt = runtime();
    let ui_thread = rt.ui_thread().ok_or(BridgeError::NotInitialized)?;

    let current = thread::current().id();
    if current != ui_thread {
        warn!(target: "runtime", "Browser {} created off the UI thread ({:?})", params.id, current);
    }

    let browser = rt.engine_mut()?.create_browser(params, sink)?;
    rt.live_browsers += 1;
    Ok(browser)
}

/// Marks one browser as destroyed.
pub(crate) fn browser_released(id: BrowserId) {
    let mut rt = runtime();
    match rt.live_browsers.checked_sub(1) {
        Some(count) => rt.live_browsers = count,
        None => error!(target: "runtime", "Browser {} released with no live browsers", id),
    }
}

//=========================================================================
// Test Support
//=========================================================================

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    static SERIAL: Mutex<()> = Mutex::new(());

    /// Serializes tests touching the process-wide runtime and resets it.
    pub(crate) fn exclusive() -> MutexGuard<'static, ()> {
        let guard = SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        reset();
        guard
    }

    fn reset() {
        let mut rt = runtime();
        let lifecycle = rt.lifecycle;
        if let (Some(engine), Lifecycle::Running { .. }) = (rt.engine.as_mut(), lifecycle) {
            engine.shutdown();
        }
        *rt = Runtime::new();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::paint::Frame;
    use crate::core::view::{DeviceScale, ViewSize};
    use crate::engine::{EngineCall, RecordingEngine};

    //--- Test Helpers -----------------------------------------------------

    fn params() -> BrowserParams {
        BrowserParams {
            id: next_browser_id(),
            url: "about:blank".into(),
            size: ViewSize::clamped(2, 2),
            scale: DeviceScale::ONE,
            parent_view: None,
        }
    }

    fn sink(id: BrowserId) -> PaintSink {
        PaintSink::detached(id, |_: &Frame<'_>| {})
    }

    //=====================================================================
    // Lifecycle Tests
    //=====================================================================

    #[test]
    fn initialize_then_shutdown_without_browsers() {
        let _guard = testing::exclusive();
        let engine = RecordingEngine::new();
        let recorder = engine.recorder();
        install_engine(Box::new(engine)).unwrap();

        initialize(&Settings::default()).unwrap();
        assert!(is_initialized());
        shutdown().unwrap();

        assert!(!is_initialized());
        assert_eq!(live_browser_count(), 0);
        assert_eq!(recorder.log().count(|c| *c == EngineCall::Shutdown), 1);
    }

    #[test]
    fn double_initialize_is_rejected() {
        let _guard = testing::exclusive();
        install_engine(Box::new(RecordingEngine::new())).unwrap();

        initialize(&Settings::default()).unwrap();
        assert!(matches!(
            initialize(&Settings::default()),
            Err(BridgeError::AlreadyInitialized)
        ));
        shutdown().unwrap();
    }

    #[test]
    fn reinitialize_after_shutdown() {
        let _guard = testing::exclusive();
        install_engine(Box::new(RecordingEngine::new())).unwrap();

        initialize(&Settings::default()).unwrap();
        shutdown().unwrap();
        initialize(&Settings::default()).unwrap();
        assert!(is_initialized());
        shutdown().unwrap();
    }

    #[test]
    fn engine_failure_leaves_runtime_uninitialized() {
        let _guard = testing::exclusive();
        install_engine(Box::new(RecordingEngine::new().failing_initialize())).unwrap();

        assert!(matches!(
            initialize(&Settings::default()),
            Err(BridgeError::Engine(_))
        ));
        assert!(!is_initialized());
    }

    #[test]
    fn install_engine_refused_while_running() {
        let _guard = testing::exclusive();
        install_engine(Box::new(RecordingEngine::new())).unwrap();
        initialize(&Settings::default()).unwrap();

        assert!(install_engine(Box::new(RecordingEngine::new())).is_err());
        shutdown().unwrap();
    }

    #[test]
    fn shutdown_refused_with_live_browsers() {
        let _guard = testing::exclusive();
        install_engine(Box::new(RecordingEngine::new())).unwrap();
        initialize(&Settings::default()).unwrap();

        let p = params();
        let id = p.id;
        let mut browser = create_browser(p, sink(id)).unwrap();
        assert!(matches!(shutdown(), Err(BridgeError::BrowsersAlive(1))));

        browser.close();
        browser_released(id);
        shutdown().unwrap();
    }

    #[test]
    fn shutdown_before_initialize_fails() {
        let _guard = testing::exclusive();
        assert!(matches!(shutdown(), Err(BridgeError::NotInitialized)));
    }

    //=====================================================================
    // Message Loop Tests
    //=====================================================================

    #[test]
    fn message_loop_requires_initialize() {
        let _guard = testing::exclusive();
        assert!(matches!(
            do_message_loop_work(),
            Err(BridgeError::NotInitialized)
        ));
    }

    #[test]
    fn message_loop_is_ui_thread_only() {
        let _guard = testing::exclusive();
        let engine = RecordingEngine::new();
        let recorder = engine.recorder();
        install_engine(Box::new(engine)).unwrap();
        initialize(&Settings::default()).unwrap();

        do_message_loop_work().unwrap();
        let off_thread = thread::spawn(do_message_loop_work).join().unwrap();
        assert!(matches!(off_thread, Err(BridgeError::WrongThread { .. })));

        assert_eq!(recorder.log().count(|c| *c == EngineCall::MessageLoopWork), 1);
        shutdown().unwrap();
    }

    #[test]
    fn paint_handler_reentry_is_rejected() {
        let _guard = testing::exclusive();
        install_engine(Box::new(RecordingEngine::new().painting_on_pump())).unwrap();
        initialize(&Settings::default()).unwrap();

        let (tx, rx) = crossbeam_channel::unbounded();
        let p = params();
        let id = p.id;
        let reentrant = PaintSink::detached(id, move |_: &Frame<'_>| {
            let _ = tx.send(do_message_loop_work());
        });
        let mut browser = create_browser(p, reentrant).unwrap();

        do_message_loop_work().unwrap();
        assert!(matches!(rx.try_recv(), Ok(Err(BridgeError::Reentrant))));

        browser.close();
        browser_released(id);
        shutdown().unwrap();
    }

    #[test]
    fn engine_panic_during_pump_is_contained() {
        let _guard = testing::exclusive();
        let engine = RecordingEngine::new().panicking_on_pump();
        let recorder = engine.recorder();
        install_engine(Box::new(engine)).unwrap();
        initialize(&Settings::default()).unwrap();

        assert!(matches!(
            do_message_loop_work(),
            Err(BridgeError::Engine(EngineError::Panicked(_)))
        ));
        assert!(matches!(
            do_message_loop_work(),
            Err(BridgeError::Engine(EngineError::Panicked(_)))
        ));
        assert_eq!(recorder.log().count(|c| *c == EngineCall::MessageLoopWork), 2);

        shutdown().unwrap();
        assert!(!is_initialized());
        assert_eq!(recorder.log().count(|c| *c == EngineCall::Shutdown), 1);

        install_engine(Box::new(RecordingEngine::new())).unwrap();
        initialize(&Settings::default()).unwrap();
        do_message_loop_work().unwrap();
        shutdown().unwrap();
    }

    #[test]
    fn initialize_hands_engine_the_switches() {
        let _guard = testing::exclusive();
        let engine = RecordingEngine::new();
        let recorder = engine.recorder();
        install_engine(Box::new(engine)).unwrap();

        let settings = Settings::builder()
            .with_args(["stoa"])
            .with_remote_debugging_port(9222)
            .build();
        initialize(&settings).unwrap();

        assert_eq!(
            recorder.calls()[0],
            EngineCall::Initialize {
                args: vec![
                    "stoa".to_string(),
                    "--use-mock-keychain".to_string(),
                    "--remote-debugging-port=9222".to_string(),
                ]
            }
        );
        shutdown().unwrap();
    }

    //=====================================================================
    // Process Tests
    //=====================================================================

    #[test]
    fn execute_process_uses_installed_engine() {
        let _guard = testing::exclusive();
        install_engine(Box::new(RecordingEngine::new().as_helper(2))).unwrap();

        assert_eq!(execute_process(&["stoa".to_string()]), ProcessRole::Helper(2));
    }

    #[test]
    fn default_engine_is_headless() {
        let _guard = testing::exclusive();
        let args = vec!["stoa".to_string(), "--type=gpu-process".to_string()];
        assert_eq!(execute_process(&args), ProcessRole::Helper(0));
        assert_eq!(execute_process(&args[..1]), ProcessRole::Browser);
    }

    #[test]
    fn browser_ids_are_unique() {
        let a = next_browser_id();
        let b = next_browser_id();
        assert!(b > a);
    }
}
