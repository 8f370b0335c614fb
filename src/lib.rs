//=========================================================================
// Stoa Bridge: Library Root
//
// C-linkage bridge around an embedded, off-screen browser engine, plus the
// safe Rust API it is built on.
//
// Responsibilities:
// - Expose the `stoa_cef_*` C surface (`ffi`, `include/stoa_cef_bridge.h`)
// - Own process lifecycle and the installed engine (`runtime`)
// - Wrap engine browsers in an owning handle (`Browser`)
// - Define the engine seam and ship a headless and a recording engine
// - Provide a winit demo host (`Host`) used by the `stoa_host` binary
//
// Typical usage:
// ```no_run
// use stoa_bridge::prelude::*;
//
// if let ProcessRole::Helper(code) = runtime::execute_process(&[]) {
//     std::process::exit(code);
// }
// runtime::initialize(&Settings::default()).unwrap();
//
// let mut browser = BrowserBuilder::new("https://example.com/")
//     .with_paint_handler(|frame: &Frame<'_>| { /* BGRA pixels */ })
//     .build()
//     .unwrap();
//
// runtime::do_message_loop_work().unwrap();
// browser.destroy();
// runtime::shutdown().unwrap();
// ```
//
//=========================================================================

//--- Public Modules ------------------------------------------------------
//
// `core` holds engine-independent types (input, paint, view geometry,
// host frame channel). `engine` is the seam engines implement.
//
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod logging;
pub mod prelude;
pub mod runtime;

//--- Internal Modules ----------------------------------------------------
//
// `platform` contains the winit window and event loop for the demo host
// and is kept private; `host` is its public facade.
//
mod browser;
mod host;
mod platform;

//--- Public Exports ------------------------------------------------------

pub use browser::{Browser, BrowserBuilder};
pub use error::{BridgeError, BridgeResult, EngineError};
pub use host::{Host, HostBuilder, HostError};
pub use platform::{DumpError, PlatformError};
