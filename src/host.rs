//=========================================================================
// Demo Host
//
// Windowed host driving one browser through the bridge.
//
// Architecture:
// ```text
//     HostBuilder  ──build()──>  Host  ──run(&Settings)──>  [Runtime]
//         │                        │
//         ├─ with_url()            ├─ runtime::initialize()
//         ├─ with_size()           ├─ Platform event loop (blocks)
//         ├─ with_channel_capacity()   └─ window + browser + pump
//         └─ with_dump_path()      └─ runtime::shutdown()
// ```
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::path::PathBuf;

//=== External Dependencies ===============================================

use log::info;

//=== Internal Dependencies ===============================================

use crate::config::Settings;
use crate::error::BridgeError;
use crate::platform::{Platform, PlatformError};
use crate::runtime;

//=== HostConfig ==========================================================

/// Values fixed by [`HostBuilder`], consumed by the platform layer.
#[derive(Debug, Clone)]
pub(crate) struct HostConfig {
    pub url: String,
    pub width: i32,
    pub height: i32,
    pub channel_capacity: usize,
    pub dump_path: Option<PathBuf>,
    pub exit_after_dump: bool,
}

//=== HostError ===========================================================

#[derive(thiserror::Error, Debug)]
pub enum HostError {
    #[error("bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

//=== HostBuilder =========================================================

/// Builder for configuring and constructing a [`Host`].
///
/// # Default Values
///
/// - **URL**: `about:blank`
/// - **Size**: 1024×768 (logical)
/// - **Channel capacity**: 4 frames
/// - **Dump path**: none
///
/// # Examples
///
/// ```no_run
/// use stoa_bridge::config::Settings;
/// use stoa_bridge::HostBuilder;
///
/// let settings = Settings::builder().apply_env().build();
///
/// HostBuilder::new()
///     .with_url("https://example.com/")
///     .with_size(1280, 800)
///     .with_dump_path("/tmp/first-frame.png")
///     .build()
///     .run(&settings)
///     .unwrap();
/// ```
pub struct HostBuilder {
    config: HostConfig,
}

impl HostBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: HostConfig {
                url: "about:blank".to_string(),
                width: 1024,
                height: 768,
                channel_capacity: 4,
                dump_path: None,
                exit_after_dump: false,
            },
        }
    }

    /// Sets the URL loaded at start-up.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    /// Sets the initial logical window size.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is not positive.
    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        assert!(
            width > 0 && height > 0,
            "Window size must be positive, got {}x{}",
            width,
            height
        );
        self.config.width = width;
        self.config.height = height;
        self
    }

    /// Sets how many painted frames may wait for the UI thread.
    ///
    /// Frames beyond this are dropped on the paint thread rather than
    /// blocking it.
    ///
    /// Default: 4
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "Channel capacity must be positive");
        self.config.channel_capacity = capacity;
        self
    }

    /// Writes the first painted frame to `path` as PNG.
    pub fn with_dump_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.dump_path = Some(path.into());
        self
    }

    /// Closes the host once the frame dump is written.
    pub fn with_exit_after_dump(mut self, exit: bool) -> Self {
        self.config.exit_after_dump = exit;
        self
    }

    /// Builds the host instance.
    pub fn build(self) -> Host {
        info!(
            target: "host",
            "Building host (url: {}, {}x{}, channel: {})",
            self.config.url,
            self.config.width,
            self.config.height,
            self.config.channel_capacity
        );
        Host { config: self.config }
    }

    #[cfg(test)]
    pub(crate) fn config(self) -> HostConfig {
        self.config
    }
}

impl Default for HostBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//=== Host ================================================================

/// Windowed demo host. Create via [`HostBuilder`].
pub struct Host {
    config: HostConfig,
}

impl Host {
    /// Initializes the runtime, runs the window until it closes, then shuts
    /// the runtime down. Must be called on the main thread.
    ///
    /// Returns the number of frames received.
    ///
    /// # Errors
    ///
    /// - [`HostError::Bridge`] if the runtime cannot start or stop
    /// - [`HostError::Platform`] if the window, browser or dump fails
    pub fn run(self, settings: &Settings) -> Result<u64, HostError> {
        runtime::initialize(settings)?;
        info!(target: "host", "Runtime up, entering event loop");

        let outcome = Platform::new(self.config).run();

        //--- Shutdown runs even when the platform failed -----------------
        let shutdown = runtime::shutdown();
        let frames = outcome?;
        shutdown?;

        info!(target: "host", "Host shutdown complete ({} frame(s))", frames);
        Ok(frames)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
