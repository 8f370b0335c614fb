//=========================================================================
// Settings
//
// Process-wide engine configuration handed to `Engine::initialize`.
//
// Architecture:
// ```text
//     SettingsBuilder ──build()──> Settings ──> runtime::initialize()
//         │
//         ├─ with_args() / with_*_path()
//         ├─ with_remote_debugging_port()
//         └─ apply_env()   (STOA_CEF_LOG_PATH, STOA_CEF_ALLOW_KEYCHAIN,
//                           STOA_CHROMIUM_DEBUG)
// ```
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::path::{Path, PathBuf};

//=== Internal Dependencies ===============================================

use crate::error::{BridgeError, BridgeResult};

//=== Environment Keys ====================================================

/// File that receives log output instead of stderr.
pub const ENV_LOG_PATH: &str = "STOA_CEF_LOG_PATH";

/// `1` lets the engine use the OS keychain; anything else mocks it.
pub const ENV_ALLOW_KEYCHAIN: &str = "STOA_CEF_ALLOW_KEYCHAIN";

/// `1` enables debug logging.
pub const ENV_DEBUG: &str = "STOA_CHROMIUM_DEBUG";

/// URL the demo host opens on start.
pub const ENV_AUTOSTART_URL: &str = "STOA_CHROMIUM_AUTOSTART_URL";

/// PNG path the demo host writes its first frame to.
pub const ENV_DUMP_FRAME_PATH: &str = "STOA_CHROMIUM_DUMP_FRAME_PATH";

//=== Settings ============================================================

/// Engine configuration, built with [`SettingsBuilder`].
///
/// # Default Values
///
/// - **Paths**: unset (engine defaults)
/// - **Remote debugging**: disabled
/// - **Keychain**: mocked
/// - **Debug logging**: off
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    args: Vec<String>,
    framework_path: Option<PathBuf>,
    resources_path: Option<PathBuf>,
    locales_path: Option<PathBuf>,
    cache_path: Option<PathBuf>,
    remote_debugging_port: Option<u16>,
    allow_keychain: bool,
    debug: bool,
    log_path: Option<PathBuf>,
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder::new()
    }

    /// Process arguments as given by the host (program name first).
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn framework_path(&self) -> Option<&Path> {
        self.framework_path.as_deref()
    }

    pub fn resources_path(&self) -> Option<&Path> {
        self.resources_path.as_deref()
    }

    pub fn locales_path(&self) -> Option<&Path> {
        self.locales_path.as_deref()
    }

    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    pub fn remote_debugging_port(&self) -> Option<u16> {
        self.remote_debugging_port
    }

    pub fn allow_keychain(&self) -> bool {
        self.allow_keychain
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Switches derived from the settings, appended to the host arguments
    /// when starting the engine.
    pub fn engine_switches(&self) -> Vec<String> {
        let mut switches = Vec::new();
        if !self.allow_keychain {
            switches.push("--use-mock-keychain".to_string());
        }
        if let Some(port) = self.remote_debugging_port {
            switches.push(format!("--remote-debugging-port={}", port));
        }
        switches
    }

    /// Full command line handed to the engine: host arguments followed by
    /// [`Settings::engine_switches`].
    pub fn engine_args(&self) -> Vec<String> {
        let mut args = self.args.clone();
        args.extend(self.engine_switches());
        args
    }
}

//=== SettingsBuilder =====================================================

/// Fluent builder for [`Settings`].
#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_framework_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.framework_path = Some(path.into());
        self
    }

    pub fn with_resources_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.resources_path = Some(path.into());
        self
    }

    pub fn with_locales_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.locales_path = Some(path.into());
        self
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.cache_path = Some(path.into());
        self
    }

    /// Enables remote debugging on `port`.
    ///
    /// # Panics
    ///
    /// Panics if `port == 0`; leave the port unset to disable debugging.
    pub fn with_remote_debugging_port(mut self, port: u16) -> Self {
        assert!(port > 0, "Remote debugging port must be non-zero");
        self.settings.remote_debugging_port = Some(port);
        self
    }

    pub fn with_keychain(mut self, allow: bool) -> Self {
        self.settings.allow_keychain = allow;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.settings.debug = debug;
        self
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.log_path = Some(path.into());
        self
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`.
    pub fn apply_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_LOG_PATH).filter(|p| !p.is_empty()) {
            self.settings.log_path = Some(PathBuf::from(path));
        }
        if let Some(value) = lookup(ENV_ALLOW_KEYCHAIN) {
            self.settings.allow_keychain = is_enabled(&value);
        }
        if let Some(value) = lookup(ENV_DEBUG) {
            self.settings.debug = is_enabled(&value);
        }
        self
    }

    pub fn build(self) -> Settings {
        self.settings
    }
}

//=== Helpers =============================================================

fn is_enabled(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "yes" | "on")
}

/// Interprets the raw C debug port: 0 disables, 1..=65535 enables.
pub fn debug_port_from_raw(raw: i32) -> BridgeResult<Option<u16>> {
    match raw {
        0 => Ok(None),
        1..=65535 => Ok(Some(raw as u16)),
        other => Err(BridgeError::invalid_argument(format!(
            "remote debugging port {} out of range",
            other
        ))),
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
