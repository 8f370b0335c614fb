//=========================================================================
// Bridge Errors
//=========================================================================
//
// Error taxonomy for the safe API. The C boundary collapses every error
// into `false`, a null handle, or a logged no-op.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::path::PathBuf;
use std::thread::ThreadId;

//=== Result Alias ========================================================

pub type BridgeResult<T> = Result<T, BridgeError>;

//=== BridgeError =========================================================

/// Lifecycle and argument errors raised by the bridge itself.
#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    #[error("runtime is not initialized")]
    NotInitialized,

    #[error("runtime is already initialized")]
    AlreadyInitialized,

    #[error("{0} browser(s) still alive, destroy them before shutdown")]
    BrowsersAlive(usize),

    #[error("called from thread {actual:?}, expected UI thread {expected:?}")]
    WrongThread { expected: ThreadId, actual: ThreadId },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("runtime re-entered from inside an engine callback")]
    Reentrant,

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl BridgeError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

//=== EngineError =========================================================

/// Failures reported by an [`crate::engine::Engine`] implementation.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("engine failed to start: {0}")]
    Startup(String),

    #[error("missing engine resource: {}", .0.display())]
    MissingResource(PathBuf),

    #[error("browser allocation failed: {0}")]
    BrowserAllocation(String),

    #[error("engine is not running")]
    NotRunning,

    #[error("engine panicked: {0}")]
    Panicked(String),
}

impl EngineError {
    pub fn startup(msg: impl Into<String>) -> Self {
        Self::Startup(msg.into())
    }

    pub fn browser_allocation(msg: impl Into<String>) -> Self {
        Self::BrowserAllocation(msg.into())
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
