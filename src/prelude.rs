//=========================================================================
// Prelude
//=========================================================================
//
// Convenience module that re-exports commonly used types and traits.
//
// Usage:
//   use stoa_bridge::prelude::*;
//
//=========================================================================

//=== Public API ==========================================================

// Lifecycle
pub use crate::config::{Settings, SettingsBuilder};
pub use crate::engine::ProcessRole;
pub use crate::runtime;

// Browsers
pub use crate::browser::{Browser, BrowserBuilder};
pub use crate::core::BrowserId;

// Input
pub use crate::core::input::{
    InputEvent, KeyEvent, KeyEventType, Modifiers, MouseButton, MouseClickEvent, MouseMoveEvent,
    MouseWheelEvent,
};

// Paint
pub use crate::core::paint::{Frame, OwnedFrame, PaintHandler};

// Errors
pub use crate::error::{BridgeError, BridgeResult};
