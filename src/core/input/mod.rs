//=========================================================================
// Input
//
// Typed descriptors for the events a host injects into a browser, plus
// an ordering checker for key streams.
//
// Responsibilities:
// - Expose key/mouse event value types with their C wire values
// - Validate raw C integers (event type, button) before forwarding
// - Observe key ordering without altering it
//
//=========================================================================

//=== Submodules ==========================================================

pub mod event;
mod keystroke_tracker;

//=== Public API ==========================================================

pub use event::{
    InputEvent, KeyEvent, KeyEventType, Modifiers, MouseButton, MouseClickEvent, MouseMoveEvent,
    MouseWheelEvent,
};
pub use keystroke_tracker::{KeyOrderViolation, KeystrokeTracker};
