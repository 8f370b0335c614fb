//=========================================================================
// Host Bridge
//=========================================================================
//
// Carries frames from engine paint threads to the host's UI thread.
//
// Paint callbacks must never block, so they copy the frame and `try_send`
// it; the UI thread drains the channel at its own pace.
//
// Components:
// - `interface`: message type and the forwarding paint handler
// - `frame_collector`: UI-side draining and coalescing
//
//=========================================================================

//=== Module Declarations =================================================

mod frame_collector;
mod interface;

//=== Public API ==========================================================

pub use frame_collector::{FrameCollector, HostControl};
pub use interface::{FrameForwarder, HostEvent};
