//=========================================================================
// Host Bridge Interface
//=========================================================================
//
// Messages crossing from engine paint threads to the host's UI thread.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

//=== External Dependencies ===============================================

use crossbeam_channel::{Sender, TrySendError};
use log::warn;

//=== Internal Dependencies ===============================================

use crate::core::paint::{Frame, OwnedFrame, PaintHandler};
use crate::core::BrowserId;

//=== HostEvent ===========================================================

/// Events sent from paint threads to the host via MPSC.
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// A copied frame for one browser.
    Frame { browser: BrowserId, frame: OwnedFrame },

    /// Host should leave its loop.
    Shutdown,
}

//=== FrameForwarder ======================================================

/// Paint handler that copies each frame into a channel.
///
/// Never blocks the painting thread: when the channel is full the frame is
/// dropped and counted.
pub struct FrameForwarder {
    browser: BrowserId,
    sender: Sender<HostEvent>,
    dropped: Arc<AtomicU64>,
}

impl FrameForwarder {
    pub fn new(browser: BrowserId, sender: Sender<HostEvent>) -> Self {
        Self {
            browser,
            sender,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared counter of frames dropped because the channel was full.
    pub fn dropped_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.dropped)
    }
}

impl PaintHandler for FrameForwarder {
    fn on_paint(&self, frame: &Frame<'_>) {
        let event = HostEvent::Frame {
            browser: self.browser,
            frame: frame.to_owned_frame(),
        };

        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!(
                    target: "host_bridge",
                    "Host channel disconnected, dropping frame for browser {}",
                    self.browser
                );
            }
        }
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
