//=========================================================================
// Frame Collector
//=========================================================================
//
// Host-side frame collector with bounded polling and shutdown detection.
//
// Architecture:
//   Receiver<HostEvent> → collect() → latest frame per browser → HostControl
//
// Bounded polling prevents starvation of the UI loop. Frames for the same
// browser are coalesced: only the newest one survives a collection pass.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::collections::HashMap;

//=== External Dependencies ===============================================

use crossbeam_channel::{Receiver, TryRecvError};
use log::warn;

//=== Internal Dependencies ===============================================

use super::HostEvent;
use crate::core::paint::OwnedFrame;
use crate::core::BrowserId;

//=== HostControl =========================================================

/// Host loop control signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostControl {
    Continue,
    Exit,
}

//=== FrameCollector ======================================================

/// Drains frames sent by paint threads, keeping the newest per browser.
pub struct FrameCollector {
    receiver: Receiver<HostEvent>,
    latest: HashMap<BrowserId, OwnedFrame>,
    received: u64,
}

impl FrameCollector {
    pub fn new(receiver: Receiver<HostEvent>) -> Self {
        Self {
            receiver,
            latest: HashMap::with_capacity(4),
            received: 0,
        }
    }

    /// Collects pending events (bounded to prevent starvation).
    pub fn collect(&mut self) -> HostControl {
        const MAX_EVENTS_PER_PASS: usize = 64;

        self.latest.clear();
        let mut drained = 0;

        while drained < MAX_EVENTS_PER_PASS {
            match self.receiver.try_recv() {
                Ok(HostEvent::Frame { browser, frame }) => {
                    self.received += 1;
                    self.latest.insert(browser, frame);
                    drained += 1;
                }
                Ok(HostEvent::Shutdown) => return HostControl::Exit,
                Err(TryRecvError::Disconnected) => return HostControl::Exit,
                Err(TryRecvError::Empty) => break,
            }
        }

        if drained >= MAX_EVENTS_PER_PASS {
            warn!(target: "host_bridge", "Frame backlog: drained {} frames this pass", drained);
        }

        HostControl::Continue
    }

    /// Newest frame collected for `browser` in the last pass.
    pub fn latest(&self, browser: BrowserId) -> Option<&OwnedFrame> {
        self.latest.get(&browser)
    }

    /// Takes the collected frames, leaving an empty map.
    pub fn take_latest(&mut self) -> HashMap<BrowserId, OwnedFrame> {
        std::mem::take(&mut self.latest)
    }

    /// Total frames received since construction.
    pub fn received(&self) -> u64 {
        self.received
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn frame(width: u32) -> OwnedFrame {
        OwnedFrame {
            width,
            height: 1,
            pixels: vec![0; width as usize * 4],
        }
    }

    #[test]
    fn collect_handles_empty_queue() {
        let (_tx, rx) = unbounded::<HostEvent>();
        let mut collector = FrameCollector::new(rx);

        assert_eq!(collector.collect(), HostControl::Continue);
        assert!(collector.take_latest().is_empty());
    }

    #[test]
    fn collect_keeps_newest_frame_per_browser() {
        let (tx, rx) = unbounded();
        let mut collector = FrameCollector::new(rx);
        let a = BrowserId::new(1);
        let b = BrowserId::new(2);

        tx.send(HostEvent::Frame { browser: a, frame: frame(1) }).unwrap();
        tx.send(HostEvent::Frame { browser: a, frame: frame(2) }).unwrap();
        tx.send(HostEvent::Frame { browser: b, frame: frame(3) }).unwrap();

        assert_eq!(collector.collect(), HostControl::Continue);
        assert_eq!(collector.latest(a).unwrap().width, 2);
        assert_eq!(collector.latest(b).unwrap().width, 3);
        assert_eq!(collector.received(), 3);
    }

    #[test]
    fn collect_clears_previous_pass() {
        let (tx, rx) = unbounded();
        let mut collector = FrameCollector::new(rx);
        let a = BrowserId::new(1);

        tx.send(HostEvent::Frame { browser: a, frame: frame(1) }).unwrap();
        collector.collect();
        assert!(collector.latest(a).is_some());

        collector.collect();
        assert!(collector.latest(a).is_none());
    }

    #[test]
    fn collect_returns_exit_on_shutdown() {
        let (tx, rx) = unbounded();
        let mut collector = FrameCollector::new(rx);

        tx.send(HostEvent::Shutdown).unwrap();

        assert_eq!(collector.collect(), HostControl::Exit);
    }

    #[test]
    fn collect_returns_exit_on_disconnect() {
        let (tx, rx) = unbounded::<HostEvent>();
        let mut collector = FrameCollector::new(rx);

        drop(tx);

        assert_eq!(collector.collect(), HostControl::Exit);
    }
}
