//=========================================================================
// Compositor Thread
//=========================================================================
//
// Delivers rendered frames from a dedicated thread, so paint handlers run
// off the UI thread the way a real engine invokes them.
//
// Architecture:
//   UI thread: do_message_loop_work() → submit(PaintJob) ─┐
//                                                         │ bounded MPSC
//   Compositor thread: recv() → PaintSink::deliver() ◄────┘
//
// Shutdown: dropping the sender ends the loop; `stop()` joins the thread.
//
//=========================================================================

//=== Standard Library Imports ============================================

use std::io;
use std::thread;

//=== External Dependencies ===============================================

use crossbeam_channel::{bounded, Sender, TrySendError};
use log::{debug, error, warn};

//=== Internal Dependencies ===============================================

use crate::core::paint::{Frame, PaintSink};

//=== PaintJob ============================================================

/// One rendered frame waiting for delivery.
pub(crate) struct PaintJob {
    pub sink: PaintSink,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl PaintJob {
    /// Delivers the frame on the current thread.
    pub(crate) fn deliver(self) -> bool {
        match Frame::new(self.width, self.height, &self.pixels) {
            Some(frame) => self.sink.deliver(&frame),
            None => {
                error!(
                    target: "compositor",
                    "Malformed frame for browser {} ({}x{}, {} bytes)",
                    self.sink.browser(),
                    self.width,
                    self.height,
                    self.pixels.len()
                );
                false
            }
        }
    }
}

//=== Compositor ==========================================================

/// Owns the paint delivery thread.
pub(crate) struct Compositor {
    sender: Option<Sender<PaintJob>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Compositor {
    /// Spawns the delivery thread with a queue of `capacity` frames.
    pub(crate) fn spawn(capacity: usize) -> io::Result<Self> {
        let (sender, receiver) = bounded::<PaintJob>(capacity);

        let handle = thread::Builder::new()
            .name("stoa-compositor".into())
            .spawn(move || {
                debug!(target: "compositor", "Compositor thread started");
                for job in receiver.iter() {
                    job.deliver();
                }
                debug!(target: "compositor", "Compositor thread exiting");
            })?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queues `job` without blocking. Gives the job back when the queue is
    /// full or the thread is gone.
    pub(crate) fn submit(&self, job: PaintJob) -> Result<(), PaintJob> {
        let Some(sender) = &self.sender else {
            return Err(job);
        };

        match sender.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(job)) => Err(job),
            Err(TrySendError::Disconnected(job)) => {
                warn!(target: "compositor", "Compositor thread is gone");
                Err(job)
            }
        }
    }

    /// Drains queued frames and joins the thread.
    pub(crate) fn stop(&mut self) {
        drop(self.sender.take());

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!(target: "compositor", "Compositor thread panicked");
            }
        }
    }
}

impl Drop for Compositor {
    fn drop(&mut self) {
        self.stop();
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BrowserId;
    use crossbeam_channel::unbounded;
    use std::time::Duration;

    fn job(sink: &PaintSink, width: u32) -> PaintJob {
        PaintJob {
            sink: sink.clone(),
            width,
            height: 1,
            pixels: vec![0; width as usize * 4],
        }
    }

    #[test]
    fn frames_are_delivered_off_thread() {
        let (tx, rx) = unbounded();
        let sink = PaintSink::detached(BrowserId::new(1), move |frame: &Frame<'_>| {
            let _ = tx.send((thread::current().id(), frame.width()));
        });

        let mut compositor = Compositor::spawn(4).unwrap();
        assert!(compositor.submit(job(&sink, 3)).is_ok());

        let (painter, width) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(width, 3);
        assert_ne!(painter, thread::current().id());

        compositor.stop();
    }

    #[test]
    fn stop_flushes_queued_frames() {
        let (tx, rx) = unbounded();
        let sink = PaintSink::detached(BrowserId::new(2), move |frame: &Frame<'_>| {
            let _ = tx.send(frame.width());
        });

        let mut compositor = Compositor::spawn(8).unwrap();
        for width in 1..=3 {
            assert!(compositor.submit(job(&sink, width)).is_ok());
        }
        compositor.stop();

        let widths: Vec<u32> = rx.try_iter().collect();
        assert_eq!(widths, vec![1, 2, 3], "Frames must arrive in submit order");
    }

    #[test]
    fn submit_after_stop_returns_job() {
        let sink = PaintSink::detached(BrowserId::new(3), |_: &Frame<'_>| {});
        let mut compositor = Compositor::spawn(1).unwrap();
        compositor.stop();

        assert!(compositor.submit(job(&sink, 1)).is_err());
    }

    #[test]
    fn malformed_job_is_rejected() {
        let sink = PaintSink::detached(BrowserId::new(4), |_: &Frame<'_>| {});
        let bad = PaintJob {
            sink,
            width: 2,
            height: 2,
            pixels: vec![0; 3],
        };
        assert!(!bad.deliver());
    }
}
