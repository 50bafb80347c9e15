//! Batch Scheduler
//!
//! Collects changed property names and runs one binding pass per frame.
//!
//! Phases: `Idle` -> (first enqueue) -> `Scheduled` -> (frame) ->
//! `Flushing` -> `Idle`. Only one frame callback is outstanding at a
//! time. The flush works on a snapshot of the queue taken when it starts;
//! names queued while it runs go to the next frame.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use indexmap::IndexSet;

/// Scheduler phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPhase {
    #[default]
    Idle,
    Scheduled,
    Flushing,
}

/// Pending-property bookkeeping for one engine
#[derive(Debug, Default)]
pub struct BatchScheduler {
    phase: BatchPhase,
    pending: IndexSet<String>,
    /// Bumped on reset; frame callbacks carry the epoch they were
    /// requested in and do nothing once it has moved on
    epoch: u64,
}

impl BatchScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> BatchPhase {
        self.phase
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Number of queued property names
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, property: &str) -> bool {
        self.pending.contains(property)
    }

    /// Queue a property. Returns true when the caller must request a
    /// frame (the scheduler just left `Idle`).
    pub fn enqueue(&mut self, property: &str) -> bool {
        if !self.pending.contains(property) {
            self.pending.insert(property.to_string());
        }
        if self.phase == BatchPhase::Idle {
            self.phase = BatchPhase::Scheduled;
            return true;
        }
        false
    }

    /// Start a flush: take the queue snapshot
    pub fn begin_flush(&mut self) -> Vec<String> {
        self.phase = BatchPhase::Flushing;
        std::mem::take(&mut self.pending).into_iter().collect()
    }

    /// End a flush. Returns true when names arrived during the flush and
    /// another frame must be requested.
    pub fn finish_flush(&mut self) -> bool {
        if self.pending.is_empty() {
            self.phase = BatchPhase::Idle;
            false
        } else {
            self.phase = BatchPhase::Scheduled;
            true
        }
    }

    /// Drop everything queued and invalidate outstanding frame callbacks
    pub fn reset(&mut self) {
        self.pending.clear();
        self.phase = BatchPhase::Idle;
        self.epoch += 1;
    }
}

/// Callback run at the next frame boundary
pub type FrameCallback = Box<dyn FnOnce()>;

/// Source of frame boundaries (a host's animation-frame hook).
///
/// `request_frame` is fire-and-forget: the callback runs once, later,
/// never from inside `request_frame` itself.
pub trait FrameScheduler {
    fn request_frame(&self, callback: FrameCallback);
}

/// Host-driven frame queue.
///
/// The host's loop (or a test) calls [`run_frame`](Self::run_frame).
/// Callbacks requested while a frame runs wait for the following frame.
#[derive(Clone, Default)]
pub struct FrameQueue {
    callbacks: Rc<RefCell<VecDeque<FrameCallback>>>,
}

impl std::fmt::Debug for FrameQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameQueue")
            .field("pending", &self.pending())
            .finish()
    }
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of callbacks waiting for the next frame
    pub fn pending(&self) -> usize {
        self.callbacks.borrow().len()
    }

    /// Run the callbacks queued before this call; returns how many ran
    pub fn run_frame(&self) -> usize {
        let due: Vec<FrameCallback> = self.callbacks.borrow_mut().drain(..).collect();
        let count = due.len();
        for callback in due {
            callback();
        }
        count
    }

    /// Run frames until nothing is queued, at most `max_frames`.
    /// Returns the number of frames run.
    pub fn run_until_idle(&self, max_frames: usize) -> usize {
        let mut frames = 0;
        while frames < max_frames && self.pending() > 0 {
            self.run_frame();
            frames += 1;
        }
        frames
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&self, callback: FrameCallback) {
        self.callbacks.borrow_mut().push_back(callback);
    }
}
