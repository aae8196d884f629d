use std::collections::BTreeMap;

use foundation::time::Time;

/// Animation frame metadata.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Delta time since the previous frame (seconds).
    pub dt_s: f64,
    /// Time at the start of the frame.
    pub time: Time,
}

impl Frame {
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time: Time(index as f64 * dt_s),
        }
    }

    /// The frame following this one, `dt_s` seconds later.
    pub fn advance(self, dt_s: f64) -> Self {
        Self {
            index: self.index + 1,
            dt_s,
            time: self.time.plus_seconds(dt_s),
        }
    }
}

/// Handle returned by [`FrameScheduler::request`], used to cancel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameHandle(u64);

/// Queue of work to run on the next animation frame.
///
/// The equivalent of `requestAnimationFrame` / `cancelAnimationFrame` with
/// tasks as plain data: the owner applies them when [`run_frame`] hands them
/// back. Tasks come back in request order.
///
/// [`run_frame`]: FrameScheduler::run_frame
#[derive(Debug)]
pub struct FrameScheduler<T> {
    next_id: u64,
    pending: BTreeMap<u64, T>,
}

impl<T> Default for FrameScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameScheduler<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            pending: BTreeMap::new(),
        }
    }

    pub fn request(&mut self, task: T) -> FrameHandle {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.pending.insert(id, task);
        FrameHandle(id)
    }

    /// Cancels a pending task. Stale handles are ignored.
    pub fn cancel(&mut self, handle: FrameHandle) -> Option<T> {
        self.pending.remove(&handle.0)
    }

    pub fn is_pending(&self, handle: FrameHandle) -> bool {
        self.pending.contains_key(&handle.0)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Takes every task queued so far.
    pub fn run_frame(&mut self) -> Vec<T> {
        std::mem::take(&mut self.pending).into_values().collect()
    }
}
