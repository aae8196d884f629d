use crate::frame::{FrameHandle, FrameScheduler};

/// Single-slot "latest pending task".
///
/// Scheduling through the slot cancels whatever it scheduled before, so at most
/// one of its tasks is ever queued and it always carries the newest input.
#[derive(Debug, Default)]
pub struct LatestTask {
    handle: Option<FrameHandle>,
}

impl LatestTask {
    pub fn new() -> Self {
        Self { handle: None }
    }

    pub fn schedule<T>(&mut self, scheduler: &mut FrameScheduler<T>, task: T) {
        if let Some(prev) = self.handle.take() {
            if scheduler.cancel(prev).is_some() {
                tracing::trace!("superseded pending frame task");
            }
        }
        self.handle = Some(scheduler.request(task));
    }

    /// Cancels the pending task, returning it if it had not run yet.
    pub fn cancel<T>(&mut self, scheduler: &mut FrameScheduler<T>) -> Option<T> {
        self.handle.take().and_then(|h| scheduler.cancel(h))
    }

    pub fn is_pending<T>(&self, scheduler: &FrameScheduler<T>) -> bool {
        self.handle.is_some_and(|h| scheduler.is_pending(h))
    }
}
