use foundation::time::Time;

/// Time-window rate limiter.
///
/// The first call fires immediately and opens a window of `interval_s`.
/// Calls inside the window collapse into a single trailing call, which
/// [`poll`](Throttle::poll) reports once the window has closed.
#[derive(Debug, Clone, PartialEq)]
pub struct Throttle {
    interval_s: f64,
    window_end: Option<Time>,
    queued: bool,
}

impl Throttle {
    pub fn new(interval_s: f64) -> Self {
        Self {
            interval_s: interval_s.max(0.0),
            window_end: None,
            queued: false,
        }
    }

    pub fn from_millis(ms: f64) -> Self {
        Self::new(ms / 1000.0)
    }

    pub fn interval_s(&self) -> f64 {
        self.interval_s
    }

    /// Returns `true` when the caller should run the throttled work now.
    pub fn call(&mut self, now: Time) -> bool {
        match self.window_end {
            Some(end) if now < end => {
                self.queued = true;
                false
            }
            _ => {
                self.queued = false;
                self.open_window(now);
                true
            }
        }
    }

    /// Returns `true` when a call queued during the last window is due.
    pub fn poll(&mut self, now: Time) -> bool {
        match self.window_end {
            Some(end) if now >= end => {
                if self.queued {
                    self.queued = false;
                    self.open_window(now);
                    true
                } else {
                    self.window_end = None;
                    false
                }
            }
            _ => false,
        }
    }

    pub fn has_queued(&self) -> bool {
        self.queued
    }

    pub fn reset(&mut self) {
        self.window_end = None;
        self.queued = false;
    }

    fn open_window(&mut self, now: Time) {
        self.window_end = if self.interval_s > 0.0 {
            Some(now.plus_seconds(self.interval_s))
        } else {
            None
        };
    }
}

#[cfg(test)]
mod tests {
    use super::Throttle;
    use foundation::time::Time;

    #[test]
    fn leading_call_fires_then_window_collapses() {
        let mut t = Throttle::from_millis(200.0);
        assert!(t.call(Time(0.0)));
        assert!(!t.call(Time(0.05)));
        assert!(!t.call(Time(0.10)));
        assert!(!t.call(Time(0.15)));
        assert!(t.has_queued());

        assert!(!t.poll(Time(0.19)));
        assert!(t.poll(Time(0.20)));
        assert!(!t.has_queued());
        // The trailing call opened a new window with nothing queued.
        assert!(!t.poll(Time(0.40)));
        assert!(t.call(Time(0.41)));
    }

    #[test]
    fn nothing_queued_means_no_trailing_call() {
        let mut t = Throttle::new(0.1);
        assert!(t.call(Time(1.0)));
        assert!(!t.poll(Time(1.5)));
        assert!(t.call(Time(1.5)));
    }

    #[test]
    fn zero_interval_never_throttles() {
        let mut t = Throttle::new(0.0);
        assert!(t.call(Time(0.0)));
        assert!(t.call(Time(0.0)));
        assert!(!t.poll(Time(0.0)));
    }

    #[test]
    fn late_call_after_window_fires_and_clears_queue() {
        let mut t = Throttle::new(0.1);
        assert!(t.call(Time(0.0)));
        assert!(!t.call(Time(0.05)));
        assert!(t.call(Time(0.3)));
        assert!(!t.has_queued());
    }
}
