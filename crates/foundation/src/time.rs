/// Monotonic timestamp in seconds, supplied by the host (e.g. a frame time).
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct Time(pub f64);

impl Time {
    pub fn from_millis(ms: f64) -> Self {
        Time(ms / 1000.0)
    }

    pub fn seconds_since(self, earlier: Time) -> f64 {
        self.0 - earlier.0
    }

    pub fn plus_seconds(self, s: f64) -> Self {
        Time(self.0 + s)
    }
}
