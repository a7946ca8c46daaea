use std::sync::Mutex;

use rideline_core::Timestamp;
use rideline_ports::Clock;

/// Fixed clock for deterministic tests
///
/// Returns a preset instant until a test explicitly advances or sets it.
pub struct FixedClock {
    now: Mutex<Timestamp>,
}

impl FixedClock {
    pub fn new(now: Timestamp) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, delta: chrono::Duration) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now += delta;
    }

    /// Jump to an absolute instant
    pub fn set(&self, instant: Timestamp) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now = instant;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().expect("clock mutex poisoned")
    }

    fn name(&self) -> &str {
        "FixedClock"
    }
}
