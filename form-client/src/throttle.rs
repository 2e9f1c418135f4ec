//! Trailing-edge throttle
//!
//! The first value offered in a quiet period opens a window. Later values
//! replace the pending one without moving the deadline. Once the deadline
//! has passed the latest value is released and the window closes.

use std::time::Duration;

/// Pending value plus the deadline of its window
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    window: Duration,
    deadline: Option<Duration>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
            pending: None,
        }
    }

    /// Offer a value at time `now`
    pub fn offer(&mut self, now: Duration, value: T) {
        if self.deadline.is_none() {
            self.deadline = Some(now + self.window);
        }
        self.pending = Some(value);
    }

    /// Release the pending value if its deadline has passed
    pub fn take_due(&mut self, now: Duration) -> Option<T> {
        match self.deadline {
            Some(deadline) if deadline <= now => self.take_now(),
            _ => None,
        }
    }

    /// Release the pending value regardless of the deadline
    pub fn take_now(&mut self) -> Option<T> {
        self.deadline = None;
        self.pending.take()
    }

    /// Drop the pending value
    pub fn cancel(&mut self) {
        self.deadline = None;
        self.pending = None;
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
