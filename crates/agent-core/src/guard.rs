//! Loop Guard
//!
//! Bounds the number of automatic turns between two pieces of user input.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_LOOPS: u32 = 20;

/// Counter of consecutive automatic turns.
///
/// `counter` never exceeds `max`; once it reaches `max` the orchestrator must
/// hand control back to the user before doing anything else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopGuard {
    counter: u32,
    max: u32,
}

impl Default for LoopGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LOOPS)
    }
}

impl LoopGuard {
    /// A `max` of zero is treated as one.
    pub fn new(max: u32) -> Self {
        Self {
            counter: 0,
            max: max.max(1),
        }
    }

    /// Count one automatic turn
    pub fn increment(&mut self) {
        self.counter = self.counter.saturating_add(1).min(self.max);
    }

    /// New user text arrived
    pub const fn reset(&mut self) {
        self.counter = 0;
    }

    /// Force a human checkpoint on the next iteration
    pub const fn exhaust(&mut self) {
        self.counter = self.max;
    }

    pub const fn is_exhausted(&self) -> bool {
        self.counter >= self.max
    }

    pub const fn counter(&self) -> u32 {
        self.counter
    }

    pub const fn max(&self) -> u32 {
        self.max
    }

    pub const fn remaining(&self) -> u32 {
        self.max - self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_saturates_at_max() {
        let mut guard = LoopGuard::new(3);
        for _ in 0..10 {
            guard.increment();
        }
        assert_eq!(guard.counter(), 3);
        assert!(guard.is_exhausted());
    }

    #[test]
    fn test_reset_and_exhaust() {
        let mut guard = LoopGuard::new(20);
        guard.increment();
        guard.increment();
        assert_eq!(guard.remaining(), 18);

        guard.exhaust();
        assert!(guard.is_exhausted());
        assert_eq!(guard.counter(), 20);

        guard.reset();
        assert_eq!(guard.counter(), 0);
        assert!(!guard.is_exhausted());
    }

    #[test]
    fn test_increment_at_integer_ceiling() {
        let mut guard = LoopGuard::new(u32::MAX);
        guard.exhaust();
        guard.increment();
        assert_eq!(guard.counter(), u32::MAX);
        assert_eq!(guard.remaining(), 0);
    }

    #[test]
    fn test_zero_max_still_bounds() {
        let mut guard = LoopGuard::new(0);
        assert_eq!(guard.max(), 1);
        guard.increment();
        assert!(guard.is_exhausted());
    }
}
