// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A wall clock the test moves by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use linkrelay_core::Clock;

/// [`Clock`] that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    pub fn at(unix_secs: f64) -> Self {
        Self {
            bits: AtomicU64::new(unix_secs.to_bits()),
        }
    }

    pub fn set(&self, unix_secs: f64) {
        self.bits.store(unix_secs.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.set(self.unix_now() + by.as_secs_f64());
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::at(1_700_000_000.0)
    }
}

impl Clock for ManualClock {
    fn unix_now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_forward() {
        let clock = ManualClock::at(100.0);
        clock.advance(Duration::from_secs(600));
        assert_eq!(clock.unix_now(), 700.0);
    }
}
