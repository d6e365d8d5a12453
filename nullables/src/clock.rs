//! Nullable ledger clock: deterministic time and block height.

use std::cell::Cell;
use tide_types::{BlockNumber, Timestamp};

/// Seconds per block used when advancing time.
pub const BLOCK_TIME_SECS: u64 = 12;

/// A deterministic ledger clock for testing.
///
/// Time only advances when you tell it to. Height follows time at one block
/// per [`BLOCK_TIME_SECS`], and always moves forward by at least one block.
pub struct NullClock {
    current: Cell<u64>,
    block: Cell<BlockNumber>,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self {
            current: Cell::new(initial_secs),
            block: Cell::new(1),
        }
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.current.get())
    }

    pub fn block(&self) -> BlockNumber {
        self.block.get()
    }

    /// Advance time by a number of seconds.
    pub fn advance(&self, secs: u64) {
        self.current.set(self.current.get() + secs);
        self.block
            .set(self.block.get() + (secs / BLOCK_TIME_SECS).max(1));
    }

    pub fn advance_days(&self, days: u64) {
        self.advance(days * 86_400);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_time_and_height() {
        let clock = NullClock::new(1_000);
        clock.advance(120);
        assert_eq!(clock.now(), Timestamp::new(1_120));
        assert_eq!(clock.block(), 11);
        clock.advance(1);
        assert_eq!(clock.block(), 12);
    }
}
