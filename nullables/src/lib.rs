//! Nullable infrastructure for deterministic testing.
//!
//! The core never reads a wall clock or a chain head itself; callers pass
//! ledger time and height into every operation. Tests drive those values
//! from a [`NullClock`] instead of real time.

pub mod clock;

pub use clock::NullClock;
