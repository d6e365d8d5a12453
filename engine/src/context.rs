//! Per-call ledger context.

use tide_types::{Address, Amount, BlockNumber, Timestamp};

use crate::error::EngineError;

/// Who is calling, what they attached, and where the ledger is.
///
/// The core never reads a clock; every deadline is checked against `now`
/// and every oracle block against `block`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    /// Pooled currency attached to the call.
    pub value: Amount,
    pub now: Timestamp,
    pub block: BlockNumber,
}

impl CallContext {
    pub fn new(caller: Address, now: Timestamp, block: BlockNumber) -> Self {
        Self {
            caller,
            value: 0,
            now,
            block,
        }
    }

    pub fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }

    /// Reject value attached to an operation that does not take any.
    pub(crate) fn no_value(&self) -> Result<(), EngineError> {
        if self.value != 0 {
            return Err(EngineError::UnexpectedValue(self.value));
        }
        Ok(())
    }
}
