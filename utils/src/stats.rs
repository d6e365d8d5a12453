//! Operation counters for the staking core.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tide_types::ErrorKind;

/// Committed operations and rejections, by name.
///
/// Counters live outside the transactional ledger state: a rejected operation
/// rolls back the ledger but is still counted here.
#[derive(Debug, Default)]
pub struct OperationStats {
    committed: BTreeMap<&'static str, AtomicU64>,
    rejected: BTreeMap<&'static str, AtomicU64>,
}

impl OperationStats {
    pub fn new(operations: &[&'static str]) -> Self {
        let committed = operations.iter().map(|&n| (n, AtomicU64::new(0))).collect();
        let rejected = [
            ErrorKind::PreconditionViolation,
            ErrorKind::AuthorizationViolation,
            ErrorKind::ArithmeticBound,
            ErrorKind::DuplicateSubmission,
            ErrorKind::AlreadyExecuted,
            ErrorKind::ConsistencyViolation,
        ]
        .iter()
        .map(|k| (kind_name(*k), AtomicU64::new(0)))
        .collect();
        Self { committed, rejected }
    }

    /// Count a committed operation. Unknown names are ignored.
    pub fn record_commit(&self, operation: &str) {
        if let Some(counter) = self.committed.get(operation) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_rejection(&self, kind: ErrorKind) {
        if let Some(counter) = self.rejected.get(kind_name(kind)) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn committed(&self, operation: &str) -> u64 {
        self.committed
            .get(operation)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn rejected(&self, kind: ErrorKind) -> u64 {
        self.rejected
            .get(kind_name(kind))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> BTreeMap<&'static str, u64> {
        self.committed
            .iter()
            .chain(self.rejected.iter())
            .map(|(&k, v)| (k, v.load(Ordering::Relaxed)))
            .collect()
    }
}

fn kind_name(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::PreconditionViolation => "rejected_precondition",
        ErrorKind::AuthorizationViolation => "rejected_authorization",
        ErrorKind::ArithmeticBound => "rejected_arithmetic",
        ErrorKind::DuplicateSubmission => "rejected_duplicate",
        ErrorKind::AlreadyExecuted => "rejected_already_executed",
        ErrorKind::ConsistencyViolation => "rejected_consistency",
    }
}
