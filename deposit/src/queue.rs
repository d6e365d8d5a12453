//! FIFO queue of staking units awaiting pooled capital.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tide_types::{Amount, UnitId};

use crate::error::DepositError;

/// A unit waiting for capital.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub unit: UnitId,
    /// User capital needed to complete the unit (`launch − bond`).
    pub capacity: Amount,
    /// Node credit the unit's own operator left for it (`bond − prelaunch`).
    pub top_up: Amount,
}

impl QueueEntry {
    /// Total capital the unit receives when funded.
    pub fn funding(&self) -> Option<Amount> {
        self.capacity.checked_add(self.top_up)
    }
}

/// Strict FIFO queue. Entries are only ever removed from the head by
/// assignment, or by id when their unit dissolves before funding.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitQueue {
    entries: VecDeque<QueueEntry>,
    total_capacity: Amount,
}

impl UnitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// User capital the whole queue still needs.
    pub fn total_capacity(&self) -> Amount {
        self.total_capacity
    }

    pub fn front(&self) -> Option<&QueueEntry> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }

    pub fn contains(&self, unit: UnitId) -> bool {
        self.entries.iter().any(|e| e.unit == unit)
    }

    /// Position of `unit`, 0 being next in line.
    pub fn position(&self, unit: UnitId) -> Option<usize> {
        self.entries.iter().position(|e| e.unit == unit)
    }

    /// Whether every queued unit needs the same capacity.
    pub fn is_homogeneous(&self) -> bool {
        let mut caps = self.entries.iter().map(|e| e.capacity);
        match caps.next() {
            Some(first) => caps.all(|c| c == first),
            None => true,
        }
    }

    pub fn enqueue(&mut self, entry: QueueEntry) -> Result<(), DepositError> {
        if self.contains(entry.unit) {
            return Err(DepositError::AlreadyQueued(entry.unit));
        }
        self.total_capacity = self
            .total_capacity
            .checked_add(entry.capacity)
            .ok_or(DepositError::Overflow)?;
        self.entries.push_back(entry);
        Ok(())
    }

    pub fn pop_front(&mut self) -> Option<QueueEntry> {
        let entry = self.entries.pop_front()?;
        self.total_capacity = self.total_capacity.saturating_sub(entry.capacity);
        Some(entry)
    }

    /// Remove a unit that left the queue without being funded.
    pub fn remove(&mut self, unit: UnitId) -> Result<QueueEntry, DepositError> {
        let idx = self.position(unit).ok_or(DepositError::NotQueued(unit))?;
        let entry = self
            .entries
            .remove(idx)
            .ok_or(DepositError::NotQueued(unit))?;
        self.total_capacity = self.total_capacity.saturating_sub(entry.capacity);
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u32, capacity: u128) -> QueueEntry {
        QueueEntry {
            unit: UnitId::new(id),
            capacity,
            top_up: 0,
        }
    }

    #[test]
    fn fifo_order_and_capacity() {
        let mut q = UnitQueue::new();
        q.enqueue(entry(0, 16)).unwrap();
        q.enqueue(entry(1, 24)).unwrap();
        assert_eq!(q.total_capacity(), 40);
        assert_eq!(q.pop_front().unwrap().unit, UnitId::new(0));
        assert_eq!(q.total_capacity(), 24);
    }

    #[test]
    fn duplicate_enqueue_rejected() {
        let mut q = UnitQueue::new();
        q.enqueue(entry(0, 16)).unwrap();
        assert!(q.enqueue(entry(0, 16)).is_err());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn remove_from_middle_keeps_order() {
        let mut q = UnitQueue::new();
        for i in 0..3 {
            q.enqueue(entry(i, 10)).unwrap();
        }
        q.remove(UnitId::new(1)).unwrap();
        assert_eq!(q.total_capacity(), 20);
        let order: Vec<_> = q.iter().map(|e| e.unit).collect();
        assert_eq!(order, vec![UnitId::new(0), UnitId::new(2)]);
        assert!(q.remove(UnitId::new(1)).is_err());
    }

    #[test]
    fn homogeneity() {
        let mut q = UnitQueue::new();
        assert!(q.is_homogeneous());
        q.enqueue(entry(0, 24)).unwrap();
        q.enqueue(entry(1, 24)).unwrap();
        assert!(q.is_homogeneous());
        q.enqueue(entry(2, 16)).unwrap();
        assert!(!q.is_homogeneous());
    }
}
