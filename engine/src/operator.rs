//! Operator registry.
//!
//! Units refer to their operator by [`OperatorId`]; the registry maps
//! addresses to ids and keeps each operator's unit list as plain ids.
//!
//! Each operator also owns a fee distributor: execution-layer fees collect
//! there until someone splits them between the operator and pooled users.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tide_types::{Address, Amount, OperatorId, Ratio, Timestamp, UnitId};

use crate::error::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorRecord {
    pub id: OperatorId,
    pub address: Address,
    /// Where operator payouts go. Starts as the operator address.
    pub withdrawal_address: Address,
    /// Pooled currency the operator may put toward a future bond.
    pub deposit_credit: Amount,
    pub units: Vec<UnitId>,
    pub registered_at: Timestamp,
    /// Fees waiting in the operator's distributor.
    pub fee_distributor_balance: Amount,
    pub smoothing_pool_registered: bool,
    /// Last time the smoothing-pool registration changed.
    pub smoothing_pool_changed_at: Option<Timestamp>,
}

/// How a fee-distributor balance is shared out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributorSplit {
    pub operator: Amount,
    pub user: Amount,
}

/// Half the balance is the operator's; the other half is commission-bearing
/// user capital, of which the operator takes `average_fee`.
pub fn split_distributor_balance(balance: Amount, average_fee: Ratio) -> Option<DistributorSplit> {
    let half = balance / 2;
    let operator = half.checked_add(average_fee.apply(half)?)?;
    let user = balance.checked_sub(operator)?;
    Some(DistributorSplit { operator, user })
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorRegistry {
    records: Vec<OperatorRecord>,
    by_address: BTreeMap<Address, OperatorId>,
}

impl OperatorRegistry {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn register(&mut self, address: Address, now: Timestamp) -> Result<OperatorId, EngineError> {
        if self.by_address.contains_key(&address) {
            return Err(EngineError::OperatorExists(address));
        }
        let index = u32::try_from(self.records.len()).map_err(|_| EngineError::Overflow)?;
        let id = OperatorId::new(index);
        self.records.push(OperatorRecord {
            id,
            address,
            withdrawal_address: address,
            deposit_credit: 0,
            units: Vec::new(),
            registered_at: now,
            fee_distributor_balance: 0,
            smoothing_pool_registered: false,
            smoothing_pool_changed_at: None,
        });
        self.by_address.insert(address, id);
        Ok(id)
    }

    pub fn id_of(&self, address: &Address) -> Result<OperatorId, EngineError> {
        self.by_address
            .get(address)
            .copied()
            .ok_or(EngineError::NotOperator(*address))
    }

    pub fn by_address(&self, address: &Address) -> Option<&OperatorRecord> {
        self.by_address
            .get(address)
            .and_then(|id| self.records.get(id.index()))
    }

    pub fn get(&self, id: OperatorId) -> Result<&OperatorRecord, EngineError> {
        self.records
            .get(id.index())
            .ok_or(EngineError::NotOperator(Address::ZERO))
    }

    pub fn get_mut(&mut self, id: OperatorId) -> Result<&mut OperatorRecord, EngineError> {
        self.records
            .get_mut(id.index())
            .ok_or(EngineError::NotOperator(Address::ZERO))
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperatorRecord> {
        self.records.iter()
    }

    /// Sum of every operator's undistributed fees.
    pub fn distributor_total(&self) -> Option<Amount> {
        self.records
            .iter()
            .try_fold(0u128, |acc, r| acc.checked_add(r.fee_distributor_balance))
    }

    pub fn add_credit(&mut self, id: OperatorId, amount: Amount) -> Result<(), EngineError> {
        let record = self.get_mut(id)?;
        record.deposit_credit = record
            .deposit_credit
            .checked_add(amount)
            .ok_or(EngineError::Overflow)?;
        Ok(())
    }

    pub fn use_credit(&mut self, id: OperatorId, amount: Amount) -> Result<(), EngineError> {
        let record = self.get_mut(id)?;
        record.deposit_credit =
            record
                .deposit_credit
                .checked_sub(amount)
                .ok_or(EngineError::InsufficientCredit {
                    requested: amount,
                    available: record.deposit_credit,
                })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_once() {
        let mut reg = OperatorRegistry::default();
        let a = Address::from_low_u64(1);
        let id = reg.register(a, Timestamp::EPOCH).unwrap();
        assert_eq!(reg.id_of(&a).unwrap(), id);
        assert!(matches!(
            reg.register(a, Timestamp::EPOCH),
            Err(EngineError::OperatorExists(_))
        ));
        assert_eq!(reg.by_address(&a).map(|r| r.withdrawal_address), Some(a));
    }

    #[test]
    fn credit_cannot_go_negative() {
        let mut reg = OperatorRegistry::default();
        let id = reg.register(Address::from_low_u64(1), Timestamp::EPOCH).unwrap();
        reg.add_credit(id, 5).unwrap();
        let err = reg.use_credit(id, 6).unwrap_err();
        assert_eq!(err.kind(), tide_types::ErrorKind::ArithmeticBound);
        reg.use_credit(id, 5).unwrap();
    }

    #[test]
    fn distributor_split_gives_operator_half_plus_commission() {
        let split = split_distributor_balance(100, Ratio::from_percent(10)).unwrap();
        assert_eq!(split, DistributorSplit { operator: 55, user: 45 });
        // Odd wei stays with users.
        let split = split_distributor_balance(101, Ratio::ZERO).unwrap();
        assert_eq!(split, DistributorSplit { operator: 50, user: 51 });
        assert!(split_distributor_balance(100, Ratio::from_percent(300)).is_none());
    }
}
