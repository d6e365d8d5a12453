//! Unit creation and the lifecycle steps before exit.

use tide_crypto::{deposit_data_root, derive_unit_address, withdrawal_credentials};
use tide_deposit::{node_fee, QueueEntry};
use tide_types::{
    mul_div, Address, Amount, DepositType, Ratio, Timestamp, UnitId, UnitStatus, ValidatorPubkey,
    ValidatorSignature, ETHER,
};
use tide_unit::{NewUnit, StakingUnit};

use crate::context::CallContext;
use crate::error::EngineError;
use crate::outbox::{Asset, Event, TransferReason};
use crate::protocol::{Env, Protocol};
use crate::state::LedgerState;

const GWEI: Amount = 1_000_000_000;

/// A request to create a queued unit. The attached value plus `use_credit`
/// must equal `bond`.
#[derive(Clone, Debug)]
pub struct UnitRequest {
    pub bond: Amount,
    pub deposit_type: DepositType,
    pub pubkey: ValidatorPubkey,
    /// Signature over the prelaunch deposit.
    pub signature: ValidatorSignature,
    /// Root of the prelaunch deposit, as computed by the operator.
    pub deposit_data_root: [u8; 32],
    pub salt: u64,
    /// Address the operator expects the unit to be created at.
    pub predicted_address: Address,
    /// Deposit credit put toward the bond.
    pub use_credit: Amount,
    /// Reject creation if the current node fee is lower.
    pub minimum_fee: Option<Ratio>,
}

/// A request to wrap an already running validator in a vacant unit.
#[derive(Clone, Debug)]
pub struct VacantUnitRequest {
    pub bond: Amount,
    pub pubkey: ValidatorPubkey,
    pub salt: u64,
    pub predicted_address: Address,
    /// The validator's current beacon balance.
    pub current_balance: Amount,
    pub minimum_fee: Option<Ratio>,
}

/// Data for the staking deposit of a funded unit.
#[derive(Clone, Debug)]
pub struct StakeRequest {
    pub signature: ValidatorSignature,
    pub deposit_data_root: [u8; 32],
}

fn gwei(amount: Amount) -> Result<u64, EngineError> {
    u64::try_from(amount / GWEI).map_err(|_| EngineError::Overflow)
}

fn check_root(
    pubkey: &ValidatorPubkey,
    unit: &Address,
    amount: Amount,
    signature: &ValidatorSignature,
    claimed: &[u8; 32],
) -> Result<(), EngineError> {
    let root = deposit_data_root(pubkey, &withdrawal_credentials(unit), gwei(amount)?, signature);
    if &root != claimed {
        return Err(EngineError::DepositDataMismatch);
    }
    Ok(())
}

impl LedgerState {
    /// Checks shared by both kinds of creation. Returns the unit address and
    /// the node fee to lock in.
    fn check_new_unit(
        &self,
        env: &Env<'_>,
        caller: &Address,
        pubkey: &ValidatorPubkey,
        salt: u64,
        predicted: Address,
        minimum_fee: Option<Ratio>,
    ) -> Result<(Address, Ratio), EngineError> {
        if self.pubkeys.contains(pubkey) {
            return Err(EngineError::DuplicatePubkey);
        }
        let address = derive_unit_address(caller, salt);
        if address != predicted {
            return Err(EngineError::PredictedAddressMismatch {
                predicted,
                derived: address,
            });
        }
        if self.unit_by_address.contains_key(&address) {
            return Err(EngineError::DuplicateUnitAddress(address));
        }
        let user = i128::try_from(self.pool.user_balance()).map_err(|_| EngineError::Overflow)?;
        let queued =
            i128::try_from(self.queue.total_capacity()).map_err(|_| EngineError::Overflow)?;
        let fee = node_fee(env.params, user - queued)?;
        if let Some(minimum) = minimum_fee {
            if fee < minimum {
                return Err(EngineError::NodeFeeBelowMinimum { fee, minimum });
            }
        }
        Ok((address, fee))
    }

    fn insert_unit(&mut self, unit: StakingUnit) -> Result<(), EngineError> {
        let operator = unit.operator;
        self.unit_by_address.insert(unit.address, unit.id);
        self.pubkeys.insert(unit.pubkey.clone());
        self.operators.get_mut(operator)?.units.push(unit.id);
        self.units.push(unit);
        Ok(())
    }

    fn next_unit_id(&self) -> Result<UnitId, EngineError> {
        u32::try_from(self.units.len())
            .map(UnitId::new)
            .map_err(|_| EngineError::Overflow)
    }

    /// Matched capital this unit holds against its operator's collateral.
    pub(crate) fn release_matched(&mut self, env: &Env<'_>, id: UnitId) -> Result<(), EngineError> {
        let unit = self.unit(id)?;
        let (operator, matched) = (unit.operator, unit.matched_capital(env.params.launch_balance));
        self.collateral.release_capital(operator, matched)?;
        Ok(())
    }

    /// Dissolve a unit that has not started staking and return its capital:
    /// the pooled share back to the pool, the rest to the operator's refund
    /// balance.
    pub(crate) fn dissolve(&mut self, env: &Env<'_>, id: UnitId, now: Timestamp) -> Result<(), EngineError> {
        let status = self.unit(id)?.status;
        self.unit_mut(id)?.dissolve(now)?;
        match status {
            UnitStatus::Initialized => {
                let entry = self.queue.remove(id)?;
                self.pool.take_node_credit(entry.top_up)?;
                self.unit_mut(id)?.credit_refund(entry.top_up)?;
            }
            _ => {
                let unit = self.unit_mut(id)?;
                let user = std::mem::take(&mut unit.user_deposit_balance);
                unit.release(user)?;
                let rest = unit.ledger_balance;
                unit.release(rest)?;
                unit.credit_refund(rest)?;
                self.pool.recycle_user_capital(user)?;
            }
        }
        self.release_matched(env, id)?;
        let address = self.unit(id)?.address;
        self.emit(Event::UnitStatusChanged {
            unit: address,
            status: UnitStatus::Dissolved,
        });
        Ok(())
    }
}

impl Protocol {
    /// Create a queued unit backed by the attached bond.
    pub fn create_unit(&mut self, ctx: CallContext, req: UnitRequest) -> Result<Address, EngineError> {
        self.transact("create_unit", |s, env| {
            let p = env.params;
            let operator = s.operators.id_of(&ctx.caller)?;
            if req.deposit_type != DepositType::Variable {
                return Err(EngineError::DepositTypeNotAllowed(req.deposit_type));
            }
            if !p.is_allowed_bond(req.bond) {
                return Err(tide_unit::UnitError::BondNotAllowed(req.bond).into());
            }
            let paid = ctx
                .value
                .checked_add(req.use_credit)
                .ok_or(EngineError::Overflow)?;
            if paid != req.bond {
                return Err(EngineError::BondValueMismatch {
                    bond: req.bond,
                    value: ctx.value,
                    credit: req.use_credit,
                });
            }
            let (address, fee) = s.check_new_unit(
                env,
                &ctx.caller,
                &req.pubkey,
                req.salt,
                req.predicted_address,
                req.minimum_fee,
            )?;
            check_root(
                &req.pubkey,
                &address,
                p.prelaunch_value,
                &req.signature,
                &req.deposit_data_root,
            )?;

            let capacity = p.launch_balance - req.bond;
            let top_up = req.bond - p.prelaunch_value;
            s.collateral.match_capital(operator, capacity)?;

            s.receive_eth(ctx.value)?;
            s.operators.use_credit(operator, req.use_credit)?;
            s.pool.node_deposit(ctx.value)?;
            s.pool.take_node_credit(p.prelaunch_value)?;
            s.pay(
                env.roles.deposit_contract,
                Asset::Eth,
                p.prelaunch_value,
                TransferReason::ValidatorDeposit,
            )?;

            let id = s.next_unit_id()?;
            let unit = StakingUnit::new_queued(
                NewUnit {
                    id,
                    address,
                    operator,
                    bond: req.bond,
                    top_up,
                    deposit_type: req.deposit_type,
                    node_fee: fee,
                    pubkey: req.pubkey.clone(),
                },
                ctx.now,
            );
            s.queue.enqueue(QueueEntry {
                unit: id,
                capacity,
                top_up,
            })?;
            s.insert_unit(unit)?;
            s.emit(Event::UnitCreated {
                unit: address,
                operator: ctx.caller,
                bond: req.bond,
                node_fee: fee,
            });
            tracing::info!(unit = %address, operator = %ctx.caller, bond = req.bond, fee = %fee, "unit created");

            if p.assign_deposits_enabled {
                s.assign_queued(env, 0, ctx.now)?;
            }
            Ok(address)
        })
    }

    /// Create a vacant unit for a validator that is already running.
    pub fn create_vacant_unit(
        &mut self,
        ctx: CallContext,
        req: VacantUnitRequest,
    ) -> Result<Address, EngineError> {
        self.transact("create_vacant_unit", |s, env| {
            ctx.no_value()?;
            let p = env.params;
            let operator = s.operators.id_of(&ctx.caller)?;
            if !p.is_allowed_bond(req.bond) {
                return Err(tide_unit::UnitError::BondNotAllowed(req.bond).into());
            }
            if req.current_balance < p.launch_balance {
                return Err(EngineError::MigrationBalanceTooLow {
                    balance: req.current_balance,
                    minimum: p.launch_balance,
                });
            }
            let (address, fee) = s.check_new_unit(
                env,
                &ctx.caller,
                &req.pubkey,
                req.salt,
                req.predicted_address,
                req.minimum_fee,
            )?;
            s.collateral
                .match_capital(operator, p.launch_balance - req.bond)?;

            let id = s.next_unit_id()?;
            let unit = StakingUnit::new_vacant(
                NewUnit {
                    id,
                    address,
                    operator,
                    bond: req.bond,
                    top_up: 0,
                    deposit_type: DepositType::Variable,
                    node_fee: fee,
                    pubkey: req.pubkey.clone(),
                },
                req.current_balance,
                ctx.now,
            );
            s.insert_unit(unit)?;
            s.emit(Event::UnitCreated {
                unit: address,
                operator: ctx.caller,
                bond: req.bond,
                node_fee: fee,
            });
            tracing::info!(unit = %address, operator = %ctx.caller, bond = req.bond, "vacant unit created");
            Ok(address)
        })
    }

    /// Send a funded unit's capital to its validator.
    pub fn stake_unit(
        &mut self,
        ctx: CallContext,
        unit: Address,
        req: StakeRequest,
    ) -> Result<(), EngineError> {
        self.transact("stake_unit", |s, env| {
            ctx.no_value()?;
            let id = s.operated_unit(&ctx.caller, &unit)?;
            let record = s.unit(id)?;
            check_root(
                &record.pubkey,
                &unit,
                record.ledger_balance,
                &req.signature,
                &req.deposit_data_root,
            )?;
            let amount = s.unit_mut(id)?.stake(ctx.now, env.params)?;
            s.pay(
                env.roles.deposit_contract,
                Asset::Eth,
                amount,
                TransferReason::ValidatorDeposit,
            )?;
            s.emit(Event::UnitStatusChanged {
                unit,
                status: UnitStatus::Staking,
            });
            Ok(())
        })
    }

    /// Promote a vacant unit. The pool takes over the user share of the
    /// validator and credits the operator for it.
    pub fn promote_unit(&mut self, ctx: CallContext, unit: Address) -> Result<(), EngineError> {
        self.transact("promote_unit", |s, env| {
            ctx.no_value()?;
            let id = s.operated_unit(&ctx.caller, &unit)?;
            let record = s.unit(id)?;
            let operator = record.operator;
            let user = record.matched_capital(env.params.launch_balance);
            s.unit_mut(id)?.promote(user, ctx.now, env.params)?;
            s.pool.consume_node_credit(user)?;
            s.operators.add_credit(operator, user)?;
            s.emit(Event::UnitStatusChanged {
                unit,
                status: UnitStatus::Staking,
            });
            tracing::info!(%unit, credit = user, "vacant unit promoted");
            Ok(())
        })
    }

    /// Dissolve a unit before it stakes.
    ///
    /// The operator may dissolve a queued unit or a vacant one. Anyone may
    /// dissolve a funded unit that missed its launch timeout.
    pub fn dissolve_unit(&mut self, ctx: CallContext, unit: Address) -> Result<(), EngineError> {
        self.transact("dissolve_unit", |s, env| {
            ctx.no_value()?;
            let id = s.unit_id(&unit)?;
            let record = s.unit(id)?;
            let is_operator = s.operators.get(record.operator)?.address == ctx.caller;
            match record.status {
                UnitStatus::Initialized if !is_operator => {
                    return Err(EngineError::NotUnitOperator {
                        caller: ctx.caller,
                        unit,
                    });
                }
                UnitStatus::Prelaunch if !(record.vacant && is_operator) => {
                    record.check_launch_timeout(ctx.now, env.params)?;
                }
                _ => {}
            }
            s.dissolve(env, id, ctx.now)?;
            tracing::info!(%unit, by = %ctx.caller, "unit dissolved");
            Ok(())
        })
    }

    /// Committee vote to scrub a funded unit. Returns `true` when this vote
    /// dissolved it.
    pub fn vote_scrub(&mut self, ctx: CallContext, unit: Address) -> Result<bool, EngineError> {
        self.transact("vote_scrub", |s, env| {
            ctx.no_value()?;
            let members = s.require_member(&ctx.caller)?;
            let id = s.unit_id(&unit)?;
            if !s.unit_mut(id)?.vote_scrub(ctx.caller, members)? {
                tracing::debug!(%unit, voter = %ctx.caller, "scrub vote recorded");
                return Ok(false);
            }
            let record = s.unit(id)?;
            let (operator, vacant, user) =
                (record.operator, record.vacant, record.user_deposit_balance);
            s.dissolve(env, id, ctx.now)?;
            if env.params.scrub_penalty_enabled && !vacant {
                let eth = env
                    .params
                    .minimum_per_unit_stake
                    .apply(user)
                    .ok_or(EngineError::Overflow)?;
                let penalty =
                    mul_div(eth, ETHER, s.collateral.price()).ok_or(EngineError::Overflow)?;
                let taken = s.collateral.slash(operator, penalty);
                s.pay(
                    env.roles.auction,
                    Asset::Collateral,
                    taken,
                    TransferReason::ScrubPenalty,
                )?;
            }
            tracing::info!(%unit, "unit scrubbed by committee");
            Ok(true)
        })
    }

    /// Pay out everything a dissolved or finalised unit still holds.
    pub fn close_unit(&mut self, ctx: CallContext, unit: Address) -> Result<Amount, EngineError> {
        self.transact("close_unit", |s, _| {
            ctx.no_value()?;
            let id = s.operated_unit(&ctx.caller, &unit)?;
            let unit_ref = s.unit_mut(id)?;
            let operator = unit_ref.operator;
            let payout = unit_ref.close()?;
            let to = s.withdrawal_address(operator)?;
            s.pay(to, Asset::Eth, payout, TransferReason::UnitClosed)?;
            Ok(payout)
        })
    }

    /// Pay out the operator's refund balance.
    pub fn refund(&mut self, ctx: CallContext, unit: Address) -> Result<Amount, EngineError> {
        self.transact("refund", |s, _| {
            ctx.no_value()?;
            let id = s.operated_unit(&ctx.caller, &unit)?;
            let unit_ref = s.unit_mut(id)?;
            let operator = unit_ref.operator;
            let amount = unit_ref.take_refund()?;
            let to = s.withdrawal_address(operator)?;
            s.pay(to, Asset::Eth, amount, TransferReason::Refund)?;
            tracing::info!(%unit, amount, "refund paid");
            Ok(amount)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tide_types::ether;

    #[test]
    fn root_must_match_unit_and_amount() {
        let key = ValidatorPubkey::new(vec![1; 48]).unwrap();
        let sig = ValidatorSignature::new(vec![2; 96]).unwrap();
        let unit = Address::from_low_u64(5);
        let root = deposit_data_root(&key, &withdrawal_credentials(&unit), 1_000_000_000, &sig);
        assert!(check_root(&key, &unit, ether(1), &sig, &root).is_ok());
        assert!(check_root(&key, &unit, ether(2), &sig, &root).is_err());
        assert!(check_root(&key, &Address::from_low_u64(6), ether(1), &sig, &root).is_err());
    }
}
