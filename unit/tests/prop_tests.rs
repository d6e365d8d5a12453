use proptest::prelude::*;

use tide_types::{ether, DepositType, Ratio};
use tide_unit::{split_exit_balance, split_rewards, SplitTerms};

fn deposit_type() -> impl Strategy<Value = DepositType> {
    prop_oneof![
        Just(DepositType::Variable),
        Just(DepositType::Full),
        Just(DepositType::Half),
        Just(DepositType::Empty),
    ]
}

proptest! {
    /// No split creates or destroys value, and the applied penalty never
    /// exceeds the operator's pre-penalty share even for rates above 100%.
    #[test]
    fn exit_split_conserves_and_caps_penalty(
        ty in deposit_type(),
        bond in prop::sample::select(vec![0u128, 8, 16, 32]),
        balance in 0u128..ether(64),
        fee in 0u64..=100,
        rate in 0u64..=1500,
    ) {
        let terms = SplitTerms {
            deposit_type: ty,
            node_capital: ether(bond),
            user_capital: ether(32 - bond),
            node_fee: Ratio::from_percent(fee),
            penalty_rate: Ratio::from_percent(rate),
        };
        let unpenalised = split_exit_balance(&SplitTerms { penalty_rate: Ratio::ZERO, ..terms }, balance).unwrap();
        let s = split_exit_balance(&terms, balance).unwrap();
        prop_assert_eq!(s.operator + s.user, balance);
        prop_assert!(s.penalty <= unpenalised.operator);
        prop_assert_eq!(s.operator + s.penalty, unpenalised.operator);
    }

    /// Users never receive less than their principal while the balance covers it.
    #[test]
    fn users_keep_principal_when_covered(bond in prop::sample::select(vec![8u128, 16]), balance in ether(24)..ether(64), fee in 0u64..=100) {
        let terms = SplitTerms {
            deposit_type: DepositType::Variable,
            node_capital: ether(bond),
            user_capital: ether(32 - bond),
            node_fee: Ratio::from_percent(fee),
            penalty_rate: Ratio::ZERO,
        };
        let s = split_exit_balance(&terms, balance).unwrap();
        if balance >= terms.user_capital {
            prop_assert!(s.user >= terms.user_capital);
        }
    }

    /// Reward skims conserve value.
    #[test]
    fn reward_split_conserves(ty in deposit_type(), rewards in 0u128..ether(10), fee in 0u64..=100) {
        let terms = SplitTerms {
            deposit_type: ty,
            node_capital: ether(8),
            user_capital: ether(24),
            node_fee: Ratio::from_percent(fee),
            penalty_rate: Ratio::ZERO,
        };
        let s = split_rewards(&terms, rewards).unwrap();
        prop_assert_eq!(s.operator + s.user, rewards);
    }
}
