use proptest::prelude::*;

use tide_deposit::{assign, AssignmentLimits, DepositPool, QueueEntry, UnitQueue};
use tide_types::{ether, UnitId};

fn build(caps: &[(u128, u128)]) -> UnitQueue {
    let mut q = UnitQueue::new();
    for (i, (c, t)) in caps.iter().enumerate() {
        q.enqueue(QueueEntry { unit: UnitId::new(i as u32), capacity: ether(*c), top_up: ether(*t) })
            .unwrap();
    }
    q
}

proptest! {
    /// Assignment conserves capital: what leaves the pool is exactly what the
    /// funded units receive, and funded units are a prefix of the queue.
    #[test]
    fn assignment_conserves_and_preserves_order(
        user in 0u128..200,
        credit in 0u128..50,
        caps in prop::collection::vec((prop::sample::select(vec![16u128, 24, 31]), 0u128..16), 0..12),
        max in 1u32..10,
    ) {
        let mut pool = DepositPool::new();
        pool.deposit(ether(user)).unwrap();
        pool.node_deposit(ether(credit)).unwrap();
        let mut q = build(&caps);
        let before_total = pool.total().unwrap();
        let before_cap = q.total_capacity();
        let before_len = q.len();

        let limits = AssignmentLimits { max_assignments: max, max_socialised: 2, scaling: 0, launch_balance: ether(32) };
        let plan = assign(&mut pool, &mut q, &limits).unwrap();

        let funded: u128 = plan.assignments.iter().map(|a| a.total().unwrap()).sum();
        prop_assert_eq!(before_total - pool.total().unwrap(), funded);
        prop_assert!(plan.assignments.len() <= max as usize);
        prop_assert_eq!(q.len() + plan.assignments.len(), before_len);
        prop_assert!(q.total_capacity() <= before_cap);
        for (i, a) in plan.assignments.iter().enumerate() {
            prop_assert_eq!(a.unit, UnitId::new(i as u32));
            prop_assert_eq!(a.user_capital, ether(caps[i].0));
            prop_assert_eq!(a.node_credit, ether(caps[i].1));
        }
    }
}
