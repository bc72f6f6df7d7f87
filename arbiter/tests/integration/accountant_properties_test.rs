// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Accountant Property Tests
//!
//! Randomized reservation workloads against the accounting invariants:
//! whatever sequence of reserves, withdrawals, commits, and aborts runs,
//! every node ends with `used == sum(shares) <= total` and the
//! committed availability matches what was actually granted.

use proptest::prelude::*;

use resource_arbiter::ResourceAccountant;
use resource_arbiter_domain::entities::ApplicationId;
use resource_arbiter_domain::value_objects::ResourcePath;

fn platform(node_total: u64, nodes: u16) -> (ResourceAccountant, Vec<ResourcePath>) {
    let accountant = ResourceAccountant::new();
    for i in 0..nodes {
        let path: ResourcePath = format!("sys0.cpu0.pe{}", i).parse().unwrap();
        accountant.register(&path, node_total).unwrap();
    }
    let leaves = accountant.resolve(&"sys0.cpu0.pe".parse().unwrap());
    (accountant, leaves)
}

/// One randomized step of a reservation workload.
#[derive(Debug, Clone)]
enum Step {
    Reserve { app: u32, amount: u64 },
    Withdraw { app: u32 },
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        (1u32..5, 1u64..8).prop_map(|(app, amount)| Step::Reserve { app, amount }),
        (1u32..5).prop_map(|app| Step::Withdraw { app }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_commit_preserves_accounting(steps in proptest::collection::vec(step_strategy(), 1..24)) {
        let (accountant, leaves) = platform(4, 4);
        let capacity = accountant.total_of(&leaves);
        let token = accountant.open_transaction().unwrap();

        let mut granted: std::collections::BTreeMap<u32, u64> = Default::default();
        for step in steps {
            match step {
                Step::Reserve { app, amount } => {
                    if accountant
                        .reserve(&token, ApplicationId(app), &leaves, amount, false)
                        .is_ok()
                    {
                        *granted.entry(app).or_insert(0) += amount;
                    }
                }
                Step::Withdraw { app } => {
                    accountant.withdraw(&token, ApplicationId(app)).unwrap();
                    granted.remove(&app);
                }
            }
            // Tentative state never exceeds capacity.
            let tentative_sum: u64 = granted.values().sum();
            prop_assert!(tentative_sum <= capacity);
            prop_assert_eq!(
                accountant.available_of(&leaves, Some(&token), None),
                capacity - tentative_sum
            );
        }

        accountant.commit(&token, &[]).unwrap();
        accountant.audit().unwrap();
        let granted_sum: u64 = granted.values().sum();
        prop_assert_eq!(accountant.available_of(&leaves, None, None), capacity - granted_sum);
    }

    #[test]
    fn prop_abort_leaves_no_trace(steps in proptest::collection::vec(step_strategy(), 1..24)) {
        let (accountant, leaves) = platform(4, 4);
        let capacity = accountant.total_of(&leaves);
        let token = accountant.open_transaction().unwrap();

        for step in steps {
            if let Step::Reserve { app, amount } = step {
                let _ = accountant.reserve(&token, ApplicationId(app), &leaves, amount, false);
            }
        }
        accountant.release(&token).unwrap();

        accountant.audit().unwrap();
        prop_assert_eq!(accountant.available_of(&leaves, None, None), capacity);
        // A fresh transaction starts from a clean slate.
        let token = accountant.open_transaction().unwrap();
        prop_assert_eq!(accountant.available_of(&leaves, Some(&token), None), capacity);
        accountant.release(&token).unwrap();
    }

    #[test]
    fn prop_reallocation_swaps_shares_atomically(
        first in 1u64..16,
        second in 1u64..16,
    ) {
        let (accountant, leaves) = platform(4, 4);
        let capacity = accountant.total_of(&leaves);
        let app = ApplicationId(1);

        let token = accountant.open_transaction().unwrap();
        prop_assume!(first <= capacity);
        accountant.reserve(&token, app, &leaves, first, false).unwrap();
        accountant.commit(&token, &[]).unwrap();

        // Re-evaluation sees through the holder's own share, so any
        // second allocation within capacity succeeds and replaces the
        // first outright.
        let token = accountant.open_transaction().unwrap();
        prop_assume!(second <= capacity);
        accountant.reserve(&token, app, &leaves, second, false).unwrap();
        accountant.commit(&token, &[]).unwrap();

        accountant.audit().unwrap();
        prop_assert_eq!(accountant.available_of(&leaves, None, None), capacity - second);
    }
}
