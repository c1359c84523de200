//! Property tests: for any interleaving of acquire, release and platform
//! reclaim, the controller holds exactly one live handle when `Held` and none
//! when `Idle`, and never issues a request while a lock is held.

use std::sync::Arc;

use proptest::prelude::*;
use wakeguard_core::platform::sim::SimulatedPlatform;
use wakeguard_core::{LockController, LockError, LockState};

#[derive(Debug, Clone)]
enum Op {
    Acquire,
    Release,
    Reclaim,
    DenyNext,
    FailNextRelease,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Acquire),
        3 => Just(Op::Release),
        2 => Just(Op::Reclaim),
        1 => Just(Op::DenyNext),
        1 => Just(Op::FailNextRelease),
    ]
}

proptest! {
    #[test]
    fn held_iff_single_live_handle(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        rt.block_on(async {
            let sim = SimulatedPlatform::new();
            let (mut lock, mut notices) = LockController::new(Arc::new(sim.clone()));

            for op in ops {
                let held_before = lock.state() == LockState::Held;
                let requests_before = sim.request_count();

                match op {
                    Op::Acquire => {
                        let result = lock.acquire().await;
                        if held_before {
                            assert!(matches!(result, Err(LockError::InvalidState { .. })));
                            assert_eq!(sim.request_count(), requests_before);
                        }
                    }
                    Op::Release => {
                        let _ = lock.release().await;
                    }
                    Op::Reclaim => {
                        sim.reclaim();
                    }
                    Op::DenyNext => sim.deny_next_requests(1),
                    Op::FailNextRelease => sim.fail_next_releases(1),
                }

                while let Ok(notice) = notices.try_recv() {
                    lock.handle_notice(notice);
                }

                assert_ne!(lock.state(), LockState::Releasing);
                assert!(sim.live_handles() <= 1);
                assert_eq!(lock.is_held(), sim.live_handles() == 1);
                assert_eq!(lock.has_handle(), lock.state() == LockState::Held);
            }
        });
    }
}
