//! Property-based tests for request correlation
//!
//! Whatever order replies arrive in, each pending operation is settled
//! exactly once, by the reply carrying its own request id.

use std::sync::Arc;

use bridge_sdk::{OperationResult, OperationTable};
use bridge_sdk::prelude::*;
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn prop_each_operation_resolves_once(
        count in 1usize..32,
        order in prop::collection::vec(any::<prop::sample::Index>(), 1..64),
    ) {
        runtime().block_on(async {
            let table = Arc::new(OperationTable::new());
            let mut pending = Vec::new();
            for _ in 0..count {
                let request_id = table.next_request_id();
                pending.push(table.register(request_id, 0, MessageType::PingReply).unwrap());
            }

            // replay a random sequence of replies, duplicates included
            let mut settled = std::collections::HashSet::new();
            for index in &order {
                let request_id = index.index(count) as i64 + 1;
                let outcome = table.resolve(
                    request_id,
                    Ok(OperationResult::Payload(Some(request_id.to_le_bytes().to_vec()))),
                );
                if settled.insert(request_id) {
                    assert!(outcome.is_ok());
                } else {
                    assert!(outcome.unwrap_err().is_correlation());
                }
            }

            assert_eq!(table.len(), count - settled.len());
            for handle in pending {
                let request_id = handle.request_id();
                if settled.contains(&request_id) {
                    let result = handle.wait(None).await.unwrap();
                    assert_eq!(
                        result,
                        OperationResult::Payload(Some(request_id.to_le_bytes().to_vec()))
                    );
                }
            }
            assert!(table.is_empty());
        });
    }

    #[test]
    fn prop_request_ids_are_unique(callers in 1usize..8, per_caller in 1usize..64) {
        let table = Arc::new(OperationTable::new());
        let ids: Vec<i64> = std::thread::scope(|scope| {
            let workers: Vec<_> = (0..callers)
                .map(|_| {
                    let table = Arc::clone(&table);
                    scope.spawn(move || {
                        (0..per_caller).map(|_| table.next_request_id()).collect::<Vec<_>>()
                    })
                })
                .collect();
            workers
                .into_iter()
                .flat_map(|worker| worker.join().unwrap())
                .collect()
        });

        let unique: std::collections::HashSet<_> = ids.iter().copied().collect();
        prop_assert_eq!(unique.len(), callers * per_caller);
        prop_assert!(ids.iter().all(|id| *id >= 1));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_each_get_their_own_reply() {
    const CALLS: i64 = 200;
    let table = Arc::new(OperationTable::new());

    let mut waiters = Vec::new();
    for _ in 0..CALLS {
        let request_id = table.next_request_id();
        let pending = table.register(request_id, request_id % 7, MessageType::ActivityInvokeReply).unwrap();
        waiters.push(tokio::spawn(async move {
            let result = pending.wait(Some(std::time::Duration::from_secs(5))).await;
            (request_id, result)
        }));
    }

    // settle in reverse order from several tasks
    let mut settlers = Vec::new();
    for chunk in (1..=CALLS).rev().collect::<Vec<_>>().chunks(25) {
        let table = Arc::clone(&table);
        let chunk = chunk.to_vec();
        settlers.push(tokio::spawn(async move {
            for request_id in chunk {
                table
                    .resolve(
                        request_id,
                        Ok(OperationResult::Payload(Some(request_id.to_string().into_bytes()))),
                    )
                    .unwrap();
            }
        }));
    }
    for settler in settlers {
        settler.await.unwrap();
    }

    for waiter in waiters {
        let (request_id, result) = waiter.await.unwrap();
        assert_eq!(
            result.unwrap(),
            OperationResult::Payload(Some(request_id.to_string().into_bytes()))
        );
    }
    assert!(table.is_empty());
}

#[tokio::test]
async fn test_shutdown_error_reaches_every_waiter() {
    let table = Arc::new(OperationTable::new());
    let handles: Vec<_> = (1..=3).map(|id| table.register(id, 0, MessageType::PingReply).unwrap()).collect();

    assert_eq!(table.cancel_all(BridgeError::ShuttingDown), 3);
    for handle in handles {
        assert!(matches!(handle.wait(None).await, Err(BridgeError::ShuttingDown)));
    }
}
