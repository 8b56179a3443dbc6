//! Concurrency tests: many callers against shared paths and handles.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracker_tree::TrackerError;

mod common;
use common::{factory, path};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bumps_converge() {
    let factory = factory();
    let keeper = factory.locate_counter("load/hits").unwrap();

    let mut tasks = Vec::new();
    for _ in 0..100 {
        let factory = factory.clone();
        tasks.push(tokio::spawn(async move {
            let client = factory.locate_counter("load/hits").unwrap();
            client.bump(1).unwrap();
            client.detach().unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(keeper.value().await.unwrap(), 100);
    assert_eq!(keeper.snapshot().await.unwrap().bindings, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shared_handle_across_tasks() {
    let factory = factory();
    let counter = Arc::new(factory.locate_counter("shared").unwrap());

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let counter = counter.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..1000 {
                counter.bump(1).unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(counter.value().await.unwrap(), 8000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_locates_create_one_node() {
    let factory = factory();

    let mut tasks = Vec::new();
    for _ in 0..50 {
        let factory = factory.clone();
        tasks.push(tokio::spawn(async move {
            factory.locate_counter("race/fresh").unwrap()
        }));
    }
    let mut handles = Vec::new();
    for task in tasks {
        handles.push(task.await.unwrap());
    }

    let mut ids = HashSet::new();
    for handle in &handles {
        ids.insert(handle.snapshot().await.unwrap().id);
    }
    assert_eq!(ids.len(), 1);
    assert_eq!(handles[0].snapshot().await.unwrap().bindings, 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_bind_churn_leaves_no_node_behind() {
    let factory = factory();
    let tree = factory.tree().clone();

    let mut tasks = Vec::new();
    for worker in 0..20 {
        let factory = factory.clone();
        tasks.push(tokio::spawn(async move {
            for round in 0..50 {
                let client = factory.locate_counter("churn/session").unwrap();
                client.bump(1).unwrap();
                if (worker + round) % 2 == 0 {
                    client.detach().unwrap();
                } else {
                    client.shutdown().unwrap();
                }
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert!(!tree.contains(&path("churn/session")));
    assert!(tree.is_empty());

    let fresh = factory.locate_counter("churn/session").unwrap();
    assert_eq!(fresh.value().await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_independent_paths_do_not_interfere() {
    let factory = factory();

    let mut tasks = Vec::new();
    for i in 0..16 {
        let factory = factory.clone();
        tasks.push(tokio::spawn(async move {
            let client = factory.locate_counter(&format!("fleet/node-{}", i)).unwrap();
            for _ in 0..=i {
                client.bump(1).unwrap();
            }
            let value = client.value().await.unwrap();
            (i, value, client)
        }));
    }
    let mut clients = Vec::new();
    for task in tasks {
        let (i, value, client) = task.await.unwrap();
        assert_eq!(value, i as i64 + 1);
        clients.push(client);
    }

    let fleet = factory.tree().snapshot(&path("fleet")).await.unwrap();
    assert_eq!(fleet.children.len(), 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shutdown_during_locates_leaves_tree_empty() {
    let factory = factory();
    let tree = factory.tree().clone();

    let mut tasks = Vec::new();
    for worker in 0..8 {
        let factory = factory.clone();
        tasks.push(tokio::spawn(async move {
            let mut kept = Vec::new();
            let mut round = 0;
            loop {
                match factory.locate_counter(&format!("late/w{}/r{}", worker, round)) {
                    Ok(client) => kept.push(client),
                    Err(TrackerError::TreeClosed) => return kept,
                    Err(e) => panic!("unexpected locate error: {}", e),
                }
                round += 1;
                tokio::task::yield_now().await;
            }
        }));
    }

    tokio::time::sleep(Duration::from_millis(20)).await;
    tree.shutdown();

    let mut kept = Vec::new();
    for task in tasks {
        kept.extend(task.await.unwrap());
    }
    assert!(tree.is_empty());

    // Closing handles of a shut-down tree touches nothing.
    drop(kept);
    assert!(tree.is_empty());
    assert_eq!(factory.locate("late/again").unwrap_err(), TrackerError::TreeClosed);
}
