use std::sync::Arc;

use futures::future::join_all;

use crate::kernel::Singular;
use crate::tests::common::CountingUnit;
use crate::unit::{UnitDependency, UnitDescriptor};

const THREADS: usize = 8;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_threads_start_shared_unit_once() {
    let unit = Arc::new(CountingUnit {
        pause: true,
        ..CountingUnit::new()
    });
    let engine = Singular::new();
    engine
        .register("pool", UnitDescriptor::from_arc(unit.clone()), None)
        .unwrap();

    let tasks = (0..THREADS).map(|_| {
        let engine = engine.clone();
        tokio::spawn(async move { engine.spawn::<&str>(None).await })
    });
    let threads: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert_eq!(unit.starts(), 1);
    assert_eq!(engine.ref_count("pool"), THREADS);

    let mut ids: Vec<_> = threads.iter().map(|thread| thread.id()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), THREADS);

    engine.stop_all().await.unwrap();
    assert_eq!(unit.stops(), 1);
    assert_eq!(engine.ref_count("pool"), 0);
    assert!(engine.active_threads().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_start_and_stop_keep_counts_consistent() {
    let base = Arc::new(CountingUnit {
        pause: true,
        ..CountingUnit::new()
    });
    let leaf = CountingUnit {
        deps: vec![UnitDependency::hard("base")],
        pause: true,
        ..CountingUnit::new()
    };

    let engine = Singular::new();
    engine
        .register("base", UnitDescriptor::from_arc(base.clone()), None)
        .unwrap();
    engine.register("leaf", UnitDescriptor::new(leaf), None).unwrap();

    let tasks = (0..THREADS).map(|_| {
        let engine = engine.clone();
        tokio::spawn(async move {
            let thread = engine.spawn(Some(&["leaf"][..])).await?;
            tokio::task::yield_now().await;
            engine.stop(thread.id()).await
        })
    });
    for joined in join_all(tasks).await {
        joined.unwrap().unwrap();
    }

    assert!(base.starts() >= 1);
    assert_eq!(base.stops(), base.starts());
    assert!(!engine.is_running("base"));
    assert!(!engine.is_running("leaf"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_competing_explicit_ids_conflict() {
    let engine = Singular::new();
    engine.register("pool", UnitDescriptor::new(CountingUnit::new()), None).unwrap();

    let tasks = (0..4).map(|_| {
        let engine = engine.clone();
        tokio::spawn(async move { engine.start(42).await })
    });
    let outcomes: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert_eq!(engine.ref_count("pool"), 1);
}
