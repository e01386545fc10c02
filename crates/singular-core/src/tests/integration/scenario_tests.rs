use std::sync::Arc;

use crate::kernel::Singular;
use crate::kernel::error::DynError;
use crate::tests::common::{entries, failing, init_logger, tracked, tracker};
use crate::unit::{Instance, UnitBuilder, UnitDescriptor};

fn plus_one() -> UnitDescriptor {
    UnitBuilder::new()
        .depends_on("a")
        .on_start(|_config, scope, _exports| async move {
            let a = scope.get_as::<i64>("a")?;
            Ok::<_, DynError>(Some(Instance::new(*a + 1)))
        })
        .build()
}

fn times_two() -> UnitDescriptor {
    UnitBuilder::new()
        .depends_on("b")
        .on_start(|_config, scope, _exports| async move {
            let b = scope.get_as::<i64>("b")?;
            Ok::<_, DynError>(Some(Instance::new(*b * 2)))
        })
        .build()
}

#[tokio::test]
async fn test_chained_units_compute_their_values() {
    init_logger();
    let engine = Singular::builder()
        .unit("c", times_two())
        .unit("b", plus_one())
        .value("a", 1i64)
        .build()
        .unwrap();

    let thread = engine.start(1).await.unwrap();
    let scope = thread.scope();
    let values: Vec<(String, i64)> = scope
        .iter()
        .map(|(name, instance)| (name.to_string(), *instance.downcast::<i64>().unwrap()))
        .collect();

    assert_eq!(
        values,
        vec![("a".to_string(), 1), ("b".to_string(), 2), ("c".to_string(), 4)]
    );
    assert_eq!(*engine.get_as::<i64>("c").unwrap(), 4);

    engine.stop(1).await.unwrap();
    assert!(engine.get("a").is_err());
}

#[tokio::test]
async fn test_run_reads_the_computed_scope() {
    let engine = Singular::new();
    engine.register_value("a", 1i64).unwrap();
    engine.register("b", plus_one(), None).unwrap();
    engine.register("c", times_two(), None).unwrap();

    let total = engine
        .run_units(&["c"], |scope| async move {
            Ok::<_, DynError>(*scope.get_as::<i64>("c")?)
        })
        .await
        .unwrap();

    assert_eq!(total, 4);
    assert!(!engine.is_running("a"));
}

#[tokio::test]
async fn test_overlapping_threads_share_units() {
    let calls = tracker();
    let engine = Singular::new();
    engine.register("db", tracked("db", &[], &calls), None).unwrap();
    engine.register("api", tracked("api", &["db"], &calls), None).unwrap();
    engine.register("jobs", tracked("jobs", &["db"], &calls), None).unwrap();

    engine.start_units(1, &["api"]).await.unwrap();
    engine.start_units(2, &["jobs"]).await.unwrap();
    assert_eq!(engine.ref_count("db"), 2);

    engine.stop(1).await.unwrap();
    assert!(engine.is_running("db"));
    assert!(!engine.is_running("api"));
    engine.stop(2).await.unwrap();

    assert_eq!(
        entries(&calls),
        vec!["start:db", "start:api", "start:jobs", "stop:api", "stop:jobs", "stop:db"]
    );
}

#[tokio::test]
async fn test_failed_thread_does_not_disturb_running_one() {
    let calls = tracker();
    let engine = Singular::new();
    engine.register("db", tracked("db", &[], &calls), None).unwrap();
    engine.register("api", tracked("api", &["db"], &calls), None).unwrap();
    engine.register("broken", failing("broken", &["db"], &calls), None).unwrap();

    let api = engine.start_units(1, &["api"]).await.unwrap();
    let api_before = api.scope().get("api").unwrap();

    assert!(engine.start_units(2, &["broken"]).await.is_err());
    assert_eq!(engine.ref_count("db"), 1);
    assert!(engine.get("api").unwrap().ptr_eq(&api_before));
    assert_eq!(engine.active_threads(), vec![1]);

    engine.stop(1).await.unwrap();
    assert_eq!(
        entries(&calls),
        vec!["start:db", "start:api", "start:broken", "stop:api", "stop:db"]
    );
}

#[tokio::test]
async fn test_instances_are_shared_not_copied() {
    let engine = Singular::new();
    engine
        .register("pool", UnitDescriptor::value(Arc::new(vec![1, 2, 3])), None)
        .unwrap();

    let first = engine.start(1).await.unwrap();
    let second = engine.start(2).await.unwrap();
    let a = first.scope().get("pool").unwrap();
    let b = second.scope().get("pool").unwrap();
    assert!(a.ptr_eq(&b));
}
