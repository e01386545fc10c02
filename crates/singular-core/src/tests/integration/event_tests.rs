use std::sync::{Arc, Mutex};

use crate::event::{Event, EventResult, LifecycleEvent, sync_event_handler, sync_typed_handler};
use crate::kernel::Singular;
use crate::tests::common::{failing, tracked, tracker};

fn describe(event: &LifecycleEvent) -> String {
    match event.unit_name() {
        Some(unit) => format!("{} {}", event.name(), unit),
        None => event.name().to_string(),
    }
}

#[tokio::test]
async fn test_events_follow_lifecycle_order() {
    let calls = tracker();
    let engine = Singular::new();
    engine.register("a", tracked("a", &[], &calls), None).unwrap();
    engine.register("b", tracked("b", &["a"], &calls), None).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    engine
        .events()
        .register_type_handler::<LifecycleEvent>(sync_typed_handler(move |event: &LifecycleEvent| {
            sink.lock().unwrap().push(describe(event));
            EventResult::Continue
        }))
        .await;

    engine.start(1).await.unwrap();
    engine.stop(1).await.unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            "unit:started a",
            "unit:started b",
            "started",
            "unit:stopped b",
            "unit:stopped a",
            "stopped",
        ]
    );
}

#[tokio::test]
async fn test_shared_units_emit_events_once() {
    let calls = tracker();
    let engine = Singular::new();
    engine.register("a", tracked("a", &[], &calls), None).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    engine
        .events()
        .register_handler(
            LifecycleEvent::UNIT_STARTED,
            sync_event_handler(move |event| {
                sink.lock().unwrap().push(event.name());
                EventResult::Continue
            }),
        )
        .await;

    engine.start(1).await.unwrap();
    engine.start(2).await.unwrap();

    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_start_emits_no_thread_event() {
    let calls = tracker();
    let engine = Singular::new();
    engine.register("a", tracked("a", &[], &calls), None).unwrap();
    engine.register("b", failing("b", &["a"], &calls), None).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    engine
        .events()
        .register_type_handler::<LifecycleEvent>(sync_typed_handler(move |event: &LifecycleEvent| {
            sink.lock().unwrap().push(describe(event));
            EventResult::Continue
        }))
        .await;

    assert!(engine.start(1).await.is_err());
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["unit:started a", "unit:stopped a"]
    );
}

#[tokio::test]
async fn test_stopped_event_reports_failure() {
    let calls = tracker();
    let engine = Singular::new();
    engine
        .register("a", crate::tests::common::failing_stop("a", &[], &calls), None)
        .unwrap();

    let outcome = Arc::new(Mutex::new(None));
    let sink = outcome.clone();
    engine
        .events()
        .register_type_handler::<LifecycleEvent>(sync_typed_handler(move |event: &LifecycleEvent| {
            if let LifecycleEvent::Stopped { thread, success } = event {
                *sink.lock().unwrap() = Some((*thread, *success));
            }
            EventResult::Continue
        }))
        .await;

    engine.start(3).await.unwrap();
    assert!(engine.stop(3).await.is_err());
    assert_eq!(*outcome.lock().unwrap(), Some((3, false)));
    assert!(engine.active_threads().is_empty());
}
