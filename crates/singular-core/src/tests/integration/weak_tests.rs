use std::sync::{Arc, Mutex};

use crate::kernel::Singular;
use crate::kernel::error::DynError;
use crate::scope::LazyInstance;
use crate::unit::{Instance, UnitBuilder};

#[tokio::test]
async fn test_mutual_weak_dependencies_resolve_after_start() {
    let captured: Arc<Mutex<Option<LazyInstance>>> = Arc::new(Mutex::new(None));
    let seen_by_b = Arc::new(Mutex::new(None));

    let a_capture = captured.clone();
    let a = UnitBuilder::new()
        .weakly_depends_on("b")
        .on_start(move |_config, scope, _exports| {
            let captured = a_capture.clone();
            async move {
                let lazy = scope.weak("b").ok_or("b is not a weak dependency of a")?;
                assert!(!lazy.is_live());
                *captured.lock().unwrap() = Some(lazy);
                Ok::<_, DynError>(Some(Instance::new("a".to_string())))
            }
        })
        .build();

    let b_seen = seen_by_b.clone();
    let b = UnitBuilder::new()
        .weakly_depends_on("a")
        .on_start(move |_config, scope, _exports| {
            let seen = b_seen.clone();
            async move {
                let lazy = scope.weak("a").ok_or("a is not a weak dependency of b")?;
                *seen.lock().unwrap() = Some(lazy.get_as::<String>()?.to_string());
                Ok::<_, DynError>(Some(Instance::new("b".to_string())))
            }
        })
        .build();

    let engine = Singular::builder().unit("b", b).unit("a", a).build().unwrap();
    assert_eq!(engine.order(), vec!["a", "b"]);

    engine.start(1).await.unwrap();

    assert_eq!(seen_by_b.lock().unwrap().as_deref(), Some("a"));
    let lazy = captured.lock().unwrap().clone().unwrap();
    assert_eq!(lazy.target(), "b");
    assert_eq!(*lazy.get_as::<String>().unwrap(), "b");

    engine.stop(1).await.unwrap();
    assert!(!lazy.is_live());
    assert!(lazy.get().is_err());
}

#[tokio::test]
async fn test_weak_dependency_is_not_started_with_subset() {
    let engine = Singular::new();
    engine
        .register(
            "cache",
            UnitBuilder::new()
                .on_start(|_config, _scope, _exports| async move {
                    Ok::<_, DynError>(Some(Instance::new(0u32)))
                })
                .build(),
            None,
        )
        .unwrap();
    engine
        .register(
            "api",
            UnitBuilder::new()
                .weakly_depends_on("cache")
                .on_start(|_config, scope, _exports| async move {
                    let cache = scope.weak("cache").ok_or("missing weak handle")?;
                    Ok::<_, DynError>(Some(Instance::new(cache.is_live())))
                })
                .build(),
            None,
        )
        .unwrap();

    let thread = engine.start_units(1, &["api"]).await.unwrap();
    assert_eq!(thread.order(), ["api".to_string()]);
    assert!(!engine.is_running("cache"));
    assert!(!*thread.scope().get_as::<bool>("api").unwrap());
}

#[tokio::test]
async fn test_lazy_handle_outlives_engine() {
    let captured: Arc<Mutex<Option<LazyInstance>>> = Arc::new(Mutex::new(None));
    let capture = captured.clone();

    let engine = Singular::new();
    engine.register_value("peer", 5u16).unwrap();
    engine
        .register(
            "watcher",
            UnitBuilder::new()
                .weakly_depends_on("peer")
                .on_start(move |_config, scope, _exports| {
                    let captured = capture.clone();
                    async move {
                        *captured.lock().unwrap() = scope.weak("peer");
                        Ok::<Option<Instance>, DynError>(None)
                    }
                })
                .build(),
            None,
        )
        .unwrap();

    engine.start(1).await.unwrap();
    let lazy = captured.lock().unwrap().clone().unwrap();
    assert_eq!(*lazy.get_as::<u16>().unwrap(), 5);

    drop(engine);
    assert!(!lazy.is_live());
    assert!(lazy.get().is_err());
}
