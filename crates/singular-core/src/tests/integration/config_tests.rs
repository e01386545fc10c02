use std::sync::{Arc, Mutex};

use crate::config::{ConfigData, EngineConfig};
use crate::kernel::Singular;
use crate::kernel::error::DynError;
use crate::unit::{Instance, UnitBuilder, UnitDescriptor};

fn echo_config(seen: &Arc<Mutex<Vec<ConfigData>>>) -> UnitDescriptor {
    let seen = seen.clone();
    UnitBuilder::new()
        .default("x", 0)
        .default("mode", "dev")
        .on_start(move |config, _scope, _exports| {
            let seen = seen.clone();
            async move {
                seen.lock().unwrap().push(config);
                Ok::<Option<Instance>, DynError>(None)
            }
        })
        .build()
}

#[tokio::test]
async fn test_registration_override_beats_defaults() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let engine = Singular::new();
    engine
        .register("a", echo_config(&seen), Some(ConfigData::new().with("x", 1).unwrap()))
        .unwrap();

    engine.start(1).await.unwrap();

    let configs = seen.lock().unwrap().clone();
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].get::<i64>("x"), Some(1));
    assert_eq!(configs[0].get::<String>("mode").as_deref(), Some("dev"));
}

#[tokio::test]
async fn test_engine_config_used_without_override() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let config = EngineConfig::new().with_unit("a", ConfigData::new().with("mode", "prod").unwrap());
    let engine = Singular::with_config(config);
    engine.register("a", echo_config(&seen), None).unwrap();

    engine.run(|_scope| async { Ok::<_, DynError>(()) }).await.unwrap();

    let configs = seen.lock().unwrap().clone();
    assert_eq!(configs[0].get::<i64>("x"), Some(0));
    assert_eq!(configs[0].get::<String>("mode").as_deref(), Some("prod"));
}

#[tokio::test]
async fn test_config_is_fixed_at_registration() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let engine = Singular::new();
    engine.register("a", echo_config(&seen), None).unwrap();

    let mut snapshot = engine.unit_config("a").unwrap();
    snapshot.set("x", 99).unwrap();

    engine.start(1).await.unwrap();
    engine.stop(1).await.unwrap();
    engine.start(2).await.unwrap();

    let configs = seen.lock().unwrap().clone();
    assert_eq!(configs.len(), 2);
    assert!(configs.iter().all(|config| config.get::<i64>("x") == Some(0)));
}
