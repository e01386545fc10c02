//! Three chained units: `a` is a literal, `b = a + 1`, `c = b * 2`.
//!
//! Run with `RUST_LOG=debug cargo run --example readme` to watch the
//! lifecycle steps.
use singular_core::{DynError, Instance, Singular, UnitBuilder};

#[tokio::main]
async fn main() -> Result<(), singular_core::Error> {
    env_logger::init();

    let engine = Singular::builder()
        .unit(
            "c",
            UnitBuilder::new()
                .depends_on("b")
                .on_start(|_config, scope, _exports| async move {
                    let b = scope.get_as::<i64>("b")?;
                    Ok::<_, DynError>(Some(Instance::new(*b * 2)))
                })
                .on_stop(|_config, _scope, _instance| async move {
                    println!("c stopped");
                    Ok::<_, DynError>(())
                })
                .build(),
        )
        .unit(
            "b",
            UnitBuilder::new()
                .depends_on("a")
                .on_start(|_config, scope, _exports| async move {
                    let a = scope.get_as::<i64>("a")?;
                    Ok::<_, DynError>(Some(Instance::new(*a + 1)))
                })
                .build(),
        )
        .value("a", 1i64)
        .build()?;

    println!("order: {:?}", engine.order());

    let thread = engine.start(1).await?;
    for (name, instance) in thread.scope().iter() {
        if let Some(value) = instance.downcast_ref::<i64>() {
            println!("{} = {}", name, value);
        }
    }
    engine.stop(thread.id()).await?;

    let c = engine
        .run_units(&["c"], |scope| async move { Ok::<_, DynError>(*scope.get_as::<i64>("c")?) })
        .await?;
    println!("c via run = {}", c);

    Ok(())
}
