//! Centralized integration tests for component-macros crate
//!
//! 宏生成的元数据经由类型目录进入容器构建流程。

use component_macros::component;
use di_abstractions::{ParameterSpec, ServiceContainer, ServiceContainerExt, TypeCatalog, TypeDescriptor};
use di_impl::ContainerBuilder;
use infrastructure_common::{Discoverable, Lifetime};
use std::sync::Arc;

pub trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

#[component(name = "time::FixedClock", singleton, eager, implements = "time::Clock", tag = "clock")]
pub struct FixedClock;

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        1_700_000_000
    }
}

#[component(name = "time::Scheduler", transient)]
pub struct Scheduler {
    clock: Arc<dyn Clock>,
}

#[component(name = "time::DebugClock", exclude, implements = "time::Clock")]
pub struct DebugClock;

fn catalog() -> TypeCatalog {
    TypeCatalog::new()
        .with(TypeDescriptor::interface("time::Clock"))
        .with(
            TypeDescriptor::discovered::<FixedClock>()
                .constructor(Vec::<ParameterSpec>::new(), |_| Ok(FixedClock))
                .implements("time::Clock", |it: Arc<FixedClock>| it as Arc<dyn Clock>),
        )
        .with(
            TypeDescriptor::discovered::<Scheduler>()
                .constructor([ParameterSpec::service("clock", "time::Clock")], |args| {
                    Ok(Scheduler {
                        clock: args.get::<dyn Clock>(0)?,
                    })
                }),
        )
        .with(
            TypeDescriptor::discovered::<DebugClock>()
                .constructor(Vec::<ParameterSpec>::new(), |_| Ok(DebugClock))
                .implements("time::Clock", |it: Arc<DebugClock>| it as Arc<dyn Clock>),
        )
}

#[test]
fn test_macro_metadata_drives_definitions() {
    let mut builder = ContainerBuilder::with_catalog(catalog());
    builder.without_parameter_resolver().scan_catalog("time").unwrap();

    let definitions = builder.definitions();
    assert!(!definitions.contains("time::DebugClock"));

    let clock = definitions.get("time::FixedClock").unwrap();
    assert_eq!(clock.get_lifetime(), Lifetime::Singleton);
    assert!(clock.has_explicit_lazy());
    assert_eq!(clock.get_tags(), ["clock".to_string()]);

    let scheduler = definitions.get("time::Scheduler").unwrap();
    assert!(!scheduler.is_singleton());
}

#[test]
fn test_excluded_implementation_does_not_cause_ambiguity() {
    let mut builder = ContainerBuilder::with_catalog(catalog());
    builder.without_parameter_resolver().scan_catalog("time").unwrap();
    let container = builder.build().unwrap();

    assert_eq!(
        container.bindings().get("time::Clock").map(|id| id.as_str()),
        Some("time::FixedClock")
    );

    let first = container.get_as::<Scheduler>("time::Scheduler").unwrap();
    let second = container.get_as::<Scheduler>("time::Scheduler").unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first.clock, &second.clock));
    assert_eq!(first.clock.now(), 1_700_000_000);
    assert_eq!(container.get_tagged("clock").count(), 1);
}

#[test]
fn test_service_id_matches_catalog_entry() {
    let catalog = catalog();
    assert!(catalog.instantiable(FixedClock::service_id().as_str()).is_some());
    assert!(catalog.instantiable(DebugClock::service_id().as_str()).is_some());
}
