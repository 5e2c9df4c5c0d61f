//! 容器解析行为测试

use super::fixtures::*;
use crate::builder::ContainerBuilder;
use config_impl::{EnvResolver, MapParameterSource};
use di_abstractions::{ParameterSpec, ServiceContainer, ServiceContainerExt, TypeDescriptor};
use infrastructure_common::{AutowireError, ContainerError, ServiceId};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn builder() -> ContainerBuilder {
    let mut builder = ContainerBuilder::with_catalog(catalog());
    builder.without_parameter_resolver();
    builder
}

fn same_object<A: ?Sized, B: ?Sized>(a: &Arc<A>, b: &Arc<B>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// 测试立即加载的单例两次解析得到同一实例
#[test]
fn test_eager_singleton_identity() {
    let mut builder = builder();
    builder.register("app::FileLogger").singleton().eager();
    let container = builder.build().unwrap();

    let first = container.get("app::FileLogger").unwrap();
    let second = container.get("app::FileLogger").unwrap();
    assert!(first.ptr_eq(&second));
    assert!(!first.is_lazy());
}

/// 测试瞬时服务每次解析得到新实例
#[test]
fn test_transient_distinctness() {
    let mut builder = builder();
    builder.register("app::FileLogger").transient().eager();
    let container = builder.build().unwrap();

    let first = container.get_as::<FileLogger>("app::FileLogger").unwrap();
    let second = container.get_as::<FileLogger>("app::FileLogger").unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(!container.is_cached("app::FileLogger"));
}

/// 测试绑定间接与缓存的解析顺序无关
#[test]
fn test_binding_commutes_with_caching() {
    let mut builder = builder();
    builder.register("app::FileLogger").eager();
    builder.bind("app::Logger", "app::FileLogger");

    let concrete_first = builder.build().unwrap();
    let concrete = concrete_first.get("app::FileLogger").unwrap();
    let via_interface = concrete_first.get("app::Logger").unwrap();
    assert!(concrete.ptr_eq(&via_interface));

    let interface_first = builder.build().unwrap();
    let via_interface = interface_first.get("app::Logger").unwrap();
    let concrete = interface_first.get("app::FileLogger").unwrap();
    assert!(concrete.ptr_eq(&via_interface));
    assert_eq!(via_interface.cast::<dyn Logger>().unwrap().name(), "file");
}

/// 测试延迟服务在首次访问前不会被构造
#[test]
fn test_lazy_service_is_not_materialized_until_used() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let mut builder = builder();
    builder.register_type(heavy_descriptor(Arc::clone(&constructed)));
    builder.register("app::Heavy").lazy(true);
    let container = builder.build().unwrap();

    let heavy = container.get("app::Heavy").unwrap();
    assert!(heavy.is_lazy());
    assert_eq!(constructed.load(Ordering::SeqCst), 0);

    heavy.cast::<Heavy>().unwrap();
    heavy.cast::<Heavy>().unwrap();
    container.get_as::<Heavy>("app::Heavy").unwrap();
    assert_eq!(constructed.load(Ordering::SeqCst), 1);
}

/// 测试延迟单例循环在运行期得到同一对象
#[test]
fn test_lazy_singleton_cycle_round_trips_to_same_object() {
    let mut builder = builder();
    builder.register("app::Left");
    builder.register("app::Right");
    let container = builder.build().unwrap();

    let left = container.get_as::<Left>("app::Left").unwrap();
    let right = left.right.get().unwrap();
    let left_again = right.left.get().unwrap();

    assert!(Arc::ptr_eq(&left, &left_again));
    assert!(same_object(&right, &container.get_as::<Right>("app::Right").unwrap()));
}

/// 测试工厂引入的循环在运行期被解析栈发现
#[test]
fn test_factory_cycle_is_caught_at_runtime() {
    let mut builder = builder();
    builder
        .register_factory("app::Loop", |container| Ok(container.get("app::Loop")?.into()))
        .eager();
    let container = builder.build().unwrap();

    let error = container.get("app::Loop").unwrap_err();
    match error {
        ContainerError::CircularDependency(cycle) => {
            assert_eq!(cycle.chain, vec![ServiceId::new("app::Loop"), ServiceId::new("app::Loop")]);
            assert!(cycle.unsafe_services.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(matches!(
        container.get("app::Loop"),
        Err(ContainerError::CircularDependency(_))
    ));
}

/// 测试工厂返回非对象值
#[test]
fn test_factory_must_return_an_object() {
    let mut builder = builder();
    builder
        .register_factory("app::Answer", |_| Ok(json!(42).into()))
        .eager();
    let container = builder.build().unwrap();

    let error = container.get("app::Answer").unwrap_err();
    assert_eq!(error.to_string(), "Factory for \"app::Answer\" must return an object.");
}

/// 测试未注册且无法自动装配的服务
#[test]
fn test_unknown_service_is_not_found() {
    let container = builder().build().unwrap();

    let error = container.get("app::Missing").unwrap_err();
    assert!(error.is_not_found());
    assert_eq!(
        error.to_string(),
        "Service \"app::Missing\" is not registered and cannot be auto-wired."
    );
    assert!(!container.has("app::Missing"));
}

/// 测试未注册的具体类型被自动装配，且每次注入同一个日志实例
#[test]
fn test_autowired_service_shares_singleton_dependency() {
    let mut catalog = catalog();
    catalog.register(mailer_descriptor().transient());
    let mut builder = ContainerBuilder::with_catalog(catalog);
    builder.without_parameter_resolver();
    builder.register("app::FileLogger").singleton().eager();
    builder.bind("app::Logger", "app::FileLogger");
    let container = builder.build().unwrap();

    assert!(container.has("app::Mailer"));
    let first = container.get_as::<Mailer>("app::Mailer").unwrap();
    let second = container.get_as::<Mailer>("app::Mailer").unwrap();
    let logger = container.get_as::<FileLogger>("app::FileLogger").unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert!(same_object(&first.logger, &logger));
    assert!(same_object(&second.logger, &logger));
    assert!(container.definitions().contains("app::Mailer"));
}

/// 测试参数表中的字符串按声明类型转换
#[test]
fn test_string_parameter_is_cast_to_int() {
    let mut builder = builder();
    builder.parameter("PORT", "8080");
    builder.register("app::Server").eager();
    let container = builder.build().unwrap();

    let server = container.get_as::<Server>("app::Server").unwrap();
    assert_eq!(server.port, 8080);
    assert!(!server.debug);
}

/// 测试缺失参数且无默认值时报告参数名
#[test]
fn test_missing_parameter_is_reported() {
    let mut builder = builder();
    builder.register("app::Server").eager();
    let container = builder.build().unwrap();

    let error = container.get("app::Server").unwrap_err();
    assert!(matches!(
        error,
        ContainerError::Autowire(AutowireError::MissingParameter { ref parameter, .. }) if parameter == "port"
    ));
    assert_eq!(
        error.to_string(),
        "Parameter \"PORT\" is not defined for parameter $port in app::Server::new()"
    );
}

/// 测试参数表缺失时回退到参数解析器
#[test]
fn test_parameter_falls_back_to_resolver() {
    let mut builder = ContainerBuilder::with_catalog(catalog());
    builder.parameter_resolver(Arc::new(
        EnvResolver::new().with_source(MapParameterSource::new("test").with_var("PORT", "9090")),
    ));
    builder.parameter("APP_DEBUG", "%env(PORT)%");
    builder.register("app::Server").eager();
    let container = builder.build().unwrap();

    assert_eq!(container.get_parameter("PORT"), Some(json!("9090")));
    assert_eq!(container.get_parameter("APP_DEBUG"), Some(json!("9090")));
    assert_eq!(container.get_parameter("NOPE"), None);
    assert_eq!(container.get_as::<Server>("app::Server").unwrap().port, 9090);
    assert_eq!(container.get_parameters().len(), 1);
}

/// 测试 setter 调用按注册顺序执行
#[test]
fn test_method_calls_run_after_construction() {
    let mut builder = builder();
    builder.register("app::FileLogger").eager();
    builder.bind("app::Logger", "app::FileLogger");
    builder
        .register("app::Mailer")
        .eager()
        .call("set_sender", ["first@example.com"])
        .call("set_sender", ["ops@example.com"]);
    let container = builder.build().unwrap();

    let mailer = container.get_as::<Mailer>("app::Mailer").unwrap();
    assert_eq!(*mailer.sender.lock(), "ops@example.com");
}

/// 测试调用未声明的 setter
#[test]
fn test_unknown_method_is_reported() {
    let mut builder = builder();
    builder.register("app::FileLogger").eager().call("rotate", Vec::<String>::new());
    let container = builder.build().unwrap();

    assert!(matches!(
        container.get("app::FileLogger"),
        Err(ContainerError::Autowire(AutowireError::UnknownMethod { .. }))
    ));
}

/// 测试按标签依次解析服务
#[test]
fn test_get_tagged_follows_registration_order() {
    let mut builder = builder();
    builder.register("app::NullLogger").tag("logger");
    builder.register("app::FileLogger").tag("logger");
    builder.register("app::Server").tag("other");
    let container = builder.build().unwrap();

    let names: Vec<&'static str> = container
        .get_tagged("logger")
        .map(|instance| instance.unwrap().cast::<dyn Logger>().unwrap().name())
        .collect();
    assert_eq!(names, vec!["null", "file"]);
    assert_eq!(container.get_tagged("missing").count(), 0);
}

/// 测试失败的解析会撤销本次写入的缓存
#[test]
fn test_failed_get_leaves_cache_untouched() {
    let mut builder = builder();
    builder.default_lazy(false);
    builder.register_type(
        TypeDescriptor::concrete("app::Broken").constructor(
            [
                ParameterSpec::service("logger", "app::FileLogger"),
                ParameterSpec::int("retries").param("RETRIES"),
            ],
            |_| Ok(()),
        ),
    );
    builder.register("app::FileLogger");
    builder.register("app::Broken");
    let container = builder.build().unwrap();

    assert!(container.get("app::Broken").is_err());
    assert!(!container.is_cached("app::FileLogger"));
    assert_eq!(container.cached_count(), 0);

    assert!(container.get("app::FileLogger").is_ok());
    assert!(container.is_cached("app::FileLogger"));
}

/// 测试容器释放后延迟代理无法物化
#[test]
fn test_lazy_proxy_outliving_container() {
    let mut builder = builder();
    builder.register("app::FileLogger").lazy(true);
    let container = builder.build().unwrap();

    let logger = container.get("app::FileLogger").unwrap();
    drop(container);

    assert!(matches!(
        logger.cast::<FileLogger>(),
        Err(ContainerError::ContainerDropped { .. })
    ));
}

/// 测试 has 覆盖缓存、定义、绑定与可实例化类型
#[test]
fn test_has() {
    let mut builder = builder();
    builder.register("app::FileLogger");
    builder.bind("app::Logger", "app::FileLogger");
    let container = builder.build().unwrap();

    assert!(container.has("app::FileLogger"));
    assert!(container.has("app::Logger"));
    assert!(container.has("app::NullLogger"));
    assert!(!container.has("app::Nothing"));
}

struct Clock;

struct Scheduler {
    clock: Arc<Clock>,
}

struct Dispatcher;

/// 测试失败的解析物化了此前缓存的延迟代理后，单例仍只有一个实例
#[test]
fn test_failed_get_keeps_singletons_materialized_by_a_cached_proxy() {
    let mut builder = builder();
    builder
        .register_type(
            TypeDescriptor::concrete("app::Clock").constructor(Vec::<ParameterSpec>::new(), |_| Ok(Clock)),
        )
        .register_type(
            TypeDescriptor::concrete("app::Scheduler")
                .constructor([ParameterSpec::service("clock", "app::Clock")], |args| {
                    Ok(Scheduler {
                        clock: args.get::<Clock>(0)?,
                    })
                }),
        )
        .register_type(
            TypeDescriptor::concrete("app::Dispatcher")
                .constructor([ParameterSpec::service("scheduler", "app::Scheduler")], |args| {
                    args.get::<Scheduler>(0)?;
                    Ok(Dispatcher)
                }),
        );
    builder.register("app::Clock").singleton().eager();
    builder.register("app::Scheduler").singleton().lazy(true);
    builder
        .register("app::Dispatcher")
        .eager()
        .call("drain", Vec::<String>::new());
    let container = builder.build().unwrap();

    let scheduler = container.get("app::Scheduler").unwrap();
    assert!(!scheduler.is_materialized());

    assert!(matches!(
        container.get("app::Dispatcher"),
        Err(ContainerError::Autowire(AutowireError::UnknownMethod { .. }))
    ));
    assert!(scheduler.is_materialized());
    assert!(container.is_cached("app::Clock"));

    let held = container.get_as::<Scheduler>("app::Scheduler").unwrap().clock.clone();
    let clock = container.get_as::<Clock>("app::Clock").unwrap();
    assert!(Arc::ptr_eq(&held, &clock));
}

/// 测试构造函数 panic 后当前线程的解析状态被复原
#[test]
fn test_panicking_constructor_does_not_disable_rollback() {
    let mut builder = builder();
    builder.default_lazy(false);
    builder
        .register_type(
            TypeDescriptor::concrete("app::Exploding").constructor(
                [ParameterSpec::service("logger", "app::FileLogger")],
                |_| -> Result<(), ContainerError> { panic!("constructor exploded") },
            ),
        )
        .register_type(
            TypeDescriptor::concrete("app::Broken").constructor(
                [
                    ParameterSpec::service("logger", "app::FileLogger"),
                    ParameterSpec::int("retries").param("RETRIES"),
                ],
                |_| Ok(()),
            ),
        );
    builder.register("app::FileLogger");
    builder.register("app::Exploding");
    builder.register("app::Broken");
    let container = builder.build().unwrap();

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| container.get("app::Exploding")));
    assert!(outcome.is_err());
    assert!(!container.is_cached("app::FileLogger"));

    assert!(container.get("app::Broken").is_err());
    assert!(!container.is_cached("app::FileLogger"));
    assert_eq!(container.cached_count(), 0);

    assert!(container.get("app::FileLogger").is_ok());
}

struct AuditSink;

/// 测试按需合成的定义同样应用自动配置规则与声明式标签
#[test]
fn test_synthesized_definition_is_autoconfigured() {
    let mut builder = builder();
    builder
        .register_type(TypeDescriptor::interface("app::Sink").autoconfigure_tag("sink"))
        .register_type(
            TypeDescriptor::concrete("app::AuditSink")
                .constructor(Vec::<ParameterSpec>::new(), |_| Ok(AuditSink))
                .implements_id("app::Sink"),
        );
    builder.register_for_autoconfiguration("app::Logger").transient().tag("logger");
    let container = builder.build().unwrap();

    let first = container.get_as::<FileLogger>("app::FileLogger").unwrap();
    let second = container.get_as::<FileLogger>("app::FileLogger").unwrap();
    assert!(!Arc::ptr_eq(&first, &second));

    container.get_as::<AuditSink>("app::AuditSink").unwrap();

    let definitions = container.definitions();
    let logger = definitions.get("app::FileLogger").unwrap();
    assert!(!logger.is_singleton());
    assert_eq!(logger.get_tags(), ["logger".to_string()]);
    assert_eq!(
        definitions.get("app::AuditSink").unwrap().get_tags(),
        ["sink".to_string()]
    );
}
