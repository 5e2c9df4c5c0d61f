//! Centralized integration tests for di-impl crate
//!
//! 项目目录中的 `.env` 文件、参数表与容器解析的端到端场景。

use config_impl::EnvResolver;
use di_abstractions::{ParameterSpec, ServiceContainer, ServiceContainerExt, TypeCatalog, TypeDescriptor};
use di_impl::ContainerBuilder;
use infrastructure_common::ContainerError;
use serde_json::json;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

struct Database {
    dsn: String,
    pool: i64,
    replicas: Vec<String>,
}

fn project_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(".env"),
        "# 默认值\nWIRING_IT_DSN=postgres://localhost/app\nWIRING_IT_POOL=5\nWIRING_IT_REPLICAS='[\"r1\",\"r2\"]'\n",
    )
    .unwrap();
    fs::write(dir.path().join(".env.local"), "WIRING_IT_POOL=10\n").unwrap();
    dir
}

fn catalog() -> TypeCatalog {
    TypeCatalog::new().with(TypeDescriptor::concrete("db::Database").constructor(
        [
            ParameterSpec::string("dsn").param("db.dsn"),
            ParameterSpec::int("pool").param("db.pool"),
            ParameterSpec::array("replicas").param("db.replicas"),
        ],
        |args| {
            Ok(Database {
                dsn: args.string(0)?,
                pool: args.int(1)?,
                replicas: args.deserialize(2)?,
            })
        },
    ))
}

fn builder(dir: &TempDir) -> ContainerBuilder {
    let mut builder = ContainerBuilder::with_catalog(catalog());
    builder
        .parameter_resolver(Arc::new(EnvResolver::from_project_dir(dir.path())))
        .parameter("db.dsn", "%env(WIRING_IT_DSN)%")
        .parameter("db.pool", "%env(int:WIRING_IT_POOL)%")
        .parameter("db.replicas", "%env(WIRING_IT_REPLICAS)%");
    builder
}

#[test]
fn test_env_files_feed_parameters() {
    let dir = project_dir();
    let container = builder(&dir).build().unwrap();

    assert_eq!(container.get_parameter("db.pool"), Some(json!(10)));

    // 未注册的类型按需合成定义
    let database = container.get_as::<Database>("db::Database").unwrap();
    assert_eq!(database.dsn, "postgres://localhost/app");
    assert_eq!(database.pool, 10);
    assert_eq!(database.replicas, vec!["r1".to_string(), "r2".to_string()]);
    assert!(container.definitions().contains("db::Database"));
}

#[test]
fn test_parameter_lookup_falls_back_to_env_files() {
    let dir = project_dir();
    let container = builder(&dir).build().unwrap();

    assert_eq!(
        container.get_parameter("WIRING_IT_DSN"),
        Some(json!("postgres://localhost/app"))
    );
    assert_eq!(container.get_parameter("WIRING_IT_UNKNOWN"), None);
    assert_eq!(container.get_parameters().len(), 3);
}

#[test]
fn test_factory_cycle_is_reported_and_rolled_back() {
    let dir = project_dir();
    let mut builder = builder(&dir);
    builder.register_factory("jobs::Ping", |container| Ok(container.get("jobs::Pong")?.into()));
    builder.register_factory("jobs::Pong", |container| Ok(container.get("jobs::Ping")?.into()));
    builder.default_lazy(false);
    let container = builder.build().unwrap();

    let error = container.get("jobs::Ping").unwrap_err();
    assert!(matches!(error, ContainerError::CircularDependency(_)));
    assert_eq!(
        error.to_string(),
        "Circular dependency detected: jobs::Ping -> jobs::Pong -> jobs::Ping"
    );
    assert!(!container.is_cached("jobs::Ping"));
    assert!(!container.is_cached("jobs::Pong"));
}
