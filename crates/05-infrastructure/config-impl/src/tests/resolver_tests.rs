//! 环境变量表达式解析测试

use crate::providers::MapParameterSource;
use crate::resolver::*;
use config_abstractions::ParameterResolver;
use infrastructure_common::ConfigError;
use serde_json::json;

fn resolver() -> EnvResolver {
    EnvResolver::new().with_source(
        MapParameterSource::new("test")
            .with_var("DB_HOST", "localhost")
            .with_var("APP_DEBUG", "true")
            .with_var("PORT", "8080")
            .with_var("RATE", "1.5")
            .with_var("NAME", "not-a-number"),
    )
}

/// 测试整体表达式返回类型化的值
#[test]
fn test_whole_expression_is_typed() {
    let resolver = resolver();

    assert_eq!(resolver.resolve(&json!("%env(DB_HOST)%")).unwrap(), json!("localhost"));
    assert_eq!(resolver.resolve(&json!("%env(string:PORT)%")).unwrap(), json!("8080"));
    assert_eq!(resolver.resolve(&json!("%env(bool:APP_DEBUG)%")).unwrap(), json!(true));
    assert_eq!(resolver.resolve(&json!("%env(int:PORT)%")).unwrap(), json!(8080));
    assert_eq!(resolver.resolve(&json!("%env(float:RATE)%")).unwrap(), json!(1.5));
}

/// 测试嵌入字符串中的表达式
#[test]
fn test_embedded_expressions() {
    let resolver = resolver();

    assert_eq!(
        resolver.resolve(&json!("host: %env(DB_HOST)%")).unwrap(),
        json!("host: localhost")
    );
    assert_eq!(
        resolver.resolve(&json!("%env(DB_HOST)%:%env(int:PORT)%")).unwrap(),
        json!("localhost:8080")
    );
}

/// 测试普通值原样通过
#[test]
fn test_plain_values_pass_through() {
    let resolver = resolver();

    assert_eq!(resolver.resolve(&json!("plain value")).unwrap(), json!("plain value"));
    assert_eq!(resolver.resolve(&json!(42)).unwrap(), json!(42));
    assert_eq!(resolver.resolve(&json!("%env(lower-case)%")).unwrap(), json!("%env(lower-case)%"));
}

/// 测试数组与对象递归解析
#[test]
fn test_nested_values_are_resolved() {
    let resolver = resolver();

    assert_eq!(
        resolver
            .resolve(&json!({"hosts": ["%env(DB_HOST)%"], "port": "%env(int:PORT)%"}))
            .unwrap(),
        json!({"hosts": ["localhost"], "port": 8080})
    );
}

/// 测试未定义变量立即失败
#[test]
fn test_undefined_variable_fails_fast() {
    let error = resolver().resolve(&json!("%env(MISSING_VAR)%")).unwrap_err();
    assert!(matches!(error, ConfigError::UndefinedVariable { ref name } if name == "MISSING_VAR"));

    let error = resolver().resolve(&json!("x-%env(MISSING_VAR)%")).unwrap_err();
    assert!(matches!(error, ConfigError::UndefinedVariable { .. }));
}

/// 测试类型转换失败
#[test]
fn test_invalid_cast_is_an_error() {
    let error = resolver().resolve(&json!("%env(int:NAME)%")).unwrap_err();
    assert!(matches!(error, ConfigError::TypeConversionError { .. }));
}

/// 测试 get 查询与未定义值
#[test]
fn test_get() {
    let resolver = resolver();
    assert_eq!(resolver.get("PORT"), Some(json!("8080")));
    assert_eq!(resolver.get("DOES_NOT_EXIST"), None);
}

/// 测试项目目录中 .env.local 覆盖 .env，进程环境变量优先于两者
#[test]
fn test_project_dir_precedence() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(".env"),
        "WIRING_PRECEDENCE_HOST=from_dotenv\nWIRING_PRECEDENCE_ONLY=dotenv\nWIRING_PRECEDENCE_ENV=dotenv\n",
    )
    .unwrap();
    std::fs::write(dir.path().join(".env.local"), "WIRING_PRECEDENCE_HOST=from_local\n").unwrap();
    std::env::set_var("WIRING_PRECEDENCE_ENV", "process");

    let resolver = EnvResolver::from_project_dir(dir.path());

    assert_eq!(resolver.lookup("WIRING_PRECEDENCE_HOST").as_deref(), Some("from_local"));
    assert_eq!(resolver.lookup("WIRING_PRECEDENCE_ONLY").as_deref(), Some("dotenv"));
    assert_eq!(resolver.lookup("WIRING_PRECEDENCE_ENV").as_deref(), Some("process"));
    assert_eq!(resolver.source_names(), vec!["environment", "dotenv", "dotenv"]);
}

/// 测试宽松布尔判定
#[test]
fn test_truthy() {
    assert!(is_truthy("1"));
    assert!(is_truthy("Yes"));
    assert!(is_truthy(" on "));
    assert!(!is_truthy("false"));
    assert!(!is_truthy("0"));
    assert!(!is_truthy(""));
}
