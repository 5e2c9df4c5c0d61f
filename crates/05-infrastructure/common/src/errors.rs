//! 错误类型定义
//!
//! 错误消息面向运维人员，格式保持稳定。

use crate::metadata::ServiceId;
use std::fmt;
use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to read configuration file: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Configuration key not found: {key}")]
    KeyNotFound { key: String },

    #[error("Configuration type conversion failed: {message}")]
    TypeConversionError { message: String },

    #[error("Environment variable \"{name}\" is not defined.")]
    UndefinedVariable { name: String },
}

impl ConfigError {
    /// 创建解析错误
    pub fn parse_error(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::ParseError {
            source: source.into(),
        }
    }

    /// 创建类型转换错误
    pub fn type_conversion(message: impl Into<String>) -> Self {
        Self::TypeConversionError {
            message: message.into(),
        }
    }
}

/// 自动装配错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AutowireError {
    #[error("Cannot resolve parameter ${parameter} in {owner}(){}", type_hint(.declared_type))]
    UnresolvableParameter {
        parameter: String,
        owner: String,
        declared_type: Option<String>,
    },

    #[error("Parameter \"{key}\" is not defined for parameter ${parameter} in {owner}()")]
    MissingParameter {
        key: String,
        parameter: String,
        owner: String,
    },

    #[error("Type \"{type_name}\" does not exist or cannot be reflected.")]
    TypeNotFound { type_name: ServiceId },

    #[error("Type \"{type_name}\" is not instantiable (abstract or interface).")]
    NotInstantiable { type_name: ServiceId },

    #[error("Method \"{method}\" is not declared on type \"{type_name}\".")]
    UnknownMethod { type_name: ServiceId, method: String },

    #[error("Argument ${parameter} of {owner}() is not {expected}.")]
    ArgumentMismatch {
        owner: String,
        parameter: String,
        expected: &'static str,
    },

    #[error("{owner}() has no argument at position {index}.")]
    MissingArgument { owner: String, index: usize },
}

fn type_hint(declared_type: &Option<String>) -> String {
    declared_type
        .as_ref()
        .map(|ty| format!(" (type: {ty})"))
        .unwrap_or_default()
}

/// 循环依赖中某个参与者不安全的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsafeReason {
    /// 非延迟加载
    NotLazy,
    /// 非单例
    NotSingleton,
}

impl fmt::Display for UnsafeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotLazy => f.write_str("not lazy"),
            Self::NotSingleton => f.write_str("not a singleton"),
        }
    }
}

/// 循环依赖中的不安全参与者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsafeService {
    /// 服务标识符
    pub id: ServiceId,
    /// 不安全原因
    pub reasons: Vec<UnsafeReason>,
    /// 延迟加载是否为显式声明（而非默认值）
    pub explicit_lazy: bool,
}

impl fmt::Display for UnsafeService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reasons: Vec<String> = self.reasons.iter().map(ToString::to_string).collect();
        write!(f, "{} ({})", self.id.short_name(), reasons.join(", "))
    }
}

/// 循环依赖错误
///
/// 构建期检测时 `unsafe_services` 列出不满足"延迟单例"条件的参与者；
/// 运行期检测（解析栈重入）时为空。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Circular dependency detected: {}{}", format_chain(.chain), format_unsafe(.unsafe_services))]
pub struct CircularDependencyError {
    /// 依赖链，首尾为同一服务
    pub chain: Vec<ServiceId>,
    /// 不安全参与者
    pub unsafe_services: Vec<UnsafeService>,
}

impl CircularDependencyError {
    /// 运行期检测到的循环
    pub fn runtime(chain: Vec<ServiceId>) -> Self {
        Self {
            chain,
            unsafe_services: Vec::new(),
        }
    }

    /// 构建期检测到的不安全循环
    pub fn unsafe_cycle(chain: Vec<ServiceId>, unsafe_services: Vec<UnsafeService>) -> Self {
        Self {
            chain,
            unsafe_services,
        }
    }
}

fn format_chain(chain: &[ServiceId]) -> String {
    chain
        .iter()
        .map(ServiceId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn format_unsafe(unsafe_services: &[UnsafeService]) -> String {
    if unsafe_services.is_empty() {
        return String::new();
    }
    let problems: Vec<String> = unsafe_services.iter().map(ToString::to_string).collect();
    format!(
        ". All services in a circular dependency must be lazy singletons. Unsafe: {}",
        problems.join("; ")
    )
}

/// 容器错误类型
///
/// 所有解析期错误的统一入口。
#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("Service \"{id}\" is not registered and cannot be auto-wired.")]
    NotFound { id: ServiceId },

    #[error(
        "Ambiguous auto-binding for interface \"{interface}\": found implementations \"{}\". Use explicit bind() to resolve the ambiguity.",
        join_ids(.implementations)
    )]
    AmbiguousBinding {
        interface: ServiceId,
        implementations: Vec<ServiceId>,
    },

    #[error("Factory for \"{id}\" must return an object.")]
    FactoryReturnedNonObject { id: ServiceId },

    #[error("Service \"{id}\" cannot be viewed as {expected}.")]
    TypeMismatch {
        id: ServiceId,
        expected: &'static str,
    },

    #[error("Container owning lazy service \"{id}\" has been dropped.")]
    ContainerDropped { id: ServiceId },

    #[error("Component scan of \"{target}\" failed: {message}")]
    ScanFailed { target: String, message: String },

    #[error("Failed to write compiled container to \"{path}\": {message}")]
    CompileFailed { path: String, message: String },

    #[error(transparent)]
    Autowire(#[from] AutowireError),

    #[error(transparent)]
    CircularDependency(#[from] CircularDependencyError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn join_ids(ids: &[ServiceId]) -> String {
    ids.iter()
        .map(ServiceId::as_str)
        .collect::<Vec<_>>()
        .join("\", \"")
}

impl ContainerError {
    /// 创建服务未找到错误
    pub fn not_found(id: impl Into<ServiceId>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// 创建类型不匹配错误
    pub fn type_mismatch<T: ?Sized>(id: impl Into<ServiceId>) -> Self {
        Self::TypeMismatch {
            id: id.into(),
            expected: std::any::type_name::<T>(),
        }
    }

    /// 是否为服务未找到
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// 是否为循环依赖
    pub fn is_circular_dependency(&self) -> bool {
        matches!(self, Self::CircularDependency(_))
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("容器错误: {source}")]
    ContainerError {
        #[from]
        source: ContainerError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type AutowireResult<T> = Result<T, AutowireError>;
pub type ContainerResult<T> = Result<T, ContainerError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
