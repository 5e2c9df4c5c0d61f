//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义服务定义模型、实例句柄和核心接口。
//!
//! ## 核心接口
//!
//! - [`Definition`] - 服务定义
//! - [`AutoconfigureRule`] - 自动配置规则
//! - [`Instance`] / [`Service`] - 实例句柄（支持延迟代理）
//! - [`TypeDescriptor`] / [`TypeCatalog`] - 构造函数与 setter 的参数描述
//! - [`ServiceContainer`] - 容器查询接口
//! - [`ComponentScanner`] - 组件扫描器接口
//! - [`DefinitionCompiler`] - 定义编译器接口

pub mod arguments;
pub mod autoconfigure;
pub mod catalog;
pub mod compiler;
pub mod container;
pub mod definition;
pub mod descriptor;
pub mod instance;
pub mod lazy;
pub mod parameter;
pub mod scanner;

pub use arguments::*;
pub use autoconfigure::*;
pub use catalog::*;
pub use compiler::*;
pub use container::*;
pub use definition::*;
pub use descriptor::*;
pub use instance::*;
pub use lazy::*;
pub use parameter::*;
pub use scanner::*;
