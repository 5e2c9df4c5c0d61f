//! # 依赖注入具体实现
//!
//! 提供绑定解析、依赖图构建、循环依赖检测、自动装配，以及容器与构建器。
//!
//! ## 主要组件
//!
//! - [`ContainerBuilder`] - 收集定义并冻结为容器
//! - [`Container`] - 运行期解析服务
//! - [`BindingResolver`] - 接口到实现的自动绑定与歧义检测
//! - [`DependencyGraph`] / [`CircularDependencyDetector`] - 构建期循环依赖检测
//! - [`Autowirer`] - 构造函数与 setter 参数的自动装配
//! - [`CatalogScanner`] - 基于类型目录的组件扫描
//! - [`ManifestCompiler`] - 生成容器清单
//!
//! ## 使用示例
//!
//! ```ignore
//! let mut builder = ContainerBuilder::with_catalog(catalog);
//! builder.scan_catalog("app")?;
//! builder.register("app::Logger").eager();
//! builder.parameter("PORT", "%env(int:PORT)%");
//!
//! let container = builder.build()?;
//! let service = container.get_as::<Service>("app::Service")?;
//! ```

pub mod autowire;
pub mod binding;
pub mod builder;
pub mod circular;
pub mod container;
pub mod factory;
pub mod graph;
pub mod manifest;
pub mod scanner;

pub use autowire::*;
pub use binding::*;
pub use builder::*;
pub use circular::*;
pub use container::*;
pub use factory::*;
pub use graph::*;
pub use manifest::*;
pub use scanner::*;

#[cfg(test)]
mod tests;
