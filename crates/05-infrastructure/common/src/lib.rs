//! # Infrastructure Common
//!
//! 这个 crate 提供了依赖注入引擎各层共享的基础类型。
//!
//! ## 核心组件
//!
//! - [`ServiceId`] - 服务标识符
//! - [`ComponentMetadata`] - 扫描阶段产生的组件元数据
//! - [`Lifetime`] - 组件生命周期
//! - [`Discoverable`] - 编译时元数据来源
//! - [`errors`] - 完整的错误分类
//!
//! ## 设计原则
//!
//! - 基于 Rust 类型系统的编译时安全
//! - 所有失败都以 `Result` 形式传播
//! - 不依赖任何全局注册表

pub mod component;
pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use component::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
