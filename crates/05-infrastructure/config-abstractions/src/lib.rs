//! # Configuration Abstractions
//!
//! 参数来源抽象层，定义容器读取外部参数的边界。
//!
//! ## 核心接口
//!
//! - [`ParameterSource`] - 参数来源接口
//! - [`ParameterResolver`] - 参数解析器接口

pub mod provider;
pub mod resolver;

pub use provider::*;
pub use resolver::*;
