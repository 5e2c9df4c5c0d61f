//! # Configuration Implementation
//!
//! 参数来源的具体实现，以及环境变量表达式解析。
//!
//! ## 主要组件
//!
//! - [`DotEnvParser`] - `.env` 文件解析器
//! - [`EnvironmentParameterSource`] - 进程环境变量来源
//! - [`DotEnvParameterSource`] - `.env` 文件来源
//! - [`TomlParameterSource`] - TOML 文件来源
//! - [`JsonParameterSource`] - JSON 文件来源
//! - [`MapParameterSource`] - 内存来源
//! - [`EnvResolver`] - `%env(TYPE:NAME)%` 表达式解析器

pub mod dotenv;
pub mod providers;
pub mod resolver;

pub use dotenv::*;
pub use providers::*;
pub use resolver::*;

#[cfg(test)]
mod tests;
