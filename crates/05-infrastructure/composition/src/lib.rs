//! # 应用组合层
//!
//! 把参数来源、组件扫描与容器构建串成一个启动流程，得到持有容器的 [`Application`]。
//!
//! ## 主要功能
//!
//! - **参数来源**: 项目目录下的 `.env` / `.env.local`、进程环境变量，以及 JSON/TOML 参数文件
//! - **组件发现**: 类型目录扫描与自定义扫描器
//! - **容器清单**: 可选地把冻结后的定义写成 JSON 清单
//! - **日志初始化**: 仅在显式要求时安装 `tracing` 订阅者
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::{ApplicationBuilder, LoggingConfig};
//! use di_abstractions::TypeCatalog;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let application = ApplicationBuilder::new()
//!         .project_dir(".")
//!         .with_catalog(TypeCatalog::new())
//!         .scan_catalog("app")
//!         .configure(|builder| {
//!             builder.parameter("mailer.dsn", "%env(MAILER_DSN)%");
//!         })
//!         .with_logging(LoggingConfig::development())
//!         .build()?;
//!
//!     println!("已注册 {} 个服务", application.container().definitions().len());
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod builder;

pub use application::Application;
pub use builder::{ApplicationBuilder, LoggingConfig};

// 重新导出组件宏与错误类型
pub use component_macros::component;
pub use infrastructure_common::InfrastructureError;
