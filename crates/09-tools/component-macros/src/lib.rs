//! # Component Macros
//!
//! 这个 crate 提供了在编译时生成组件元数据的过程宏，扫描器据此登记服务定义。
//!
//! ## 核心宏
//!
//! - [`component`] - 属性宏，为结构体实现 `Discoverable`
//! - [`Discoverable`](derive@Discoverable) - 派生宏，读取 `#[component(...)]` 辅助属性
//!
//! ## 使用示例
//!
//! ```ignore
//! use component_macros::component;
//!
//! #[component(transient, eager, tag = "mailer", implements = "app::Mailer")]
//! pub struct SmtpMailer {
//!     host: String,
//! }
//! ```
//!
//! 生成的代码引用 `::infrastructure_common`，使用方需要依赖该 crate。

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

mod component;
mod utils;

/// 组件元数据宏
///
/// 为结构体实现 `infrastructure_common::Discoverable`。
///
/// # 参数
///
/// - `singleton` / `transient` - 生命周期提示
/// - `lazy` / `eager` - 延迟加载提示
/// - `exclude` - 排除在扫描之外
/// - `name = "app::Id"` - 自定义服务标识符（默认为 `模块路径::类型名`）
/// - `tag = "..."` - 标签，可重复
/// - `implements = "app::Trait"` - 实现的接口，可重复
/// - `attribute = "app::Marker"` - 标记属性，可重复
/// - `description = "..."` - 组件描述
///
/// # 示例
///
/// ```ignore
/// #[component(singleton, lazy, tag = "handler")]
/// pub struct CreateUserHandler;
/// ```
#[proc_macro_attribute]
pub fn component(args: TokenStream, input: TokenStream) -> TokenStream {
    component::component_impl(args, input)
}

/// 组件元数据派生宏
///
/// 与 [`component`] 生成相同的实现，参数写在 `#[component(...)]` 辅助属性中。
///
/// # 示例
///
/// ```ignore
/// #[derive(Discoverable)]
/// #[component(transient, implements = "app::Clock")]
/// pub struct SystemClock;
/// ```
#[proc_macro_derive(Discoverable, attributes(component))]
pub fn derive_discoverable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    component::derive_discoverable_impl(input)
}
