//! 元数据定义
//!
//! 提供服务标识符和组件扫描阶段产生的元数据

use crate::lifecycle::Lifetime;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// 服务标识符
///
/// 通常是具体类型或接口的完整路径（例如 `app::logging::FileLogger`），
/// 也可以是任意字符串键。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    /// 创建新的服务标识符
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 从 Rust 类型名获取标识符
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(std::any::type_name::<T>().to_string())
    }

    /// 字符串形式
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 获取简短的类型名称（不包含模块路径和泛型参数）
    pub fn short_name(&self) -> &str {
        let path = self.0.split('<').next().unwrap_or(&self.0);
        path.rsplit("::").next().unwrap_or(path)
    }

    /// 是否位于宿主标准库命名空间
    pub fn is_host_builtin(&self) -> bool {
        ["std::", "core::", "alloc::"]
            .iter()
            .any(|prefix| self.0.starts_with(prefix))
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ServiceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ServiceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ServiceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ServiceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&String> for ServiceId {
    fn from(value: &String) -> Self {
        Self(value.clone())
    }
}

impl From<&ServiceId> for ServiceId {
    fn from(value: &ServiceId) -> Self {
        value.clone()
    }
}

impl PartialEq<str> for ServiceId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ServiceId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// 组件元数据
///
/// 由扫描器或 `#[component]` 宏产生，描述一个可发现的具体类型。
/// 所有提示字段都是可选的，未设置时由容器默认值决定。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentMetadata {
    /// 组件标识符
    pub id: ServiceId,
    /// 生命周期提示
    pub lifetime: Option<Lifetime>,
    /// 延迟加载提示
    pub lazy: Option<bool>,
    /// 组件标签
    pub tags: Vec<String>,
    /// 实现的接口
    pub interfaces: Vec<ServiceId>,
    /// 标记属性
    pub attributes: Vec<String>,
    /// 是否排除在扫描之外
    pub excluded: bool,
    /// 组件描述
    pub description: Option<String>,
}

impl ComponentMetadata {
    /// 创建新的组件元数据
    pub fn new(id: impl Into<ServiceId>) -> Self {
        Self {
            id: id.into(),
            lifetime: None,
            lazy: None,
            tags: Vec::new(),
            interfaces: Vec::new(),
            attributes: Vec::new(),
            excluded: false,
            description: None,
        }
    }

    /// 标记为单例
    pub fn singleton(self) -> Self {
        self.with_lifetime(Lifetime::Singleton)
    }

    /// 标记为瞬时
    pub fn transient(self) -> Self {
        self.with_lifetime(Lifetime::Transient)
    }

    /// 设置生命周期提示
    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    /// 设置延迟加载提示
    pub fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy = Some(lazy);
        self
    }

    /// 添加标签
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// 添加实现的接口
    pub fn with_interface(mut self, interface: impl Into<ServiceId>) -> Self {
        let interface = interface.into();
        if !self.interfaces.contains(&interface) {
            self.interfaces.push(interface);
        }
        self
    }

    /// 添加标记属性
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        let attribute = attribute.into();
        if !self.attributes.contains(&attribute) {
            self.attributes.push(attribute);
        }
        self
    }

    /// 排除在扫描之外
    pub fn excluded(mut self) -> Self {
        self.excluded = true;
        self
    }

    /// 设置描述
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 是否实现了给定接口或携带给定属性
    pub fn matches(&self, target: &str) -> bool {
        self.interfaces.iter().any(|i| i == target) || self.attributes.iter().any(|a| a == target)
    }
}
