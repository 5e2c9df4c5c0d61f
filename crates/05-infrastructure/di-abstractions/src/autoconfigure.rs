//! 自动配置规则

use crate::definition::Definition;
use infrastructure_common::Lifetime;

/// 自动配置规则
///
/// 应用于实现某个接口或携带某个标记属性的所有被发现类型，
/// 只覆盖规则中设置过的字段。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoconfigureRule {
    tags: Vec<String>,
    lifetime: Option<Lifetime>,
    lazy: Option<bool>,
}

impl AutoconfigureRule {
    /// 创建空规则
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加标签
    pub fn tag(&mut self, tag: impl Into<String>) -> &mut Self {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// 设置为单例
    pub fn singleton(&mut self) -> &mut Self {
        self.lifetime = Some(Lifetime::Singleton);
        self
    }

    /// 设置为瞬时
    pub fn transient(&mut self) -> &mut Self {
        self.lifetime = Some(Lifetime::Transient);
        self
    }

    /// 设置延迟加载
    pub fn lazy(&mut self, lazy: bool) -> &mut Self {
        self.lazy = Some(lazy);
        self
    }

    /// 设置为立即加载
    pub fn eager(&mut self) -> &mut Self {
        self.lazy(false)
    }

    /// 规则中的标签
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// 规则中的生命周期
    pub fn lifetime(&self) -> Option<Lifetime> {
        self.lifetime
    }

    /// 规则中的延迟加载设置
    pub fn lazy_setting(&self) -> Option<bool> {
        self.lazy
    }

    /// 应用到定义
    pub fn apply(&self, definition: &mut Definition) {
        definition.tags(self.tags.iter().cloned());

        if let Some(lifetime) = self.lifetime {
            definition.lifetime(lifetime);
        }

        if let Some(lazy) = self.lazy {
            definition.lazy(lazy);
        }
    }
}
