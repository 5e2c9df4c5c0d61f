//! 服务定义
//!
//! 描述一个服务如何被构造：目标类型或工厂、生命周期、延迟加载、标签和 setter 调用。

use crate::arguments::Argument;
use crate::container::ServiceContainer;
use infrastructure_common::{ContainerError, Lifetime, ServiceId};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 服务工厂
pub type Factory = Arc<dyn Fn(&dyn ServiceContainer) -> Result<Argument, ContainerError> + Send + Sync>;

/// setter 调用
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    /// 方法名
    pub method: String,
    /// 预先提供的参数，缺省的尾部参数由自动装配补齐
    pub arguments: Vec<Value>,
}

/// 服务定义
#[derive(Clone, Default)]
pub struct Definition {
    target_type: Option<ServiceId>,
    factory: Option<Factory>,
    lifetime: Lifetime,
    lazy: Option<bool>,
    default_lazy: Option<bool>,
    tags: Vec<String>,
    method_calls: Vec<MethodCall>,
}

impl Definition {
    /// 创建指向目标类型的定义
    pub fn new(target_type: impl Into<ServiceId>) -> Self {
        Self {
            target_type: Some(target_type.into()),
            ..Self::default()
        }
    }

    /// 创建由工厂构造的定义
    pub fn with_factory(
        factory: impl Fn(&dyn ServiceContainer) -> Result<Argument, ContainerError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            factory: Some(Arc::new(factory)),
            ..Self::default()
        }
    }

    /// 单例
    pub fn singleton(&mut self) -> &mut Self {
        self.lifetime = Lifetime::Singleton;
        self
    }

    /// 瞬时
    pub fn transient(&mut self) -> &mut Self {
        self.lifetime = Lifetime::Transient;
        self
    }

    /// 设置生命周期
    pub fn lifetime(&mut self, lifetime: Lifetime) -> &mut Self {
        self.lifetime = lifetime;
        self
    }

    /// 显式设置延迟加载
    pub fn lazy(&mut self, lazy: bool) -> &mut Self {
        self.lazy = Some(lazy);
        self
    }

    /// 显式设置为立即加载
    pub fn eager(&mut self) -> &mut Self {
        self.lazy(false)
    }

    /// 添加标签，重复标签被忽略
    pub fn tag(&mut self, tag: impl Into<String>) -> &mut Self {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// 批量添加标签
    pub fn tags<I, S>(&mut self, tags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            self.tag(tag);
        }
        self
    }

    /// 追加 setter 调用
    pub fn call<I>(&mut self, method: impl Into<String>, arguments: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.method_calls.push(MethodCall {
            method: method.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// 设置目标类型
    pub fn set_target_type(&mut self, target_type: impl Into<ServiceId>) -> &mut Self {
        self.target_type = Some(target_type.into());
        self
    }

    /// 设置工厂
    pub fn set_factory(
        &mut self,
        factory: impl Fn(&dyn ServiceContainer) -> Result<Argument, ContainerError> + Send + Sync + 'static,
    ) -> &mut Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// 设置共享的工厂
    pub fn set_shared_factory(&mut self, factory: Factory) -> &mut Self {
        self.factory = Some(factory);
        self
    }

    /// 在未显式设置时应用容器默认的延迟加载
    pub fn apply_default_lazy(&mut self, default_lazy: bool) -> &mut Self {
        if self.lazy.is_none() {
            self.default_lazy = Some(default_lazy);
        }
        self
    }

    /// 目标类型
    pub fn target_type(&self) -> Option<&ServiceId> {
        self.target_type.as_ref()
    }

    /// 工厂
    pub fn factory(&self) -> Option<&Factory> {
        self.factory.as_ref()
    }

    /// 是否由工厂构造
    pub fn has_factory(&self) -> bool {
        self.factory.is_some()
    }

    /// 生命周期
    pub fn get_lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// 标签
    pub fn get_tags(&self) -> &[String] {
        &self.tags
    }

    /// setter 调用
    pub fn method_calls(&self) -> &[MethodCall] {
        &self.method_calls
    }

    /// 是否单例
    pub fn is_singleton(&self) -> bool {
        self.lifetime.is_singleton()
    }

    /// 是否延迟加载，未设置时为否
    pub fn is_lazy(&self) -> bool {
        self.lazy.or(self.default_lazy).unwrap_or(false)
    }

    /// 延迟加载是否为显式设置
    pub fn has_explicit_lazy(&self) -> bool {
        self.lazy.is_some()
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("target_type", &self.target_type)
            .field("factory", &self.factory.is_some())
            .field("lifetime", &self.lifetime)
            .field("lazy", &self.lazy)
            .field("default_lazy", &self.default_lazy)
            .field("tags", &self.tags)
            .field("method_calls", &self.method_calls)
            .finish()
    }
}

/// 按插入顺序保存的定义集合
#[derive(Debug, Clone, Default)]
pub struct DefinitionSet {
    order: Vec<ServiceId>,
    entries: HashMap<ServiceId, Definition>,
}

impl DefinitionSet {
    /// 创建空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入定义，已存在的标识符保持原有位置
    pub fn insert(&mut self, id: impl Into<ServiceId>, definition: Definition) -> &mut Definition {
        let id = id.into();
        if !self.entries.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.entries.insert(id.clone(), definition);
        self.entries.entry(id).or_default()
    }

    /// 获取已有定义，不存在时插入 `create` 的结果
    pub fn get_or_insert_with(
        &mut self,
        id: impl Into<ServiceId>,
        create: impl FnOnce() -> Definition,
    ) -> &mut Definition {
        let id = id.into();
        if !self.entries.contains_key(&id) {
            self.order.push(id.clone());
        }
        self.entries.entry(id).or_insert_with(create)
    }

    /// 查找定义
    pub fn get(&self, id: &str) -> Option<&Definition> {
        self.entries.get(id)
    }

    /// 查找可变定义
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Definition> {
        self.entries.get_mut(id)
    }

    /// 是否包含定义
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// 按插入顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = (&ServiceId, &Definition)> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|definition| (id, definition)))
    }

    /// 遍历所有定义（可变，不保证顺序）
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Definition> {
        self.entries.values_mut()
    }

    /// 按插入顺序排列的标识符
    pub fn ids(&self) -> &[ServiceId] {
        &self.order
    }

    /// 定义数量
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
