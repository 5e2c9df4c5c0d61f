//! 类型描述符
//!
//! 描述一个类型如何被构造、实现了哪些接口、有哪些可调用的 setter。
//! 容器在运行时只通过描述符与具体类型打交道。
//!
//! ```ignore
//! let descriptor = TypeDescriptor::concrete("app::Newsletter")
//!     .constructor(
//!         [ParameterSpec::service("mailer", "app::Mailer")],
//!         |args| Ok(Newsletter::new(args.service(0)?)),
//!     )
//!     .implements("app::Publisher", |it: Arc<Newsletter>| it as Arc<dyn Publisher>)
//!     .tag("publisher");
//! ```

use crate::arguments::Arguments;
use crate::instance::{CastTable, Object};
use crate::parameter::ParameterSpec;
use infrastructure_common::{ComponentMetadata, ContainerError, Discoverable, Lifetime, ServiceId};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 构造函数
pub type Constructor = Arc<dyn Fn(&Arguments) -> Result<Object, ContainerError> + Send + Sync>;

/// setter 调用器
pub type Invoker = Arc<dyn Fn(&Object, &Arguments) -> Result<(), ContainerError> + Send + Sync>;

/// 类型种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// 具体类型
    Concrete,
    /// 接口（trait）
    Interface,
    /// 标记属性
    Attribute,
}

/// 构造函数描述
#[derive(Clone)]
pub struct ConstructorSpec {
    parameters: Vec<ParameterSpec>,
    build: Constructor,
}

impl ConstructorSpec {
    /// 参数列表
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    /// 调用构造函数
    pub fn build(&self, arguments: &Arguments) -> Result<Object, ContainerError> {
        (self.build)(arguments)
    }
}

/// setter 描述
#[derive(Clone)]
pub struct MethodSpec {
    name: String,
    parameters: Vec<ParameterSpec>,
    invoke: Invoker,
}

impl MethodSpec {
    /// 方法名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 参数列表
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    /// 调用方法
    pub fn invoke(&self, target: &Object, arguments: &Arguments) -> Result<(), ContainerError> {
        (self.invoke)(target, arguments)
    }
}

/// 类型描述符
#[derive(Clone)]
pub struct TypeDescriptor {
    metadata: ComponentMetadata,
    kind: TypeKind,
    constructor: Option<ConstructorSpec>,
    methods: HashMap<String, MethodSpec>,
    casts: CastTable,
    autoconfigure_tags: Vec<String>,
}

impl TypeDescriptor {
    fn with_kind(metadata: ComponentMetadata, kind: TypeKind) -> Self {
        Self {
            metadata,
            kind,
            constructor: None,
            methods: HashMap::new(),
            casts: CastTable::new(),
            autoconfigure_tags: Vec::new(),
        }
    }

    /// 描述一个具体类型
    pub fn concrete(id: impl Into<ServiceId>) -> Self {
        Self::from_metadata(ComponentMetadata::new(id))
    }

    /// 以 Rust 类型名描述一个具体类型
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::concrete(ServiceId::of::<T>())
    }

    /// 从已有元数据描述一个具体类型
    pub fn from_metadata(metadata: ComponentMetadata) -> Self {
        Self::with_kind(metadata, TypeKind::Concrete)
    }

    /// 从编译时元数据描述一个具体类型
    pub fn discovered<T: Discoverable>() -> Self {
        Self::from_metadata(T::component_metadata())
    }

    /// 描述一个接口
    pub fn interface(id: impl Into<ServiceId>) -> Self {
        Self::with_kind(ComponentMetadata::new(id), TypeKind::Interface)
    }

    /// 描述一个标记属性
    pub fn attribute(id: impl Into<ServiceId>) -> Self {
        Self::with_kind(ComponentMetadata::new(id), TypeKind::Attribute)
    }

    /// 设置构造函数
    pub fn constructor<T, F>(mut self, parameters: impl IntoIterator<Item = ParameterSpec>, build: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Arguments) -> Result<T, ContainerError> + Send + Sync + 'static,
    {
        self.casts.register_identity::<T>();
        self.constructor = Some(ConstructorSpec {
            parameters: parameters.into_iter().collect(),
            build: Arc::new(move |arguments| build(arguments).map(|value| Arc::new(value) as Object)),
        });
        self
    }

    /// 声明实现的接口及其视图转换
    pub fn implements<T, I>(
        mut self,
        interface: impl Into<ServiceId>,
        cast: impl Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    ) -> Self
    where
        T: Any + Send + Sync,
        I: ?Sized + Send + Sync + 'static,
    {
        self.casts.register::<T, I>(cast);
        self.metadata = self.metadata.with_interface(interface);
        self
    }

    /// 声明实现的接口，不提供视图转换
    pub fn implements_id(mut self, interface: impl Into<ServiceId>) -> Self {
        self.metadata = self.metadata.with_interface(interface);
        self
    }

    /// 声明 setter
    pub fn method<T, F>(
        mut self,
        name: impl Into<String>,
        parameters: impl IntoIterator<Item = ParameterSpec>,
        invoke: F,
    ) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, &Arguments) -> Result<(), ContainerError> + Send + Sync + 'static,
    {
        let name = name.into();
        let owner = self.metadata.id.clone();
        let invoker: Invoker = Arc::new(move |target: &Object, arguments: &Arguments| {
            let target = target
                .downcast_ref::<T>()
                .ok_or_else(|| ContainerError::type_mismatch::<T>(owner.clone()))?;
            invoke(target, arguments)
        });
        self.methods.insert(
            name.clone(),
            MethodSpec {
                name,
                parameters: parameters.into_iter().collect(),
                invoke: invoker,
            },
        );
        self
    }

    /// 生命周期提示：单例
    pub fn singleton(mut self) -> Self {
        self.metadata = self.metadata.with_lifetime(Lifetime::Singleton);
        self
    }

    /// 生命周期提示：瞬时
    pub fn transient(mut self) -> Self {
        self.metadata = self.metadata.with_lifetime(Lifetime::Transient);
        self
    }

    /// 延迟加载提示
    pub fn lazy(mut self, lazy: bool) -> Self {
        self.metadata = self.metadata.with_lazy(lazy);
        self
    }

    /// 立即加载提示
    pub fn eager(self) -> Self {
        self.lazy(false)
    }

    /// 添加标签
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.metadata = self.metadata.with_tag(tag);
        self
    }

    /// 添加标记属性
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.metadata = self.metadata.with_attribute(attribute);
        self
    }

    /// 排除在扫描之外
    pub fn excluded(mut self) -> Self {
        self.metadata = self.metadata.excluded();
        self
    }

    /// 实现此接口（或携带此属性）的类型自动获得该标签
    pub fn autoconfigure_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if !self.autoconfigure_tags.contains(&tag) {
            self.autoconfigure_tags.push(tag);
        }
        self
    }

    /// 标识符
    pub fn id(&self) -> &ServiceId {
        &self.metadata.id
    }

    /// 元数据
    pub fn metadata(&self) -> &ComponentMetadata {
        &self.metadata
    }

    /// 类型种类
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// 是否可以实例化
    pub fn is_instantiable(&self) -> bool {
        self.kind == TypeKind::Concrete && self.constructor.is_some()
    }

    /// 构造函数
    pub fn constructor_spec(&self) -> Option<&ConstructorSpec> {
        self.constructor.as_ref()
    }

    /// 查找 setter
    pub fn method_spec(&self, name: &str) -> Option<&MethodSpec> {
        self.methods.get(name)
    }

    /// 视图转换表
    pub fn casts(&self) -> &CastTable {
        &self.casts
    }

    /// 自动配置标签
    pub fn autoconfigure_tags(&self) -> &[String] {
        &self.autoconfigure_tags
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&String> = self.methods.keys().collect();
        methods.sort();
        f.debug_struct("TypeDescriptor")
            .field("id", &self.metadata.id)
            .field("kind", &self.kind)
            .field("instantiable", &self.is_instantiable())
            .field("methods", &methods)
            .field("casts", &self.casts)
            .finish()
    }
}
