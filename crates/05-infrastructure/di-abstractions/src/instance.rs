//! 实例句柄
//!
//! 容器返回的每个服务都是一个 [`Instance`]：要么是已构造的对象，
//! 要么是尚未构造的延迟代理。两者对调用方不可区分，任何类型化访问
//! 都会先触发代理的物化。

use crate::lazy::LazyProxy;
use infrastructure_common::{ContainerError, ServiceId};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 类型擦除后的服务对象
pub type Object = Arc<dyn Any + Send + Sync>;

/// 将对象转换为某个视图（`Arc<T>` 或 `Arc<dyn Trait>`）的转换器
pub type Caster = Arc<dyn Fn(&Object) -> Option<Box<dyn Any + Send + Sync>> + Send + Sync>;

/// 转换表，按目标视图的 `TypeId` 索引
#[derive(Clone, Default)]
pub struct CastTable {
    casters: HashMap<TypeId, Caster>,
    views: Vec<&'static str>,
}

impl CastTable {
    /// 创建空转换表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册具体类型自身的视图
    pub fn register_identity<T: Any + Send + Sync>(&mut self) {
        self.register::<T, T>(|it| it);
    }

    /// 注册从具体类型 `T` 到视图 `I` 的转换
    pub fn register<T, I>(&mut self, cast: impl Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static)
    where
        T: Any + Send + Sync,
        I: ?Sized + Send + Sync + 'static,
    {
        let caster: Caster = Arc::new(move |object: &Object| {
            let concrete = Arc::clone(object).downcast::<T>().ok()?;
            Some(Box::new(cast(concrete)) as Box<dyn Any + Send + Sync>)
        });
        if self.casters.insert(TypeId::of::<I>(), caster).is_none() {
            self.views.push(std::any::type_name::<I>());
        }
    }

    /// 合并另一张转换表，已有条目保留
    pub fn merge(&mut self, other: &Self) {
        for (type_id, caster) in &other.casters {
            self.casters
                .entry(*type_id)
                .or_insert_with(|| Arc::clone(caster));
        }
        for view in &other.views {
            if !self.views.contains(view) {
                self.views.push(view);
            }
        }
    }

    /// 是否支持视图 `I`
    pub fn supports<I: ?Sized + 'static>(&self) -> bool {
        self.casters.contains_key(&TypeId::of::<I>())
    }

    /// 已注册的视图名称
    pub fn views(&self) -> &[&'static str] {
        &self.views
    }

    /// 执行转换
    pub fn cast<I: ?Sized + Send + Sync + 'static>(&self, object: &Object) -> Option<Arc<I>> {
        let caster = self.casters.get(&TypeId::of::<I>())?;
        let boxed = caster(object)?;
        boxed.downcast::<Arc<I>>().ok().map(|view| *view)
    }
}

impl fmt::Debug for CastTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.views).finish()
    }
}

enum InstanceState {
    Ready { object: Object, casts: CastTable },
    Deferred(LazyProxy),
}

struct InstanceInner {
    service_type: ServiceId,
    state: InstanceState,
}

/// 服务实例句柄
///
/// 克隆开销很小，克隆出的句柄指向同一个实例。
#[derive(Clone)]
pub struct Instance {
    inner: Arc<InstanceInner>,
}

impl Instance {
    /// 包装一个已构造的值
    pub fn new<T: Any + Send + Sync>(service_type: impl Into<ServiceId>, value: T) -> Self {
        Self::from_arc(service_type, Arc::new(value))
    }

    /// 包装一个已共享的值
    pub fn from_arc<T: Any + Send + Sync>(service_type: impl Into<ServiceId>, value: Arc<T>) -> Self {
        let mut casts = CastTable::new();
        casts.register_identity::<T>();
        Self::from_object(service_type, value, casts)
    }

    /// 包装一个类型擦除的对象及其转换表
    pub fn from_object(service_type: impl Into<ServiceId>, object: Object, casts: CastTable) -> Self {
        Self {
            inner: Arc::new(InstanceInner {
                service_type: service_type.into(),
                state: InstanceState::Ready { object, casts },
            }),
        }
    }

    /// 创建延迟实例
    pub fn deferred(proxy: LazyProxy) -> Self {
        Self {
            inner: Arc::new(InstanceInner {
                service_type: proxy.service_type().clone(),
                state: InstanceState::Deferred(proxy),
            }),
        }
    }

    /// 为已构造的值追加视图
    pub fn implements<T, I>(self, cast: impl Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static) -> Self
    where
        T: Any + Send + Sync,
        I: ?Sized + Send + Sync + 'static,
    {
        let mut extra = CastTable::new();
        extra.register::<T, I>(cast);
        self.with_casts(&extra)
    }

    /// 合并额外的转换表，延迟实例保持不变
    pub fn with_casts(self, extra: &CastTable) -> Self {
        if let InstanceState::Ready { object, casts } = &self.inner.state {
            let mut merged = casts.clone();
            merged.merge(extra);
            return Self::from_object(self.inner.service_type.clone(), Arc::clone(object), merged);
        }
        self
    }

    /// 服务类型
    pub fn service_type(&self) -> &ServiceId {
        &self.inner.service_type
    }

    /// 是否为延迟代理
    pub fn is_lazy(&self) -> bool {
        matches!(self.inner.state, InstanceState::Deferred(_))
    }

    /// 底层对象是否已构造
    pub fn is_materialized(&self) -> bool {
        match &self.inner.state {
            InstanceState::Ready { .. } => true,
            InstanceState::Deferred(proxy) => proxy.is_materialized(),
        }
    }

    /// 获取已构造的实例，必要时触发物化
    pub fn materialize(&self) -> Result<Self, ContainerError> {
        match &self.inner.state {
            InstanceState::Ready { .. } => Ok(self.clone()),
            InstanceState::Deferred(proxy) => proxy.materialize(),
        }
    }

    /// 获取类型擦除的对象
    pub fn object(&self) -> Result<Object, ContainerError> {
        match &self.materialize()?.inner.state {
            InstanceState::Ready { object, .. } => Ok(Arc::clone(object)),
            InstanceState::Deferred(_) => Err(ContainerError::type_mismatch::<Object>(
                self.service_type().clone(),
            )),
        }
    }

    /// 以视图 `I` 访问实例
    pub fn cast<I: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<I>, ContainerError> {
        let ready = self.materialize()?;
        match &ready.inner.state {
            InstanceState::Ready { object, casts } => casts
                .cast::<I>(object)
                .ok_or_else(|| ContainerError::type_mismatch::<I>(self.service_type().clone())),
            InstanceState::Deferred(_) => {
                Err(ContainerError::type_mismatch::<I>(self.service_type().clone()))
            }
        }
    }

    /// 以具体类型访问实例，不依赖转换表
    pub fn downcast<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ContainerError> {
        self.object()?
            .downcast::<T>()
            .map_err(|_| ContainerError::type_mismatch::<T>(self.service_type().clone()))
    }

    /// 两个句柄是否指向同一个实例
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("service_type", &self.inner.service_type)
            .field("lazy", &self.is_lazy())
            .field("materialized", &self.is_materialized())
            .finish()
    }
}

/// 类型化的服务句柄
///
/// 持有句柄不会触发物化，调用 [`Service::get`] 才会。
pub struct Service<T: ?Sized> {
    instance: Instance,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> Service<T> {
    /// 包装实例
    pub fn new(instance: Instance) -> Self {
        Self {
            instance,
            _marker: PhantomData,
        }
    }

    /// 获取实例，必要时触发物化
    pub fn get(&self) -> Result<Arc<T>, ContainerError> {
        self.instance.cast::<T>()
    }

    /// 底层实例句柄
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// 底层对象是否已构造
    pub fn is_materialized(&self) -> bool {
        self.instance.is_materialized()
    }
}

impl<T: ?Sized> Clone for Service<T> {
    fn clone(&self) -> Self {
        Self {
            instance: self.instance.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Service<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Service").field(&self.instance).finish()
    }
}
