//! 依赖注入容器
//!
//! 容器冻结后定义、绑定、参数和标签都不再变化，唯一的运行期可变状态是实例缓存
//! （以及按需合成的定义）。一次顶层 `get` 失败时，它在缓存中新增的条目会被全部撤销。

use crate::autowire::Autowirer;
use crate::factory::DefinitionFactory;
use config_abstractions::ParameterResolver;
use dashmap::DashMap;
use di_abstractions::{
    Argument, AutoconfigureRule, ContainerSnapshot, Definition, DefinitionSet, Instance, LazyProxy, ServiceContainer,
    TaggedServices, TypeCatalog, TypeDescriptor,
};
use infrastructure_common::{AutowireError, ContainerError, ServiceId};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::debug;

/// 一次顶层解析在当前线程上的状态
#[derive(Debug, Default)]
struct Frame {
    depth: usize,
    journal: Vec<ServiceId>,
}

struct ContainerInner {
    definitions: RwLock<DefinitionSet>,
    bindings: HashMap<ServiceId, ServiceId>,
    parameters: HashMap<String, Value>,
    tags: HashMap<String, Vec<ServiceId>>,
    catalog: Arc<TypeCatalog>,
    resolver: Option<Arc<dyn ParameterResolver>>,
    default_lazy: bool,
    autoconfiguration: Vec<(ServiceId, AutoconfigureRule)>,
    instances: RwLock<HashMap<ServiceId, Instance>>,
    frames: DashMap<ThreadId, Frame>,
    autowirer: Autowirer,
}

/// 依赖注入容器
///
/// 克隆得到的是同一个容器的另一个句柄。
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// 从冻结的快照创建容器
    pub fn new(
        snapshot: ContainerSnapshot,
        catalog: Arc<TypeCatalog>,
        resolver: Option<Arc<dyn ParameterResolver>>,
        default_lazy: bool,
        autoconfiguration: Vec<(ServiceId, AutoconfigureRule)>,
    ) -> Self {
        let ContainerSnapshot {
            definitions,
            bindings,
            parameters,
            tags,
        } = snapshot;

        Self {
            inner: Arc::new(ContainerInner {
                definitions: RwLock::new(definitions),
                bindings,
                parameters,
                tags,
                catalog,
                resolver,
                default_lazy,
                autoconfiguration,
                instances: RwLock::new(HashMap::new()),
                frames: DashMap::new(),
                autowirer: Autowirer::new(),
            }),
        }
    }

    /// 当前所有定义（包含按需合成的定义）
    pub fn definitions(&self) -> DefinitionSet {
        self.inner.definitions.read().clone()
    }

    /// 绑定表
    pub fn bindings(&self) -> &HashMap<ServiceId, ServiceId> {
        &self.inner.bindings
    }

    /// 标签索引
    pub fn tags(&self) -> &HashMap<String, Vec<ServiceId>> {
        &self.inner.tags
    }

    /// 已解析的参数表
    pub fn parameters(&self) -> &HashMap<String, Value> {
        &self.inner.parameters
    }

    /// 类型目录
    pub fn catalog(&self) -> &TypeCatalog {
        &self.inner.catalog
    }

    /// 实例缓存中是否已有该标识符
    pub fn is_cached(&self, id: &str) -> bool {
        self.inner.instances.read().contains_key(id)
    }

    /// 实例缓存条目数
    pub fn cached_count(&self) -> usize {
        self.inner.instances.read().len()
    }

    fn resolve_binding(&self, id: &str) -> ServiceId {
        self.inner
            .bindings
            .get(id)
            .cloned()
            .unwrap_or_else(|| ServiceId::new(id))
    }

    fn cached(&self, id: &str) -> Option<Instance> {
        self.inner.instances.read().get(id).cloned()
    }

    /// 写入缓存；已有条目时保留已有条目并返回它
    fn cache_instance(&self, id: &ServiceId, instance: Instance) -> Instance {
        let (stored, inserted) = {
            let mut instances = self.inner.instances.write();
            match instances.get(id) {
                Some(existing) => (existing.clone(), false),
                None => {
                    instances.insert(id.clone(), instance.clone());
                    (instance, true)
                }
            }
        };

        if inserted {
            if let Some(mut frame) = self.inner.frames.get_mut(&thread::current().id()) {
                frame.journal.push(id.clone());
            }
        }
        stored
    }

    /// 在当前线程的解析帧中执行；最外层失败时撤销本次新增的缓存条目
    fn with_frame<T>(
        &self,
        resolve: impl FnOnce() -> Result<T, ContainerError>,
    ) -> Result<T, ContainerError> {
        let mut scope = FrameScope::enter(&self.inner);
        let result = resolve();
        if result.is_ok() {
            scope.succeed();
        }
        result
    }

    /// 在独立的解析帧中执行延迟代理的初始化
    ///
    /// 外层帧被暂时摘下，初始化成功后新建的条目直接提交；外层帧此前新增的条目
    /// 可能已被物化的实例持有，同样一并提交。
    fn with_detached_frame<T>(
        &self,
        resolve: impl FnOnce() -> Result<T, ContainerError>,
    ) -> Result<T, ContainerError> {
        let mut detached = DetachedFrame::take(&self.inner.frames);
        let result = self.with_frame(resolve);
        if result.is_ok() {
            detached.commit();
        }
        result
    }

    fn resolve(&self, id: &str) -> Result<Instance, ContainerError> {
        if let Some(instance) = self.cached(id) {
            return Ok(instance);
        }

        let resolved = self.resolve_binding(id);
        if resolved != id {
            if let Some(instance) = self.cached(resolved.as_str()) {
                return Ok(self.cache_instance(&ServiceId::new(id), instance));
            }
        }

        let found = {
            let definitions = self.inner.definitions.read();
            definitions
                .get(resolved.as_str())
                .map(|definition| (resolved.clone(), definition.clone()))
                .or_else(|| {
                    definitions
                        .get(id)
                        .map(|definition| (ServiceId::new(id), definition.clone()))
                })
        };

        if let Some((key, definition)) = found {
            return self.resolve_definition(&key, definition);
        }

        if let Some(descriptor) = self.inner.catalog.instantiable(resolved.as_str()) {
            let definition = self.synthesize_definition(descriptor);
            return self.resolve_definition(&resolved, definition);
        }

        Err(ContainerError::not_found(id))
    }

    /// 为没有定义的具体类型合成定义并保存
    ///
    /// 与扫描得到的定义一样应用自动配置；标签索引在构建时已冻结，合成定义的标签不会进入
    /// `get_tagged` 的结果。
    fn synthesize_definition(&self, descriptor: &TypeDescriptor) -> Definition {
        let mut definition = DefinitionFactory::new().create_autoconfigured(
            descriptor.metadata(),
            &self.inner.autoconfiguration,
            &self.inner.catalog,
        );
        definition.apply_default_lazy(self.inner.default_lazy);

        debug!("自动装配未注册的类型: {}", descriptor.id());
        self.inner
            .definitions
            .write()
            .get_or_insert_with(descriptor.id().clone(), || definition)
            .clone()
    }

    fn resolve_definition(&self, key: &ServiceId, definition: Definition) -> Result<Instance, ContainerError> {
        let singleton = definition.is_singleton();

        if definition.is_lazy() {
            let type_name = definition.target_type().cloned().unwrap_or_else(|| key.clone());
            let weak_inner = Arc::downgrade(&self.inner);
            let service_key = key.clone();

            let proxy = LazyProxy::new(type_name, move || {
                let inner = weak_inner.upgrade().ok_or_else(|| ContainerError::ContainerDropped {
                    id: service_key.clone(),
                })?;
                let container = Container { inner };
                container.with_detached_frame(|| container.create_instance(&service_key, &definition))
            });

            debug!("创建延迟代理: {}", key);
            let instance = Instance::deferred(proxy);
            return Ok(if singleton {
                self.cache_instance(key, instance)
            } else {
                instance
            });
        }

        let instance = self.create_instance(key, &definition)?;
        Ok(if singleton {
            self.cache_instance(key, instance)
        } else {
            instance
        })
    }

    /// 通过工厂或自动装配构造实例，然后依次执行 setter 调用
    fn create_instance(&self, key: &ServiceId, definition: &Definition) -> Result<Instance, ContainerError> {
        let type_name = definition.target_type().cloned().unwrap_or_else(|| key.clone());
        let _guard = self.inner.autowirer.enter(&type_name)?;
        let descriptor = self.inner.catalog.get(type_name.as_str());

        let instance = match definition.factory() {
            Some(factory) => match factory(self as &dyn ServiceContainer)? {
                Argument::Service(instance) => match descriptor {
                    Some(descriptor) => instance.with_casts(descriptor.casts()),
                    None => instance,
                },
                Argument::Value(_) => {
                    return Err(ContainerError::FactoryReturnedNonObject { id: key.clone() });
                }
            },
            None => {
                let descriptor = descriptor.ok_or_else(|| AutowireError::TypeNotFound {
                    type_name: type_name.clone(),
                })?;
                let object = self.inner.autowirer.instantiate(descriptor, self)?;
                Instance::from_object(type_name.clone(), object, descriptor.casts().clone())
            }
        };

        for call in definition.method_calls() {
            let method = descriptor
                .and_then(|descriptor| descriptor.method_spec(&call.method))
                .ok_or_else(|| AutowireError::UnknownMethod {
                    type_name: type_name.clone(),
                    method: call.method.clone(),
                })?;
            let arguments =
                self.inner
                    .autowirer
                    .resolve_method_arguments(&type_name, method, &call.arguments, self)?;
            method.invoke(&instance.object()?, &arguments)?;
        }

        debug!("已构造服务: {}", key);
        Ok(instance)
    }
}

impl ServiceContainer for Container {
    fn get(&self, id: &str) -> Result<Instance, ContainerError> {
        if let Some(instance) = self.cached(id) {
            return Ok(instance);
        }
        self.with_frame(|| self.resolve(id))
    }

    fn has(&self, id: &str) -> bool {
        let registered =
            |id: &str| self.is_cached(id) || self.inner.definitions.read().contains(id);

        if registered(id) {
            return true;
        }

        let resolved = self.resolve_binding(id);
        if resolved != id && registered(resolved.as_str()) {
            return true;
        }

        self.inner.catalog.instantiable(resolved.as_str()).is_some()
    }

    fn get_tagged(&self, tag: &str) -> TaggedServices<'_> {
        let ids = self.inner.tags.get(tag).cloned().unwrap_or_default();
        Box::new(ids.into_iter().map(move |id| self.get(id.as_str())))
    }

    fn get_parameter(&self, name: &str) -> Option<Value> {
        self.inner.parameters.get(name).cloned().or_else(|| {
            self.inner
                .resolver
                .as_ref()
                .and_then(|resolver| resolver.get(name))
        })
    }

    fn get_parameters(&self) -> HashMap<String, Value> {
        self.inner.parameters.clone()
    }
}

/// 解析帧的作用域守卫
///
/// 离开作用域时减少深度；最外层未成功结束（包括展开中的 panic）时撤销帧内新增的缓存条目。
struct FrameScope<'a> {
    inner: &'a ContainerInner,
    thread: ThreadId,
    succeeded: bool,
}

impl<'a> FrameScope<'a> {
    fn enter(inner: &'a ContainerInner) -> Self {
        let thread = thread::current().id();
        inner.frames.entry(thread).or_default().depth += 1;
        Self {
            inner,
            thread,
            succeeded: false,
        }
    }

    fn succeed(&mut self) {
        self.succeeded = true;
    }
}

impl Drop for FrameScope<'_> {
    fn drop(&mut self) {
        let journal = {
            let Some(mut frame) = self.inner.frames.get_mut(&self.thread) else {
                return;
            };
            frame.depth = frame.depth.saturating_sub(1);
            if frame.depth > 0 {
                return;
            }
            std::mem::take(&mut frame.journal)
        };
        self.inner.frames.remove(&self.thread);

        if !self.succeeded && !journal.is_empty() {
            let mut instances = self.inner.instances.write();
            for id in &journal {
                instances.remove(id);
            }
            debug!("解析失败，撤销 {} 个缓存条目: {:?}", journal.len(), journal);
        }
    }
}

/// 暂时摘下当前线程的外层解析帧，离开作用域时放回
struct DetachedFrame<'a> {
    frames: &'a DashMap<ThreadId, Frame>,
    thread: ThreadId,
    saved: Option<Frame>,
    committed: bool,
}

impl<'a> DetachedFrame<'a> {
    fn take(frames: &'a DashMap<ThreadId, Frame>) -> Self {
        let thread = thread::current().id();
        let saved = frames.remove(&thread).map(|(_, frame)| frame);
        Self {
            frames,
            thread,
            saved,
            committed: false,
        }
    }

    fn commit(&mut self) {
        self.committed = true;
    }
}

impl Drop for DetachedFrame<'_> {
    fn drop(&mut self) {
        if let Some(mut saved) = self.saved.take() {
            if self.committed && !saved.journal.is_empty() {
                debug!("延迟代理物化成功，提交外层帧的 {} 个缓存条目", saved.journal.len());
                saved.journal.clear();
            }
            self.frames.insert(self.thread, saved);
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("definitions", &self.inner.definitions.read().len())
            .field("bindings", &self.inner.bindings.len())
            .field("parameters", &self.inner.parameters.len())
            .field("tags", &self.inner.tags.len())
            .field("cached", &self.cached_count())
            .finish()
    }
}
