//! 容器构建器
//!
//! 构建阶段收集定义、绑定、参数与自动配置规则；`build` 与 `compile`
//! 共用同一套冻结流程：歧义检查、默认延迟加载、循环依赖检测、参数解析。

use crate::binding::BindingResolver;
use crate::circular::CircularDependencyDetector;
use crate::container::Container;
use crate::factory::DefinitionFactory;
use crate::graph::DependencyGraph;
use crate::scanner::CatalogScanner;
use config_abstractions::ParameterResolver;
use config_impl::EnvResolver;
use di_abstractions::{
    Argument, AutoconfigureRule, ComponentScanner, ContainerSnapshot, Definition, DefinitionCompiler,
    DefinitionSet, ServiceContainer, TypeCatalog, TypeDescriptor,
};
use infrastructure_common::{ComponentMetadata, ContainerError, ServiceId};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// 容器构建器
pub struct ContainerBuilder {
    catalog: TypeCatalog,
    definitions: DefinitionSet,
    binding_resolver: BindingResolver,
    parameters: Vec<(String, Value)>,
    autoconfiguration: Vec<(ServiceId, AutoconfigureRule)>,
    default_lazy: bool,
    resolver: Option<Arc<dyn ParameterResolver>>,
    factory: DefinitionFactory,
}

impl ContainerBuilder {
    /// 创建空的构建器，参数解析默认读取进程环境变量
    pub fn new() -> Self {
        Self::with_catalog(TypeCatalog::new())
    }

    /// 使用已有的类型目录创建构建器
    pub fn with_catalog(catalog: TypeCatalog) -> Self {
        Self {
            catalog,
            definitions: DefinitionSet::new(),
            binding_resolver: BindingResolver::new(),
            parameters: Vec::new(),
            autoconfiguration: Vec::new(),
            default_lazy: true,
            resolver: Some(Arc::new(EnvResolver::from_process_env())),
            factory: DefinitionFactory::new(),
        }
    }

    /// 注册类型描述符
    pub fn register_type(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        self.catalog.register(descriptor);
        self
    }

    /// 设置参数解析器
    pub fn parameter_resolver(&mut self, resolver: Arc<dyn ParameterResolver>) -> &mut Self {
        self.resolver = Some(resolver);
        self
    }

    /// 不使用参数解析器，参数按原样冻结
    pub fn without_parameter_resolver(&mut self) -> &mut Self {
        self.resolver = None;
        self
    }

    /// 注册服务；已存在时返回已有定义
    pub fn register(&mut self, id: impl Into<ServiceId>) -> &mut Definition {
        let id = id.into();
        let target = id.clone();
        self.definitions
            .get_or_insert_with(id, || Definition::new(target))
    }

    /// 以工厂注册服务；已存在时替换其工厂
    pub fn register_factory(
        &mut self,
        id: impl Into<ServiceId>,
        factory: impl Fn(&dyn ServiceContainer) -> Result<Argument, ContainerError> + Send + Sync + 'static,
    ) -> &mut Definition {
        self.register(id).set_factory(factory)
    }

    /// 显式绑定接口到具体服务
    pub fn bind(&mut self, abstract_id: impl Into<ServiceId>, concrete: impl Into<ServiceId>) -> &mut Self {
        self.binding_resolver.bind(abstract_id, concrete);
        self
    }

    /// 将接口或类型排除在自动绑定之外
    pub fn exclude_from_auto_binding<I, S>(&mut self, ids: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ServiceId>,
    {
        self.binding_resolver.exclude(ids);
        self
    }

    /// 为实现某接口（或携带某属性）的类型注册自动配置规则
    pub fn register_for_autoconfiguration(&mut self, target: impl Into<ServiceId>) -> &mut AutoconfigureRule {
        let target = target.into();
        let position = match self.autoconfiguration.iter().position(|(id, _)| id == &target) {
            Some(position) => position,
            None => {
                self.autoconfiguration.push((target, AutoconfigureRule::new()));
                self.autoconfiguration.len() - 1
            }
        };
        &mut self.autoconfiguration[position].1
    }

    /// 未显式声明延迟加载的服务使用的默认值
    pub fn default_lazy(&mut self, lazy: bool) -> &mut Self {
        self.default_lazy = lazy;
        self
    }

    /// 设置参数
    pub fn parameter(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let name = name.into();
        let value = value.into();
        match self.parameters.iter_mut().find(|(existing, _)| existing == &name) {
            Some((_, slot)) => *slot = value,
            None => self.parameters.push((name, value)),
        }
        self
    }

    /// 使用扫描器发现组件
    pub fn scan(&mut self, scanner: &dyn ComponentScanner, target: &str) -> Result<&mut Self, ContainerError> {
        if !scanner.supports(target) {
            return Err(ContainerError::ScanFailed {
                target: target.to_string(),
                message: format!("scanner \"{}\" does not support this target", scanner.name()),
            });
        }

        let discovered = scanner.scan(target)?;
        debug!("扫描器 {} 在 {} 中发现 {} 个组件", scanner.name(), target, discovered.len());
        Ok(self.register_discovered(discovered))
    }

    /// 扫描自身类型目录中指定模块下的具体类型
    pub fn scan_catalog(&mut self, target: &str) -> Result<&mut Self, ContainerError> {
        let scanner = CatalogScanner::new(Arc::new(self.catalog.clone()));
        self.scan(&scanner, target)
    }

    /// 注册发现的组件
    ///
    /// 已注册、声明排除或无法实例化的类型被跳过。
    pub fn register_discovered<I>(&mut self, discovered: I) -> &mut Self
    where
        I: IntoIterator<Item = ComponentMetadata>,
    {
        for metadata in discovered {
            if self.definitions.contains(metadata.id.as_str()) {
                continue;
            }

            if self.factory.is_excluded(&metadata) {
                debug!("跳过排除的组件: {}", metadata.id);
                continue;
            }

            if self.catalog.instantiable(metadata.id.as_str()).is_none() {
                debug!("跳过不可实例化的类型: {}", metadata.id);
                continue;
            }

            let definition =
                self.factory
                    .create_autoconfigured(&metadata, &self.autoconfiguration, &self.catalog);
            self.definitions.insert(metadata.id.clone(), definition);

            let autoconfiguration = &self.autoconfiguration;
            let catalog = &self.catalog;
            self.binding_resolver
                .register_implementation(&metadata.id, &metadata.interfaces, |interface| {
                    autoconfiguration.iter().any(|(target, _)| target == interface)
                        || catalog.has_autoconfigure_tags(interface.as_str())
                });
        }
        self
    }

    /// 当前定义
    pub fn definitions(&self) -> &DefinitionSet {
        &self.definitions
    }

    /// 当前绑定
    pub fn bindings(&self) -> &HashMap<ServiceId, ServiceId> {
        self.binding_resolver.bindings()
    }

    /// 类型目录
    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    /// 冻结并创建容器
    pub fn build(&self) -> Result<Container, ContainerError> {
        let snapshot = self.finalize()?;
        info!(
            "容器构建完成: {} 个定义, {} 个绑定, {} 个参数",
            snapshot.definitions.len(),
            snapshot.bindings.len(),
            snapshot.parameters.len()
        );

        Ok(Container::new(
            snapshot,
            Arc::new(self.catalog.clone()),
            self.resolver.clone(),
            self.default_lazy,
            self.autoconfiguration.clone(),
        ))
    }

    /// 冻结并交给编译器
    pub fn compile(&self, compiler: &mut dyn DefinitionCompiler) -> Result<(), ContainerError> {
        let snapshot = self.finalize()?;
        compiler.compile(&snapshot, &self.catalog)?;
        info!("容器定义已编译: {} 个定义", snapshot.definitions.len());
        Ok(())
    }

    fn finalize(&self) -> Result<ContainerSnapshot, ContainerError> {
        self.binding_resolver.validate_no_ambiguity()?;

        let mut definitions = self.definitions.clone();
        for definition in definitions.values_mut() {
            definition.apply_default_lazy(self.default_lazy);
        }

        let bindings = self.binding_resolver.bindings().clone();
        let graph = DependencyGraph::build(&definitions, &bindings, &self.catalog);
        CircularDependencyDetector::new().detect(&graph, &definitions)?;

        let parameters = self.resolve_parameters()?;

        let mut tags: HashMap<String, Vec<ServiceId>> = HashMap::new();
        for (id, definition) in definitions.iter() {
            for tag in definition.get_tags() {
                tags.entry(tag.clone()).or_default().push(id.clone());
            }
        }

        Ok(ContainerSnapshot {
            definitions,
            bindings,
            parameters,
            tags,
        })
    }

    fn resolve_parameters(&self) -> Result<HashMap<String, Value>, ContainerError> {
        self.parameters
            .iter()
            .map(|(name, value)| -> Result<(String, Value), ContainerError> {
                let resolved = match &self.resolver {
                    Some(resolver) => resolver.resolve(value)?,
                    None => value.clone(),
                };
                Ok((name.clone(), resolved))
            })
            .collect()
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("types", &self.catalog.len())
            .field("definitions", &self.definitions.len())
            .field("bindings", &self.binding_resolver.bindings().len())
            .field("parameters", &self.parameters.len())
            .field("default_lazy", &self.default_lazy)
            .finish()
    }
}
