//! 服务依赖图
//!
//! 只根据定义和类型描述符静态推导依赖，不构造任何实例。
//! 工厂定义的依赖无法静态得知，视为没有依赖。

use di_abstractions::{DefinitionSet, ParameterSpec, ParameterType, TypeCatalog};
use infrastructure_common::ServiceId;
use std::collections::HashMap;

/// 依赖图（邻接表）
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    order: Vec<ServiceId>,
    edges: HashMap<ServiceId, Vec<ServiceId>>,
}

impl DependencyGraph {
    /// 从定义集合构建依赖图
    pub fn build(
        definitions: &DefinitionSet,
        bindings: &HashMap<ServiceId, ServiceId>,
        catalog: &TypeCatalog,
    ) -> Self {
        let mut graph = Self::default();

        for (id, definition) in definitions.iter() {
            let type_name = definition.target_type().unwrap_or(id);
            let descriptor = if definition.has_factory() {
                None
            } else {
                catalog.instantiable(type_name.as_str())
            };

            let mut dependencies = Vec::new();
            if let Some(descriptor) = descriptor {
                if let Some(constructor) = descriptor.constructor_spec() {
                    dependencies.extend(
                        constructor
                            .parameters()
                            .iter()
                            .filter_map(|parameter| parameter_dependency(parameter, definitions, bindings)),
                    );
                }

                for call in definition.method_calls() {
                    for argument in &call.arguments {
                        if let Some(name) = argument.as_str() {
                            let resolved = resolve_binding(bindings, name);
                            if definitions.contains(resolved) {
                                dependencies.push(ServiceId::new(resolved));
                            }
                        }
                    }
                }
            }

            graph.insert(id.clone(), dependencies);
        }

        graph
    }

    fn insert(&mut self, id: ServiceId, dependencies: Vec<ServiceId>) {
        let mut unique: Vec<ServiceId> = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            if !unique.contains(&dependency) {
                unique.push(dependency);
            }
        }
        self.order.push(id.clone());
        self.edges.insert(id, unique);
    }

    /// 按定义顺序排列的节点
    pub fn nodes(&self) -> &[ServiceId] {
        &self.order
    }

    /// 某个服务的直接依赖
    pub fn dependencies(&self, id: &str) -> &[ServiceId] {
        self.edges.get(id).map_or(&[], Vec::as_slice)
    }
}

fn resolve_binding<'a>(bindings: &'a HashMap<ServiceId, ServiceId>, id: &'a str) -> &'a str {
    bindings.get(id).map_or(id, ServiceId::as_str)
}

/// 构造函数参数依赖的服务，参数表参数、标量和未注册的类型都不算依赖
fn parameter_dependency(
    parameter: &ParameterSpec,
    definitions: &DefinitionSet,
    bindings: &HashMap<ServiceId, ServiceId>,
) -> Option<ServiceId> {
    if parameter.param.is_some() {
        return None;
    }

    let registered = |id: &str| {
        let resolved = resolve_binding(bindings, id);
        definitions.contains(resolved).then(|| ServiceId::new(resolved))
    };

    if let Some(inject) = &parameter.inject {
        return registered(inject.as_str());
    }

    match &parameter.ty {
        ParameterType::Service(id) => registered(id.as_str()),
        ParameterType::Union(ids) => ids.iter().find_map(|id| registered(id.as_str())),
        ParameterType::Untyped | ParameterType::Primitive(_) => None,
    }
}
