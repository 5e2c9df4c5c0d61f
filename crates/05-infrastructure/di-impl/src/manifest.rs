//! 容器清单编译
//!
//! 把冻结后的定义展开成不依赖运行期解析的 JSON 清单：每个服务的参数计划、
//! setter 调用序列、直接依赖，以及整体的实例化顺序。参数计划与运行期自动装配
//! 使用相同的优先级，只是"容器是否拥有某服务"改为静态判断。

use crate::graph::DependencyGraph;
use di_abstractions::{
    ContainerSnapshot, Definition, DefinitionCompiler, ParameterSpec, ParameterType, TypeCatalog,
};
use infrastructure_common::{AutowireError, ContainerError, Lifetime, ServiceId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 单个参数的注入计划
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlannedArgument {
    /// 注入服务
    Service { name: String, id: ServiceId },
    /// 读取参数表
    Parameter {
        name: String,
        key: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        cast: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<Value>,
    },
    /// 固定值（默认值或预先提供的 setter 参数）
    Value { name: String, value: Value },
    /// 空值
    Null { name: String },
}

/// setter 调用计划
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedCall {
    pub method: String,
    pub arguments: Vec<PlannedArgument>,
}

/// 单个服务的清单条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceManifest {
    pub id: ServiceId,
    pub target: Option<ServiceId>,
    pub factory: bool,
    pub lifetime: Lifetime,
    pub lazy: bool,
    pub explicit_lazy: bool,
    pub tags: Vec<String>,
    /// 工厂构造的服务没有参数计划
    pub arguments: Option<Vec<PlannedArgument>>,
    pub method_calls: Vec<PlannedCall>,
    pub dependencies: Vec<ServiceId>,
}

/// 容器清单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerManifest {
    pub services: Vec<ServiceManifest>,
    /// 依赖在前的实例化顺序
    pub instantiation_order: Vec<ServiceId>,
    pub bindings: BTreeMap<ServiceId, ServiceId>,
    pub parameters: BTreeMap<String, Value>,
    pub tags: BTreeMap<String, Vec<ServiceId>>,
}

/// 静态的"容器是否拥有某服务"判断
struct StaticLookup<'a> {
    snapshot: &'a ContainerSnapshot,
    catalog: &'a TypeCatalog,
}

impl StaticLookup<'_> {
    fn has(&self, id: &str) -> bool {
        let definitions = &self.snapshot.definitions;
        let resolved = self.snapshot.bindings.get(id).map_or(id, ServiceId::as_str);
        definitions.contains(id)
            || definitions.contains(resolved)
            || self.catalog.instantiable(resolved).is_some()
    }

    fn plan_parameter(&self, parameter: &ParameterSpec, owner: &str) -> Result<PlannedArgument, AutowireError> {
        let name = parameter.name.clone();

        if let Some(id) = &parameter.inject {
            return Ok(PlannedArgument::Service { name, id: id.clone() });
        }

        if let Some(key) = &parameter.param {
            return Ok(PlannedArgument::Parameter {
                name,
                key: key.clone(),
                cast: parameter.primitive_type().map(|primitive| primitive.to_string()),
                default: parameter.default.clone(),
            });
        }

        let service = match &parameter.ty {
            ParameterType::Service(id) => Some(id).filter(|id| self.has(id.as_str())),
            ParameterType::Union(ids) => ids.iter().find(|id| self.has(id.as_str())),
            ParameterType::Untyped | ParameterType::Primitive(_) => None,
        };
        if let Some(id) = service {
            return Ok(PlannedArgument::Service { name, id: id.clone() });
        }

        if let Some(value) = &parameter.default {
            return Ok(PlannedArgument::Value { name, value: value.clone() });
        }

        if parameter.nullable {
            return Ok(PlannedArgument::Null { name });
        }

        let declared_type = match &parameter.ty {
            ParameterType::Service(_) | ParameterType::Primitive(_) => parameter.ty.describe(),
            ParameterType::Union(_) | ParameterType::Untyped => None,
        };
        Err(AutowireError::UnresolvableParameter {
            parameter: name,
            owner: owner.to_string(),
            declared_type,
        })
    }

    fn plan_service(
        &self,
        id: &ServiceId,
        definition: &Definition,
        graph: &DependencyGraph,
    ) -> Result<ServiceManifest, AutowireError> {
        let type_name = definition.target_type().unwrap_or(id);
        let descriptor = self.catalog.get(type_name.as_str());

        let arguments = if definition.has_factory() {
            None
        } else {
            let constructor = descriptor
                .ok_or_else(|| AutowireError::TypeNotFound {
                    type_name: type_name.clone(),
                })?
                .constructor_spec()
                .ok_or_else(|| AutowireError::NotInstantiable {
                    type_name: type_name.clone(),
                })?;
            let owner = format!("{type_name}::new");
            Some(
                constructor
                    .parameters()
                    .iter()
                    .map(|parameter| self.plan_parameter(parameter, &owner))
                    .collect::<Result<Vec<_>, _>>()?,
            )
        };

        let mut method_calls = Vec::new();
        for call in definition.method_calls() {
            let method = descriptor
                .and_then(|descriptor| descriptor.method_spec(&call.method))
                .ok_or_else(|| AutowireError::UnknownMethod {
                    type_name: type_name.clone(),
                    method: call.method.clone(),
                })?;
            let owner = format!("{type_name}::{}", call.method);

            let mut arguments = Vec::new();
            for (index, parameter) in method.parameters().iter().enumerate() {
                let name = parameter.name.clone();
                let planned = match call.arguments.get(index) {
                    Some(Value::String(service)) if self.has(service) => PlannedArgument::Service {
                        name,
                        id: ServiceId::new(service.as_str()),
                    },
                    Some(value) => PlannedArgument::Value {
                        name,
                        value: value.clone(),
                    },
                    None => self.plan_parameter(parameter, &owner)?,
                };
                arguments.push(planned);
            }

            method_calls.push(PlannedCall {
                method: call.method.clone(),
                arguments,
            });
        }

        Ok(ServiceManifest {
            id: id.clone(),
            target: definition.target_type().cloned(),
            factory: definition.has_factory(),
            lifetime: definition.get_lifetime(),
            lazy: definition.is_lazy(),
            explicit_lazy: definition.has_explicit_lazy(),
            tags: definition.get_tags().to_vec(),
            arguments,
            method_calls,
            dependencies: graph.dependencies(id.as_str()).to_vec(),
        })
    }
}

/// 依赖在前的深度优先后序；循环中的回边被忽略
fn instantiation_order(graph: &DependencyGraph) -> Vec<ServiceId> {
    fn visit(
        node: &ServiceId,
        graph: &DependencyGraph,
        seen: &mut HashSet<ServiceId>,
        order: &mut Vec<ServiceId>,
    ) {
        if !seen.insert(node.clone()) {
            return;
        }
        for dependency in graph.dependencies(node.as_str()) {
            visit(dependency, graph, seen, order);
        }
        order.push(node.clone());
    }

    let mut seen = HashSet::new();
    let mut order = Vec::new();
    for node in graph.nodes() {
        visit(node, graph, &mut seen, &mut order);
    }
    order
}

impl ContainerManifest {
    /// 从冻结快照生成清单
    pub fn from_snapshot(snapshot: &ContainerSnapshot, catalog: &TypeCatalog) -> Result<Self, ContainerError> {
        let graph = DependencyGraph::build(&snapshot.definitions, &snapshot.bindings, catalog);
        let lookup = StaticLookup { snapshot, catalog };

        let services = snapshot
            .definitions
            .iter()
            .map(|(id, definition)| lookup.plan_service(id, definition, &graph))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            services,
            instantiation_order: instantiation_order(&graph),
            bindings: snapshot
                .bindings
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            parameters: snapshot
                .parameters
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            tags: snapshot
                .tags
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        })
    }

    /// 查找服务条目
    pub fn service(&self, id: &str) -> Option<&ServiceManifest> {
        self.services.iter().find(|service| service.id == id)
    }

    /// 序列化为格式化的 JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// 把清单写入文件的编译器
#[derive(Debug, Clone)]
pub struct ManifestCompiler {
    output: PathBuf,
    manifest: Option<ContainerManifest>,
}

impl ManifestCompiler {
    /// 创建编译器，清单写入 `output`
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            manifest: None,
        }
    }

    /// 输出路径
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// 最近一次生成的清单
    pub fn manifest(&self) -> Option<&ContainerManifest> {
        self.manifest.as_ref()
    }

    fn write_failed(&self, message: impl ToString) -> ContainerError {
        ContainerError::CompileFailed {
            path: self.output.display().to_string(),
            message: message.to_string(),
        }
    }
}

impl DefinitionCompiler for ManifestCompiler {
    fn compile(&mut self, snapshot: &ContainerSnapshot, catalog: &TypeCatalog) -> Result<(), ContainerError> {
        let manifest = ContainerManifest::from_snapshot(snapshot, catalog)?;
        let json = manifest.to_json().map_err(|e| self.write_failed(e))?;

        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.write_failed(e))?;
        }
        fs::write(&self.output, json).map_err(|e| self.write_failed(e))?;

        debug!("清单包含 {} 个服务", manifest.services.len());
        info!("容器清单已写入: {}", self.output.display());
        self.manifest = Some(manifest);
        Ok(())
    }
}
