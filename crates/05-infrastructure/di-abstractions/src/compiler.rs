//! 定义编译器抽象接口

use crate::catalog::TypeCatalog;
use crate::definition::DefinitionSet;
use infrastructure_common::{ContainerError, ServiceId};
use serde_json::Value;
use std::collections::HashMap;

/// 冻结前最终确定的容器状态
#[derive(Debug, Clone, Default)]
pub struct ContainerSnapshot {
    /// 定义（已应用默认延迟加载）
    pub definitions: DefinitionSet,
    /// 接口到实现的绑定
    pub bindings: HashMap<ServiceId, ServiceId>,
    /// 已解析的参数表
    pub parameters: HashMap<String, Value>,
    /// 标签索引
    pub tags: HashMap<String, Vec<ServiceId>>,
}

/// 定义编译器 trait
///
/// 接收最终确定的容器状态，生成不依赖运行期描述的产物。
/// 产物必须复现与运行期容器相同的实例化顺序和 setter 调用序列。
pub trait DefinitionCompiler {
    /// 编译
    fn compile(&mut self, snapshot: &ContainerSnapshot, catalog: &TypeCatalog) -> Result<(), ContainerError>;
}
