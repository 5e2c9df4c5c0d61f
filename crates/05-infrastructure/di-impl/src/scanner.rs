//! 基于类型目录的组件扫描器
//!
//! 以模块路径前缀作为扫描目标，`*` 表示整个目录。

use di_abstractions::{ComponentScanner, TypeCatalog};
use infrastructure_common::{ComponentMetadata, ContainerError};
use std::sync::Arc;

/// 类型目录扫描器
#[derive(Debug, Clone)]
pub struct CatalogScanner {
    catalog: Arc<TypeCatalog>,
}

impl CatalogScanner {
    /// 创建扫描器
    pub fn new(catalog: Arc<TypeCatalog>) -> Self {
        Self { catalog }
    }
}

fn in_module(id: &str, target: &str) -> bool {
    if target == "*" || id == target {
        return true;
    }
    id.strip_prefix(target)
        .is_some_and(|rest| target.ends_with("::") || rest.starts_with("::"))
}

impl ComponentScanner for CatalogScanner {
    fn scan(&self, target: &str) -> Result<Vec<ComponentMetadata>, ContainerError> {
        Ok(self
            .catalog
            .concrete_types()
            .filter(|descriptor| in_module(descriptor.id().as_str(), target))
            .map(|descriptor| descriptor.metadata().clone())
            .collect())
    }

    fn name(&self) -> &str {
        "catalog"
    }
}
