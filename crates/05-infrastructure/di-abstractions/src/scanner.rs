//! 组件扫描器抽象接口
//!
//! 提供自动发现组件的能力

use infrastructure_common::{ComponentMetadata, ContainerError};

/// 组件扫描器 trait
///
/// 返回目标中所有可发现类型的元数据，由构建器决定如何登记
pub trait ComponentScanner: Send + Sync {
    /// 扫描指定目标中的组件
    fn scan(&self, target: &str) -> Result<Vec<ComponentMetadata>, ContainerError>;

    /// 获取扫描器名称
    fn name(&self) -> &str;

    /// 检查是否支持指定的扫描目标
    fn supports(&self, target: &str) -> bool {
        !target.is_empty()
    }
}
