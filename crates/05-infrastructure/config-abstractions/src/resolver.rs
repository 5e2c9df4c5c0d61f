//! 参数解析器抽象接口

use infrastructure_common::ConfigError;
use serde_json::Value;

/// 参数解析器 trait
///
/// 容器在冻结参数表之前通过它展开环境变量表达式，
/// 并在参数表缺失某个名称时回退到它查询。
pub trait ParameterResolver: Send + Sync {
    /// 按名称获取原始值
    fn get(&self, name: &str) -> Option<Value>;

    /// 解析一个参数值中的所有表达式
    fn resolve(&self, value: &Value) -> Result<Value, ConfigError>;
}
