//! 参数来源抽象接口

use std::path::Path;

/// 参数来源 trait
///
/// 定义从不同数据源读取原始字符串参数的统一接口
pub trait ParameterSource: Send + Sync {
    /// 获取来源名称
    fn name(&self) -> &str;

    /// 获取来源优先级，数值越高越优先
    fn priority(&self) -> i32 {
        0
    }

    /// 查找参数值
    fn lookup(&self, key: &str) -> Option<String>;

    /// 检查参数是否存在
    fn contains_key(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// 获取所有参数键
    fn keys(&self) -> Vec<String>;
}

/// 文件参数来源 trait
pub trait FileParameterSource: ParameterSource {
    /// 获取文件路径
    fn file_path(&self) -> &Path;

    /// 检查文件是否存在
    fn file_exists(&self) -> bool {
        self.file_path().is_file()
    }
}
