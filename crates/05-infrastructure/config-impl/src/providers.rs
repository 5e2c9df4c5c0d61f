//! 参数来源实现

use crate::dotenv::DotEnvParser;
use config_abstractions::{FileParameterSource, ParameterSource};
use infrastructure_common::ConfigError;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 进程环境变量来源
///
/// 每次查找都直接读取进程环境，不做快照。
#[derive(Debug, Clone)]
pub struct EnvironmentParameterSource {
    priority: i32,
}

impl EnvironmentParameterSource {
    /// 创建新的环境变量来源
    pub fn new() -> Self {
        Self {
            priority: 200, // 环境变量最高优先级
        }
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl Default for EnvironmentParameterSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterSource for EnvironmentParameterSource {
    fn name(&self) -> &str {
        "environment"
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn keys(&self) -> Vec<String> {
        std::env::vars().map(|(key, _)| key).collect()
    }
}

/// `.env` 文件来源
#[derive(Debug, Clone)]
pub struct DotEnvParameterSource {
    file_path: PathBuf,
    vars: HashMap<String, String>,
    priority: i32,
}

impl DotEnvParameterSource {
    /// 加载 `.env` 文件，文件不存在时为空来源
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let file_path = path.as_ref().to_path_buf();
        let vars = DotEnvParser::new().parse_file(&file_path);
        debug!("从 {} 加载了 {} 个变量", file_path.display(), vars.len());
        Self {
            file_path,
            vars,
            priority: 100,
        }
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl ParameterSource for DotEnvParameterSource {
    fn name(&self) -> &str {
        "dotenv"
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.vars.keys().cloned().collect()
    }
}

impl FileParameterSource for DotEnvParameterSource {
    fn file_path(&self) -> &Path {
        &self.file_path
    }
}

/// TOML 参数文件来源
///
/// 嵌套表以 `.` 连接成扁平键，例如 `[database] port = 5432` 对应 `database.port`。
#[derive(Debug, Clone)]
pub struct TomlParameterSource {
    file_path: PathBuf,
    values: HashMap<String, Value>,
    priority: i32,
}

impl TomlParameterSource {
    /// 加载 TOML 文件
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file_path = path.as_ref().to_path_buf();
        debug!("加载 TOML 参数文件: {}", file_path.display());

        if !file_path.is_file() {
            return Err(ConfigError::FileNotFound {
                path: file_path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(&file_path)?;
        let table: toml::Table = toml::from_str(&content).map_err(ConfigError::parse_error)?;

        let mut values = HashMap::new();
        flatten(&toml_to_json(&toml::Value::Table(table)), String::new(), &mut values);

        Ok(Self {
            file_path,
            values,
            priority: 50,
        })
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 获取类型化的参数值
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// 所有扁平化后的参数
    pub fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }
}

impl ParameterSource for TomlParameterSource {
    fn name(&self) -> &str {
        "toml"
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.values.get(key).map(value_to_string)
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

impl FileParameterSource for TomlParameterSource {
    fn file_path(&self) -> &Path {
        &self.file_path
    }
}

/// JSON 参数文件来源
#[derive(Debug, Clone)]
pub struct JsonParameterSource {
    file_path: PathBuf,
    values: HashMap<String, Value>,
    priority: i32,
}

impl JsonParameterSource {
    /// 加载 JSON 文件
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file_path = path.as_ref().to_path_buf();
        debug!("加载 JSON 参数文件: {}", file_path.display());

        if !file_path.is_file() {
            return Err(ConfigError::FileNotFound {
                path: file_path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(&file_path)?;
        let root: Value = serde_json::from_str(&content).map_err(ConfigError::parse_error)?;
        if !root.is_object() {
            return Err(ConfigError::type_conversion(format!(
                "{} 的根节点必须是对象",
                file_path.display()
            )));
        }

        let mut values = HashMap::new();
        flatten(&root, String::new(), &mut values);

        Ok(Self {
            file_path,
            values,
            priority: 50,
        })
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 获取类型化的参数值
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// 所有扁平化后的参数
    pub fn values(&self) -> &HashMap<String, Value> {
        &self.values
    }
}

impl ParameterSource for JsonParameterSource {
    fn name(&self) -> &str {
        "json"
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.values.get(key).map(value_to_string)
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

impl FileParameterSource for JsonParameterSource {
    fn file_path(&self) -> &Path {
        &self.file_path
    }
}

/// 内存参数来源
#[derive(Debug, Clone, Default)]
pub struct MapParameterSource {
    name: String,
    vars: HashMap<String, String>,
    priority: i32,
}

impl MapParameterSource {
    /// 创建新的内存来源
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: HashMap::new(),
            priority: 0,
        }
    }

    /// 添加变量
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl ParameterSource for MapParameterSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn keys(&self) -> Vec<String> {
        self.vars.keys().cloned().collect()
    }
}

/// 将 TOML 值转换为 JSON 值
fn toml_to_json(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::Number(serde_json::Number::from(*i)),
        toml::Value::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Array(arr) => Value::Array(arr.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
    }
}

/// 将嵌套对象展开为点分隔的扁平键，数组保持原样
fn flatten(value: &Value, prefix: String, out: &mut HashMap<String, Value>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let full_key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(child, full_key, out);
            }
        }
        other => {
            if !prefix.is_empty() {
                out.insert(prefix, other.clone());
            }
        }
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
