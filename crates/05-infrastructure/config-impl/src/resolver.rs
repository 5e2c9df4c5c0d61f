//! 环境变量表达式解析器
//!
//! 参数值中的 `%env(NAME)%` 或 `%env(TYPE:NAME)%` 在容器冻结前被展开，
//! TYPE 取值为 `string`、`bool`、`int`、`float`。

use crate::providers::{DotEnvParameterSource, EnvironmentParameterSource};
use config_abstractions::{ParameterResolver, ParameterSource};
use infrastructure_common::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use tracing::debug;

static ENV_EXPRESSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"%env\((?:(string|bool|int|float):)?([A-Za-z_][A-Za-z0-9_]*)\)%")
        .expect("静态正则表达式必须合法")
});

/// 环境变量类型转换
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvCast {
    /// 字符串（默认）
    String,
    /// 布尔值
    Bool,
    /// 整数
    Int,
    /// 浮点数
    Float,
}

impl EnvCast {
    fn parse(prefix: Option<&str>) -> Self {
        match prefix {
            Some("bool") => Self::Bool,
            Some("int") => Self::Int,
            Some("float") => Self::Float,
            _ => Self::String,
        }
    }

    /// 将原始字符串转换为目标类型
    pub fn apply(self, name: &str, raw: &str) -> Result<Value, ConfigError> {
        match self {
            Self::String => Ok(Value::String(raw.to_string())),
            Self::Bool => Ok(Value::Bool(is_truthy(raw))),
            Self::Int => raw.trim().parse::<i64>().map(Value::from).map_err(|_| {
                ConfigError::type_conversion(format!("环境变量 {name} 的值 \"{raw}\" 不是整数"))
            }),
            Self::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| {
                    ConfigError::type_conversion(format!(
                        "环境变量 {name} 的值 \"{raw}\" 不是浮点数"
                    ))
                }),
        }
    }
}

/// 宽松的布尔判定：`1`、`true`、`on`、`yes`（不区分大小写）为真
pub fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

/// 环境变量解析器
///
/// 按优先级从高到低依次查询各个来源。
pub struct EnvResolver {
    sources: Vec<Box<dyn ParameterSource>>,
}

impl EnvResolver {
    /// 创建空的解析器
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// 只读取进程环境变量
    pub fn from_process_env() -> Self {
        Self::new().with_source(EnvironmentParameterSource::new())
    }

    /// 读取项目目录下的 `.env` 与 `.env.local`，进程环境变量优先
    pub fn from_project_dir(project_dir: impl AsRef<Path>) -> Self {
        let project_dir = project_dir.as_ref();
        debug!("从项目目录加载环境变量: {}", project_dir.display());

        Self::new()
            .with_source(EnvironmentParameterSource::new())
            .with_source(DotEnvParameterSource::new(project_dir.join(".env.local")).with_priority(150))
            .with_source(DotEnvParameterSource::new(project_dir.join(".env")).with_priority(100))
    }

    /// 添加参数来源
    pub fn with_source(mut self, source: impl ParameterSource + 'static) -> Self {
        self.add_source(Box::new(source));
        self
    }

    /// 添加参数来源
    pub fn add_source(&mut self, source: Box<dyn ParameterSource>) {
        self.sources.push(source);
        self.sources.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// 来源名称，按查询顺序排列
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// 按名称查询原始字符串
    pub fn lookup(&self, name: &str) -> Option<String> {
        self.sources.iter().find_map(|source| source.lookup(name))
    }

    /// 解析单个字符串参数
    ///
    /// 整个字符串恰好是一个表达式时返回类型化的值，
    /// 否则把每个表达式替换为字符串后返回。
    pub fn resolve_str(&self, value: &str) -> Result<Value, ConfigError> {
        if let Some(captures) = ENV_EXPRESSION.captures(value) {
            let whole = captures.get(0).map_or(0..0, |m| m.range());
            if whole == (0..value.len()) {
                let cast = EnvCast::parse(captures.get(1).map(|m| m.as_str()));
                let name = &captures[2];
                let raw = self.require(name)?;
                return cast.apply(name, &raw);
            }
        } else {
            return Ok(Value::String(value.to_string()));
        }

        let mut result = String::with_capacity(value.len());
        let mut last = 0;
        for captures in ENV_EXPRESSION.captures_iter(value) {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            result.push_str(&value[last..whole.start()]);
            result.push_str(&self.require(&captures[2])?);
            last = whole.end();
        }
        result.push_str(&value[last..]);

        Ok(Value::String(result))
    }

    fn require(&self, name: &str) -> Result<String, ConfigError> {
        self.lookup(name).ok_or_else(|| ConfigError::UndefinedVariable {
            name: name.to_string(),
        })
    }
}

impl Default for EnvResolver {
    fn default() -> Self {
        Self::from_process_env()
    }
}

impl fmt::Debug for EnvResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvResolver")
            .field("sources", &self.source_names())
            .finish()
    }
}

impl ParameterResolver for EnvResolver {
    fn get(&self, name: &str) -> Option<Value> {
        self.lookup(name).map(Value::String)
    }

    fn resolve(&self, value: &Value) -> Result<Value, ConfigError> {
        match value {
            Value::String(s) => self.resolve_str(s),
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => map
                .iter()
                .map(|(key, item)| Ok((key.clone(), self.resolve(item)?)))
                .collect::<Result<serde_json::Map<_, _>, ConfigError>>()
                .map(Value::Object),
            other => Ok(other.clone()),
        }
    }
}
