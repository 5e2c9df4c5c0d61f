//! `.env` 文件解析器

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

static BRACED_VARIABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("静态正则表达式必须合法")
});

static BARE_VARIABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("静态正则表达式必须合法"));

/// `.env` 文件解析器
///
/// 支持的语法:
///
/// - `KEY=value`，值两端空白会被去除
/// - `KEY="quoted value"`，支持转义序列与变量插值
/// - `KEY='single quoted'`，原样保留
/// - `# comment` 注释行与空行
/// - `export KEY=value` 前缀
/// - 未加引号的值中 ` #` 之后视为行内注释
/// - `${VAR}` 与 `$VAR` 插值：先查找已解析的键，再查找进程环境变量，都不存在时替换为空串
#[derive(Debug, Default, Clone, Copy)]
pub struct DotEnvParser;

impl DotEnvParser {
    /// 创建新的解析器
    pub fn new() -> Self {
        Self
    }

    /// 解析 `.env` 文件
    ///
    /// 文件不存在或不可读时返回空表。
    pub fn parse_file(&self, path: impl AsRef<Path>) -> HashMap<String, String> {
        let path = path.as_ref();
        if !path.is_file() {
            return HashMap::new();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => {
                debug!("解析 .env 文件: {}", path.display());
                self.parse_str(&content)
            }
            Err(error) => {
                debug!("无法读取 .env 文件 {}: {}", path.display(), error);
                HashMap::new()
            }
        }
    }

    /// 解析 `.env` 内容
    pub fn parse_str(&self, content: &str) -> HashMap<String, String> {
        let mut vars = HashMap::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line = line.strip_prefix("export ").unwrap_or(line);

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };

            let key = key.trim();
            if key.is_empty() {
                continue;
            }

            let value = parse_value(value.trim(), &vars);
            vars.insert(key.to_string(), value);
        }

        vars
    }
}

fn parse_value(value: &str, vars: &HashMap<String, String>) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        let inner = &value[1..value.len() - 1];
        return unescape(&interpolate(inner, vars));
    }

    if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
        return value[1..value.len() - 1].to_string();
    }

    let value = match value.find(" #") {
        Some(position) => value[..position].trim(),
        None => value,
    };

    interpolate(value, vars)
}

fn interpolate(value: &str, vars: &HashMap<String, String>) -> String {
    let replace = |captures: &Captures<'_>| lookup_variable(&captures[1], vars);
    let value = BRACED_VARIABLE.replace_all(value, replace);
    BARE_VARIABLE.replace_all(&value, replace).into_owned()
}

fn lookup_variable(name: &str, vars: &HashMap<String, String>) -> String {
    vars.get(name)
        .cloned()
        .or_else(|| std::env::var(name).ok())
        .unwrap_or_default()
}

fn unescape(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('v') => result.push('\u{0B}'),
            Some('f') => result.push('\u{0C}'),
            Some('0') => result.push('\0'),
            Some(other) => result.push(other),
            None => {}
        }
    }

    result
}
