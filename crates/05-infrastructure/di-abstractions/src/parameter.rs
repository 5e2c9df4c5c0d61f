//! 参数描述
//!
//! 描述构造函数或 setter 的一个参数，自动装配器按这些信息决定注入什么。

use infrastructure_common::ServiceId;
use serde_json::Value;
use std::fmt;

/// 标量类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// 整数
    Int,
    /// 浮点数
    Float,
    /// 布尔值
    Bool,
    /// 字符串
    String,
    /// 数组
    Array,
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Array => "array",
        };
        f.write_str(name)
    }
}

/// 参数声明类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterType {
    /// 无类型声明
    Untyped,
    /// 标量
    Primitive(PrimitiveType),
    /// 服务（具体类型或接口）
    Service(ServiceId),
    /// 多个服务类型的联合，按声明顺序尝试
    Union(Vec<ServiceId>),
}

impl ParameterType {
    /// 用于错误信息的类型描述
    pub fn describe(&self) -> Option<String> {
        match self {
            Self::Untyped => None,
            Self::Primitive(primitive) => Some(primitive.to_string()),
            Self::Service(id) => Some(id.to_string()),
            Self::Union(ids) => Some(
                ids.iter()
                    .map(ServiceId::as_str)
                    .collect::<Vec<_>>()
                    .join("|"),
            ),
        }
    }

    /// 声明中出现的服务类型
    pub fn service_types(&self) -> &[ServiceId] {
        match self {
            Self::Service(id) => std::slice::from_ref(id),
            Self::Union(ids) => ids,
            Self::Untyped | Self::Primitive(_) => &[],
        }
    }
}

/// 参数描述
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    /// 参数名
    pub name: String,
    /// 声明类型
    pub ty: ParameterType,
    /// 是否允许空值
    pub nullable: bool,
    /// 默认值
    pub default: Option<Value>,
    /// 显式注入的服务标识符
    pub inject: Option<ServiceId>,
    /// 绑定的参数表键
    pub param: Option<String>,
}

impl ParameterSpec {
    /// 创建参数描述
    pub fn new(name: impl Into<String>, ty: ParameterType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            default: None,
            inject: None,
            param: None,
        }
    }

    /// 服务类型参数
    pub fn service(name: impl Into<String>, ty: impl Into<ServiceId>) -> Self {
        Self::new(name, ParameterType::Service(ty.into()))
    }

    /// 联合类型参数
    pub fn union<I, S>(name: impl Into<String>, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ServiceId>,
    {
        Self::new(
            name,
            ParameterType::Union(types.into_iter().map(Into::into).collect()),
        )
    }

    /// 标量参数
    pub fn primitive(name: impl Into<String>, primitive: PrimitiveType) -> Self {
        Self::new(name, ParameterType::Primitive(primitive))
    }

    /// 整数参数
    pub fn int(name: impl Into<String>) -> Self {
        Self::primitive(name, PrimitiveType::Int)
    }

    /// 浮点数参数
    pub fn float(name: impl Into<String>) -> Self {
        Self::primitive(name, PrimitiveType::Float)
    }

    /// 布尔参数
    pub fn bool(name: impl Into<String>) -> Self {
        Self::primitive(name, PrimitiveType::Bool)
    }

    /// 字符串参数
    pub fn string(name: impl Into<String>) -> Self {
        Self::primitive(name, PrimitiveType::String)
    }

    /// 数组参数
    pub fn array(name: impl Into<String>) -> Self {
        Self::primitive(name, PrimitiveType::Array)
    }

    /// 无类型参数
    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(name, ParameterType::Untyped)
    }

    /// 显式注入指定服务
    pub fn inject(mut self, id: impl Into<ServiceId>) -> Self {
        self.inject = Some(id.into());
        self
    }

    /// 从参数表读取
    pub fn param(mut self, key: impl Into<String>) -> Self {
        self.param = Some(key.into());
        self
    }

    /// 设置默认值
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// 允许空值
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// 标量类型（如有）
    pub fn primitive_type(&self) -> Option<PrimitiveType> {
        match self.ty {
            ParameterType::Primitive(primitive) => Some(primitive),
            _ => None,
        }
    }
}
