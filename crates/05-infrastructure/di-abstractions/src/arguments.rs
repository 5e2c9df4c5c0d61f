//! 已解析的调用参数

use crate::instance::{Instance, Service};
use infrastructure_common::{AutowireError, ContainerError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// 单个参数值：服务实例或参数表中的值
#[derive(Debug, Clone)]
pub enum Argument {
    /// 服务实例
    Service(Instance),
    /// 标量、数组或空值
    Value(Value),
}

impl Argument {
    /// 是否为服务实例
    pub fn is_service(&self) -> bool {
        matches!(self, Self::Service(_))
    }
}

impl From<Instance> for Argument {
    fn from(instance: Instance) -> Self {
        Self::Service(instance)
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// 一次构造函数或 setter 调用的全部参数
#[derive(Debug, Clone)]
pub struct Arguments {
    owner: String,
    items: Vec<(String, Argument)>,
}

impl Arguments {
    /// 创建空参数列表，`owner` 形如 `app::Mailer::new`
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            items: Vec::new(),
        }
    }

    /// 追加参数
    pub fn push(&mut self, name: impl Into<String>, argument: impl Into<Argument>) {
        self.items.push((name.into(), argument.into()));
    }

    /// 追加参数（链式）
    pub fn with(mut self, name: impl Into<String>, argument: impl Into<Argument>) -> Self {
        self.push(name, argument);
        self
    }

    /// 所属的调用
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// 参数个数
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 是否没有参数
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 按位置获取参数
    pub fn argument(&self, index: usize) -> Result<&Argument, AutowireError> {
        self.items
            .get(index)
            .map(|(_, argument)| argument)
            .ok_or_else(|| AutowireError::MissingArgument {
                owner: self.owner.clone(),
                index,
            })
    }

    /// 服务实例参数
    pub fn instance(&self, index: usize) -> Result<Instance, AutowireError> {
        match self.argument(index)? {
            Argument::Service(instance) => Ok(instance.clone()),
            Argument::Value(_) => Err(self.mismatch(index, "a service")),
        }
    }

    /// 类型化服务句柄，不触发物化
    pub fn service<T: ?Sized + Send + Sync + 'static>(
        &self,
        index: usize,
    ) -> Result<Service<T>, AutowireError> {
        self.instance(index).map(Service::new)
    }

    /// 可空的服务句柄，空值返回 `None`
    pub fn optional_service<T: ?Sized + Send + Sync + 'static>(
        &self,
        index: usize,
    ) -> Result<Option<Service<T>>, AutowireError> {
        match self.argument(index)? {
            Argument::Service(instance) => Ok(Some(Service::new(instance.clone()))),
            Argument::Value(Value::Null) => Ok(None),
            Argument::Value(_) => Err(self.mismatch(index, "a service or null")),
        }
    }

    /// 立即获取服务，必要时触发物化
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self, index: usize) -> Result<Arc<T>, ContainerError> {
        self.service::<T>(index)?.get()
    }

    /// 值参数
    pub fn value(&self, index: usize) -> Result<&Value, AutowireError> {
        match self.argument(index)? {
            Argument::Value(value) => Ok(value),
            Argument::Service(_) => Err(self.mismatch(index, "a value")),
        }
    }

    /// 字符串参数
    pub fn string(&self, index: usize) -> Result<String, AutowireError> {
        self.value(index)?
            .as_str()
            .map(ToString::to_string)
            .ok_or_else(|| self.mismatch(index, "a string"))
    }

    /// 整数参数
    pub fn int(&self, index: usize) -> Result<i64, AutowireError> {
        self.value(index)?
            .as_i64()
            .ok_or_else(|| self.mismatch(index, "an int"))
    }

    /// 浮点数参数
    pub fn float(&self, index: usize) -> Result<f64, AutowireError> {
        self.value(index)?
            .as_f64()
            .ok_or_else(|| self.mismatch(index, "a float"))
    }

    /// 布尔参数
    pub fn bool(&self, index: usize) -> Result<bool, AutowireError> {
        self.value(index)?
            .as_bool()
            .ok_or_else(|| self.mismatch(index, "a bool"))
    }

    /// 数组参数
    pub fn array(&self, index: usize) -> Result<Vec<Value>, AutowireError> {
        self.value(index)?
            .as_array()
            .cloned()
            .ok_or_else(|| self.mismatch(index, "an array"))
    }

    /// 反序列化为任意类型
    pub fn deserialize<T: DeserializeOwned>(&self, index: usize) -> Result<T, AutowireError> {
        serde_json::from_value(self.value(index)?.clone())
            .map_err(|_| self.mismatch(index, std::any::type_name::<T>()))
    }

    fn mismatch(&self, index: usize, expected: &'static str) -> AutowireError {
        let parameter = self
            .items
            .get(index)
            .map_or_else(|| index.to_string(), |(name, _)| name.clone());
        AutowireError::ArgumentMismatch {
            owner: self.owner.clone(),
            parameter,
            expected,
        }
    }
}
