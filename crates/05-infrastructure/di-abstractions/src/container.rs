//! 依赖注入容器抽象接口
//!
//! 提供容器对外的查询能力，工厂函数也通过它获取依赖

use crate::instance::{Instance, Service};
use infrastructure_common::ContainerError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// 按标签延迟解析的服务序列
pub type TaggedServices<'a> = Box<dyn Iterator<Item = Result<Instance, ContainerError>> + 'a>;

/// 服务容器 trait
pub trait ServiceContainer: Send + Sync {
    /// 解析服务
    fn get(&self, id: &str) -> Result<Instance, ContainerError>;

    /// 服务是否可以解析
    fn has(&self, id: &str) -> bool;

    /// 按标签获取服务，迭代时才逐个解析
    fn get_tagged(&self, tag: &str) -> TaggedServices<'_>;

    /// 获取参数
    fn get_parameter(&self, name: &str) -> Option<Value>;

    /// 获取全部参数
    fn get_parameters(&self) -> HashMap<String, Value>;
}

/// 服务容器的类型化扩展
pub trait ServiceContainerExt: ServiceContainer {
    /// 解析服务并以视图 `T` 访问
    fn get_as<T: ?Sized + Send + Sync + 'static>(&self, id: &str) -> Result<Arc<T>, ContainerError> {
        self.get(id)?.cast::<T>()
    }

    /// 解析服务并返回类型化句柄，不触发物化
    fn service<T: ?Sized + Send + Sync + 'static>(&self, id: &str) -> Result<Service<T>, ContainerError> {
        self.get(id).map(Service::new)
    }
}

impl<C: ServiceContainer + ?Sized> ServiceContainerExt for C {}
