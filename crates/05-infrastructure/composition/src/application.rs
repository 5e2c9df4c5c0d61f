//! 组装完成的应用

use di_abstractions::{Instance, ServiceContainer, ServiceContainerExt};
use di_impl::{Container, ContainerManifest};
use infrastructure_common::ContainerError;
use std::sync::Arc;

/// 组装完成的应用
///
/// 持有冻结后的容器，以及构建时生成的清单（如有）。
#[derive(Debug, Clone)]
pub struct Application {
    container: Container,
    manifest: Option<ContainerManifest>,
}

impl Application {
    pub(crate) fn new(container: Container, manifest: Option<ContainerManifest>) -> Self {
        Self { container, manifest }
    }

    /// 服务容器
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// 构建时写出的容器清单
    pub fn manifest(&self) -> Option<&ContainerManifest> {
        self.manifest.as_ref()
    }

    /// 获取服务实例
    pub fn get(&self, id: &str) -> Result<Instance, ContainerError> {
        self.container.get(id)
    }

    /// 以指定视图获取服务
    pub fn get_as<T: ?Sized + Send + Sync + 'static>(&self, id: &str) -> Result<Arc<T>, ContainerError> {
        self.container.get_as::<T>(id)
    }

    /// 取出容器
    pub fn into_container(self) -> Container {
        self.container
    }
}
