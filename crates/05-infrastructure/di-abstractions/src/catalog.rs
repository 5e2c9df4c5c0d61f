//! 类型目录
//!
//! 保存所有已描述的类型，按注册顺序遍历。

use crate::descriptor::{TypeDescriptor, TypeKind};
use infrastructure_common::{ComponentMetadata, ServiceId};
use std::collections::HashMap;

/// 类型目录
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    descriptors: Vec<TypeDescriptor>,
    index: HashMap<ServiceId, usize>,
}

impl TypeCatalog {
    /// 创建空目录
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册类型描述符，同名描述符会被替换
    pub fn register(&mut self, descriptor: TypeDescriptor) -> &mut Self {
        match self.index.get(descriptor.id()) {
            Some(&position) => self.descriptors[position] = descriptor,
            None => {
                self.index.insert(descriptor.id().clone(), self.descriptors.len());
                self.descriptors.push(descriptor);
            }
        }
        self
    }

    /// 注册类型描述符（链式）
    pub fn with(mut self, descriptor: TypeDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    /// 查找描述符
    pub fn get(&self, id: &str) -> Option<&TypeDescriptor> {
        self.index.get(id).map(|&position| &self.descriptors[position])
    }

    /// 是否包含描述符
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// 查找可实例化的描述符
    pub fn instantiable(&self, id: &str) -> Option<&TypeDescriptor> {
        self.get(id).filter(|descriptor| descriptor.is_instantiable())
    }

    /// 按注册顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.descriptors.iter()
    }

    /// 所有具体类型
    pub fn concrete_types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.descriptors
            .iter()
            .filter(|descriptor| descriptor.kind() == TypeKind::Concrete)
    }

    /// 描述符数量
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// 实现的接口或携带的属性声明的自动配置标签
    pub fn autoconfigure_tags_for(&self, metadata: &ComponentMetadata) -> Vec<String> {
        let mut tags = Vec::new();
        let targets = metadata
            .interfaces
            .iter()
            .map(ServiceId::as_str)
            .chain(metadata.attributes.iter().map(String::as_str));

        for target in targets {
            if let Some(descriptor) = self.get(target) {
                for tag in descriptor.autoconfigure_tags() {
                    if !tags.contains(tag) {
                        tags.push(tag.clone());
                    }
                }
            }
        }
        tags
    }

    /// 接口是否声明了自动配置标签
    pub fn has_autoconfigure_tags(&self, id: &str) -> bool {
        self.get(id)
            .is_some_and(|descriptor| !descriptor.autoconfigure_tags().is_empty())
    }
}
