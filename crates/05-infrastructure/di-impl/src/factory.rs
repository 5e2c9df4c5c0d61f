//! 从扫描元数据创建服务定义

use di_abstractions::{AutoconfigureRule, Definition, TypeCatalog};
use infrastructure_common::{ComponentMetadata, Lifetime, ServiceId};

/// 定义工厂
#[derive(Debug, Clone, Copy, Default)]
pub struct DefinitionFactory;

impl DefinitionFactory {
    /// 创建定义工厂
    pub fn new() -> Self {
        Self
    }

    /// 组件是否声明了排除
    pub fn is_excluded(&self, metadata: &ComponentMetadata) -> bool {
        metadata.excluded
    }

    /// 按元数据中的提示创建定义
    ///
    /// 未声明生命周期时为单例；未声明延迟加载时保持未设置，由容器默认值决定。
    pub fn create_from_metadata(&self, metadata: &ComponentMetadata) -> Definition {
        let mut definition = Definition::new(metadata.id.clone());
        definition
            .lifetime(metadata.lifetime.unwrap_or(Lifetime::Singleton))
            .tags(metadata.tags.iter().cloned());

        if let Some(lazy) = metadata.lazy {
            definition.lazy(lazy);
        }

        definition
    }

    /// 创建定义并应用自动配置规则与类型目录中声明的自动配置标签
    pub fn create_autoconfigured(
        &self,
        metadata: &ComponentMetadata,
        rules: &[(ServiceId, AutoconfigureRule)],
        catalog: &TypeCatalog,
    ) -> Definition {
        let mut definition = self.create_from_metadata(metadata);
        for (target, rule) in rules {
            if metadata.matches(target.as_str()) {
                rule.apply(&mut definition);
            }
        }
        definition.tags(catalog.autoconfigure_tags_for(metadata));
        definition
    }
}
