//! 组件基础接口定义
//!
//! 提供可被扫描发现的组件必须实现的 trait

use crate::metadata::{ComponentMetadata, ServiceId};

/// 可发现组件 trait
///
/// 通常由 `#[component]` 宏在编译时生成实现
pub trait Discoverable: Send + Sync + 'static {
    /// 组件元数据
    fn component_metadata() -> ComponentMetadata
    where
        Self: Sized;

    /// 组件标识符
    fn service_id() -> ServiceId
    where
        Self: Sized,
    {
        Self::component_metadata().id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Mailer;

    impl Discoverable for Mailer {
        fn component_metadata() -> ComponentMetadata {
            ComponentMetadata::new(ServiceId::of::<Self>()).transient()
        }
    }

    #[test]
    fn test_service_id_defaults_to_metadata_id() {
        assert_eq!(Mailer::service_id(), ServiceId::of::<Mailer>());
        assert!(Mailer::service_id().as_str().ends_with("::Mailer"));
    }
}
