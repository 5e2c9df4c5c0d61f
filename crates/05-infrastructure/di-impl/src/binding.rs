//! 接口自动绑定
//!
//! 扫描时记录"接口 -> 唯一实现"，同一接口出现多个实现时转为歧义记录，
//! 歧义在构建时报错，除非被显式绑定消除。

use infrastructure_common::{ContainerError, ServiceId};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// 自动绑定解析器
#[derive(Debug, Clone, Default)]
pub struct BindingResolver {
    bindings: HashMap<ServiceId, ServiceId>,
    explicit: HashSet<ServiceId>,
    ambiguous: Vec<(ServiceId, Vec<ServiceId>)>,
    excluded: HashSet<ServiceId>,
}

impl BindingResolver {
    /// 创建新的解析器
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个具体类型实现的接口
    ///
    /// `is_excluded` 判断接口是否因自动配置等原因不参与自动绑定。
    pub fn register_implementation(
        &mut self,
        concrete: &ServiceId,
        interfaces: &[ServiceId],
        is_excluded: impl Fn(&ServiceId) -> bool,
    ) {
        for interface in interfaces {
            if self.excluded.contains(interface) || interface.is_host_builtin() || is_excluded(interface) {
                continue;
            }

            if self.explicit.contains(interface) {
                continue;
            }

            if let Some((_, implementations)) = self
                .ambiguous
                .iter_mut()
                .find(|(ambiguous, _)| ambiguous == interface)
            {
                implementations.push(concrete.clone());
                continue;
            }

            match self.bindings.get(interface) {
                None => {
                    debug!("自动绑定: {} -> {}", interface, concrete);
                    self.bindings.insert(interface.clone(), concrete.clone());
                }
                Some(existing) if existing != concrete => {
                    debug!("接口 {} 存在多个实现: {}, {}", interface, existing, concrete);
                    let existing = existing.clone();
                    self.bindings.remove(interface);
                    self.ambiguous
                        .push((interface.clone(), vec![existing, concrete.clone()]));
                }
                Some(_) => {}
            }
        }
    }

    /// 显式绑定，覆盖自动绑定并清除歧义记录
    pub fn bind(&mut self, abstract_id: impl Into<ServiceId>, concrete: impl Into<ServiceId>) {
        let abstract_id = abstract_id.into();
        let concrete = concrete.into();

        if let Some(position) = self
            .ambiguous
            .iter()
            .position(|(interface, _)| interface == &abstract_id)
        {
            let (_, implementations) = self.ambiguous.remove(position);
            warn!(
                "显式绑定 {} -> {} 消除了歧义（候选: {:?}）",
                abstract_id, concrete, implementations
            );
        }

        self.explicit.insert(abstract_id.clone());
        self.bindings.insert(abstract_id, concrete);
    }

    /// 将接口或类型排除在自动绑定之外
    pub fn exclude<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<ServiceId>,
    {
        self.excluded.extend(ids.into_iter().map(Into::into));
    }

    /// 是否被排除
    pub fn is_excluded(&self, id: &str) -> bool {
        self.excluded.contains(id)
    }

    /// 当前绑定
    pub fn bindings(&self) -> &HashMap<ServiceId, ServiceId> {
        &self.bindings
    }

    /// 解析绑定，未绑定时返回自身
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.bindings.get(id).map_or(id, ServiceId::as_str)
    }

    /// 尚未消除的歧义
    pub fn ambiguities(&self) -> &[(ServiceId, Vec<ServiceId>)] {
        &self.ambiguous
    }

    /// 存在歧义时报告第一个
    pub fn validate_no_ambiguity(&self) -> Result<(), ContainerError> {
        match self.ambiguous.first() {
            None => Ok(()),
            Some((interface, implementations)) => Err(ContainerError::AmbiguousBinding {
                interface: interface.clone(),
                implementations: implementations.clone(),
            }),
        }
    }
}
