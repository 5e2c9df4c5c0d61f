//! 构建期循环依赖检测
//!
//! 只有全部参与者都是延迟单例的循环才是安全的：缓存的代理会在真正实例化之前
//! 截断循环。含有立即加载服务或延迟瞬时服务的循环在构建时直接报错。

use crate::graph::DependencyGraph;
use di_abstractions::DefinitionSet;
use infrastructure_common::{CircularDependencyError, ServiceId, UnsafeReason, UnsafeService};
use std::collections::HashSet;
use tracing::debug;

/// 循环依赖检测器
#[derive(Debug, Default)]
pub struct CircularDependencyDetector;

#[derive(Default)]
struct DfsState {
    path: Vec<ServiceId>,
    on_path: HashSet<ServiceId>,
    done: HashSet<ServiceId>,
}

impl CircularDependencyDetector {
    /// 创建检测器
    pub fn new() -> Self {
        Self
    }

    /// 检测依赖图，遇到第一个不安全的循环即返回错误
    pub fn detect(
        &self,
        graph: &DependencyGraph,
        definitions: &DefinitionSet,
    ) -> Result<(), CircularDependencyError> {
        let mut state = DfsState::default();

        for node in graph.nodes() {
            if !state.done.contains(node) {
                self.dfs_check(node, graph, definitions, &mut state)?;
            }
        }

        Ok(())
    }

    fn dfs_check(
        &self,
        current: &ServiceId,
        graph: &DependencyGraph,
        definitions: &DefinitionSet,
        state: &mut DfsState,
    ) -> Result<(), CircularDependencyError> {
        state.on_path.insert(current.clone());
        state.path.push(current.clone());

        for dependency in graph.dependencies(current.as_str()) {
            if state.done.contains(dependency) {
                continue;
            }

            if state.on_path.contains(dependency) {
                let start = state
                    .path
                    .iter()
                    .position(|id| id == dependency)
                    .unwrap_or_default();
                let mut cycle = state.path[start..].to_vec();
                cycle.push(dependency.clone());

                self.validate_cycle(cycle, definitions)?;
                continue;
            }

            self.dfs_check(dependency, graph, definitions, state)?;
        }

        state.path.pop();
        state.on_path.remove(current);
        state.done.insert(current.clone());

        Ok(())
    }

    fn validate_cycle(
        &self,
        cycle: Vec<ServiceId>,
        definitions: &DefinitionSet,
    ) -> Result<(), CircularDependencyError> {
        let participants = &cycle[..cycle.len() - 1];
        let mut unsafe_services = Vec::new();

        for id in participants {
            let Some(definition) = definitions.get(id.as_str()) else {
                continue;
            };

            let mut reasons = Vec::new();
            if !definition.is_lazy() {
                reasons.push(UnsafeReason::NotLazy);
            }
            if !definition.is_singleton() {
                reasons.push(UnsafeReason::NotSingleton);
            }

            if !reasons.is_empty() {
                unsafe_services.push(UnsafeService {
                    id: id.clone(),
                    reasons,
                    explicit_lazy: definition.has_explicit_lazy(),
                });
            }
        }

        if unsafe_services.is_empty() {
            debug!(
                "检测到安全的循环依赖: {}",
                cycle.iter().map(ServiceId::as_str).collect::<Vec<_>>().join(" -> ")
            );
            return Ok(());
        }

        Err(CircularDependencyError::unsafe_cycle(cycle, unsafe_services))
    }
}
