//! 延迟代理
//!
//! 代理在第一次被访问时调用初始化器构造真实实例，此后一直复用该实例。
//! 初始化失败不会被缓存，下一次访问会重试。

use crate::instance::Instance;
use infrastructure_common::{CircularDependencyError, ContainerError, ServiceId};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};

/// 延迟初始化器
pub type Initializer = Arc<dyn Fn() -> Result<Instance, ContainerError> + Send + Sync>;

struct ProxyInner {
    service_type: ServiceId,
    initializer: Initializer,
    cell: OnceCell<Instance>,
    // 正在执行初始化的线程
    initializing: Mutex<Option<ThreadId>>,
}

/// 延迟代理
#[derive(Clone)]
pub struct LazyProxy {
    inner: Arc<ProxyInner>,
}

impl LazyProxy {
    /// 创建新的延迟代理
    pub fn new(
        service_type: impl Into<ServiceId>,
        initializer: impl Fn() -> Result<Instance, ContainerError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(ProxyInner {
                service_type: service_type.into(),
                initializer: Arc::new(initializer),
                cell: OnceCell::new(),
                initializing: Mutex::new(None),
            }),
        }
    }

    /// 服务类型
    pub fn service_type(&self) -> &ServiceId {
        &self.inner.service_type
    }

    /// 是否已物化
    pub fn is_materialized(&self) -> bool {
        self.inner.cell.get().is_some()
    }

    /// 物化代理，返回已构造的实例
    ///
    /// 同一线程在初始化过程中再次物化同一代理会得到循环依赖错误；
    /// 其他线程会等待正在进行的初始化完成。
    pub fn materialize(&self) -> Result<Instance, ContainerError> {
        if let Some(instance) = self.inner.cell.get() {
            return Ok(instance.clone());
        }

        let current = thread::current().id();
        if *self.inner.initializing.lock() == Some(current) {
            return Err(CircularDependencyError::runtime(vec![
                self.inner.service_type.clone(),
                self.inner.service_type.clone(),
            ])
            .into());
        }

        self.inner
            .cell
            .get_or_try_init(|| {
                let _initializing = InitializingGuard::mark(&self.inner.initializing, current);
                (self.inner.initializer)().and_then(|produced| produced.materialize())
            })
            .cloned()
    }
}

/// 初始化期间记录当前线程，离开作用域（包括 panic）时清除
struct InitializingGuard<'a> {
    slot: &'a Mutex<Option<ThreadId>>,
}

impl<'a> InitializingGuard<'a> {
    fn mark(slot: &'a Mutex<Option<ThreadId>>, thread: ThreadId) -> Self {
        *slot.lock() = Some(thread);
        Self { slot }
    }
}

impl Drop for InitializingGuard<'_> {
    fn drop(&mut self) {
        *self.slot.lock() = None;
    }
}

impl fmt::Debug for LazyProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyProxy")
            .field("service_type", &self.inner.service_type)
            .field("materialized", &self.is_materialized())
            .finish()
    }
}
