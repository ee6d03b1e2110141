use super::UnitOfWork;
use crate::caching::{CachingProvider, CachingProviderStub, MemoryCachingProvider};
use crate::database::Database;
use crate::eventing::DomainEventBroker;
use crate::options::{CachingProviderKind, InfrastructureOptions, ServiceLifetime};
use ddd_domain::clock::{Clock, SystemClock};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct ContextInner {
    database: Arc<dyn Database>,
    broker: Arc<DomainEventBroker>,
    clock: Arc<dyn Clock>,
    options: InfrastructureOptions,
    // Singleton 生命周期下共享的提供者
    shared_cache: Option<Arc<dyn CachingProvider>>,
}

/// 持久化上下文
///
/// 进程内共享（可廉价克隆），持有存储、事件代理、时钟与缓存登记；
/// 每个逻辑操作通过 `unit_of_work` 获得独立的工作单元。
#[derive(Clone)]
pub struct DbContext {
    inner: Arc<ContextInner>,
}

#[bon::bon]
impl DbContext {
    /// `caching_provider` 显式给定时按单例共享，忽略 `options` 中的提供者种类与生命周期
    #[builder]
    pub fn new(
        database: Arc<dyn Database>,
        broker: Arc<DomainEventBroker>,
        #[builder(default)] options: InfrastructureOptions,
        clock: Option<Arc<dyn Clock>>,
        caching_provider: Option<Arc<dyn CachingProvider>>,
    ) -> Self {
        let shared_cache = caching_provider.or_else(|| match options.caching_lifetime() {
            ServiceLifetime::Singleton => Some(create_caching_provider(&options)),
            ServiceLifetime::Scoped => None,
        });
        Self {
            inner: Arc::new(ContextInner {
                database,
                broker,
                clock: clock.unwrap_or_else(|| Arc::new(SystemClock)),
                options,
                shared_cache,
            }),
        }
    }
}

impl DbContext {
    pub fn database(&self) -> &Arc<dyn Database> {
        &self.inner.database
    }

    pub fn broker(&self) -> &Arc<DomainEventBroker> {
        &self.inner.broker
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.inner.clock
    }

    pub fn options(&self) -> &InfrastructureOptions {
        &self.inner.options
    }

    /// 开启新的工作单元
    pub fn unit_of_work(&self) -> UnitOfWork {
        self.unit_of_work_with_cancellation(CancellationToken::new())
    }

    /// 开启受给定令牌控制的工作单元
    pub fn unit_of_work_with_cancellation(&self, cancellation: CancellationToken) -> UnitOfWork {
        let cache = match &self.inner.shared_cache {
            Some(shared) => shared.clone(),
            None => create_caching_provider(&self.inner.options),
        };
        UnitOfWork::new(self.clone(), cache, cancellation)
    }
}

impl fmt::Debug for DbContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbContext")
            .field("options", &self.inner.options)
            .field("broker", &self.inner.broker)
            .finish_non_exhaustive()
    }
}

fn create_caching_provider(options: &InfrastructureOptions) -> Arc<dyn CachingProvider> {
    match options.caching_provider() {
        CachingProviderKind::Stub => Arc::new(CachingProviderStub::new(options.stub_mode())),
        CachingProviderKind::Memory => Arc::new(MemoryCachingProvider::new()),
    }
}
