use super::{Cached, CachingProvider};
use crate::options::StubMode;
use async_trait::async_trait;
use ddd_domain::error::{DomainError, DomainResult};
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::time::Duration;
use tracing::trace;

/// 未配置真实缓存时使用的占位提供者
///
/// - `PassThrough`：永远未命中，每次都执行查询
/// - `Strict`：拒绝任何经由缓存的读取
#[derive(Debug, Clone, Copy, Default)]
pub struct CachingProviderStub {
    mode: StubMode,
}

impl CachingProviderStub {
    pub fn new(mode: StubMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> StubMode {
        self.mode
    }
}

#[async_trait]
impl CachingProvider for CachingProviderStub {
    async fn get_or_compute<'a>(
        &self,
        key: &str,
        _ttl: Duration,
        _force_refresh: bool,
        compute: BoxFuture<'a, DomainResult<Value>>,
    ) -> DomainResult<Cached> {
        match self.mode {
            StubMode::PassThrough => {
                trace!(key, "stub cache miss");
                compute.await.map(Cached::miss)
            }
            StubMode::Strict => Err(DomainError::CachingProviderUnconfigured {
                key: key.to_string(),
            }),
        }
    }
}
