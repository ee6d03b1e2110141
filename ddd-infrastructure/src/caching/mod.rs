//! 缓存提供者（CachingProvider）
//!
//! 仓储在规约启用缓存时经由提供者读取：命中则直接返回缓存值，
//! 否则执行查询并按 TTL 缓存结果。
//!
mod memory;
mod stub;

pub use memory::MemoryCachingProvider;
pub use stub::CachingProviderStub;

use async_trait::async_trait;
use ddd_domain::error::DomainResult;
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::time::Duration;

/// 经由缓存得到的值
#[derive(Debug, Clone, PartialEq)]
pub struct Cached {
    pub value: Value,
    /// 是否来自缓存
    pub hit: bool,
}

impl Cached {
    pub fn hit(value: Value) -> Self {
        Self { value, hit: true }
    }

    pub fn miss(value: Value) -> Self {
        Self { value, hit: false }
    }
}

#[async_trait]
pub trait CachingProvider: Send + Sync {
    /// 读取 `key` 对应的缓存值；缺失、过期或 `force_refresh` 时执行 `compute` 并缓存
    ///
    /// `ttl` 为 `Duration::MAX` 时永不过期。`compute` 只在未命中时被等待。
    async fn get_or_compute<'a>(
        &self,
        key: &str,
        ttl: Duration,
        force_refresh: bool,
        compute: BoxFuture<'a, DomainResult<Value>>,
    ) -> DomainResult<Cached>;
}
