//! 基础设施层
//!
//! - `database`：存储边界与内存实现（按表存放 JSON 行，支持事务）
//! - `unit_of_work`：持久化上下文与事务性保存编排
//! - `eventing`：领域事件处理器与事件代理
//! - `repository`：基于规约的通用仓储
//! - `caching`：缓存提供者
//! - `options`：基础设施配置
//!
pub mod caching;
pub mod database;
pub mod eventing;
pub mod options;
pub mod repository;
pub mod unit_of_work;

pub use caching::{CachingProvider, CachingProviderStub, MemoryCachingProvider};
pub use database::{Database, InMemoryDatabase};
pub use eventing::{DomainEventBroker, DomainEventHandler};
pub use options::InfrastructureOptions;
pub use repository::GenericRepository;
pub use unit_of_work::{DbContext, UnitOfWork};
