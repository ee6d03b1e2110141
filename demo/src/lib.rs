//! 留言簿示例
//!
//! 留言（`GuestMessage`）在创建时产生 `GuestMessageCreated` 事件，
//! 事件处理器在同一事务内维护留言计数（`GuestMessagesCounter`）。
//!
pub mod domain;
pub mod handlers;
pub mod specifications;

use ddd_domain::clock::Clock;
use ddd_infrastructure::options::InfrastructureOptions;
use ddd_infrastructure::{DbContext, DomainEventBroker, InMemoryDatabase};
use std::sync::Arc;

/// 注册留言簿的全部事件处理器
pub fn register_handlers(broker: &DomainEventBroker) {
    broker.register::<domain::GuestMessageCreated, _>(Arc::new(
        handlers::GuestMessageCreatedHandler,
    ));
}

/// 组装基于内存存储的持久化上下文
pub fn build_context(options: InfrastructureOptions, clock: Option<Arc<dyn Clock>>) -> DbContext {
    let broker = DomainEventBroker::new();
    register_handlers(&broker);
    DbContext::builder()
        .database(Arc::new(InMemoryDatabase::new()))
        .broker(Arc::new(broker))
        .options(options)
        .maybe_clock(clock)
        .build()
}
