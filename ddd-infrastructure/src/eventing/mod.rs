//! 领域事件分发
//!
mod broker;
mod handler;

pub use broker::DomainEventBroker;
pub use handler::DomainEventHandler;
