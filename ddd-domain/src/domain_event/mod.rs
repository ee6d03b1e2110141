//! 领域事件（Domain Event）与实体上的待发布事件集合
//!
//! 定义事件载荷需要实现的最小接口（`DomainEvent`），以及挂载在实体上、
//! 由保存流程一次性取出的有序集合 `DomainEvents`。

mod domain_event_trait;
mod domain_events;

pub use domain_event_trait::{AsAny, DomainEvent};
pub use domain_events::DomainEvents;
