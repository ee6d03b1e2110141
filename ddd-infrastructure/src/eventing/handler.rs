use crate::unit_of_work::UnitOfWork;
use async_trait::async_trait;
use ddd_domain::domain_event::DomainEvent;
use ddd_domain::error::DomainResult;

/// 领域事件处理器
///
/// 在发起保存的同一工作单元（同一事务）内执行；通过 `uow` 进行的读写
/// 与触发事件的写入一同提交或回滚。返回错误会中止后续分发。
#[async_trait]
pub trait DomainEventHandler<E>: Send + Sync
where
    E: DomainEvent,
{
    /// 处理器名称（用于日志）
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    async fn handle(&self, uow: &mut UnitOfWork, event: &E) -> DomainResult<()>;
}
