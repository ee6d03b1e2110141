use crate::domain::{GuestMessage, GuestMessageCreated, GuestMessagesCounter};
use crate::specifications::latest_counter;
use async_trait::async_trait;
use ddd_domain::error::DomainResult;
use ddd_domain::repository::Repository;
use ddd_domain::specification::QuerySpecification;
use ddd_infrastructure::{DomainEventHandler, UnitOfWork};
use tracing::debug;

/// 留言创建后维护留言计数
///
/// 已有计数时原地递增；尚无计数时按现有留言数建立初始计数（包含本条留言）。
pub struct GuestMessageCreatedHandler;

#[async_trait]
impl DomainEventHandler<GuestMessageCreated> for GuestMessageCreatedHandler {
    fn name(&self) -> &'static str {
        "GuestMessageCreatedHandler"
    }

    async fn handle(&self, uow: &mut UnitOfWork, event: &GuestMessageCreated) -> DomainResult<()> {
        let existing = uow
            .repository::<GuestMessagesCounter>()
            .first_or_default(&latest_counter())
            .await?;

        match existing {
            Some(mut counter) => {
                counter.record(&event.author);
                debug!(count = counter.count, author = %event.author, "guest message counter incremented");
                uow.repository::<GuestMessagesCounter>().update(counter).await?;
            }
            None => {
                let all = QuerySpecification::<GuestMessage>::new("AllGuestMessages");
                let count = uow.repository::<GuestMessage>().count(&all).await?;
                let count = i64::try_from(count).unwrap_or(i64::MAX);
                debug!(count, author = %event.author, "guest message counter bootstrapped");
                uow.repository::<GuestMessagesCounter>()
                    .add(GuestMessagesCounter::new(count, event.author.clone()))
                    .await?;
            }
        }
        Ok(())
    }
}
