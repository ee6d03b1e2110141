use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use ddd_domain::clock::{Clock, FixedClock};
use ddd_domain::entity::Entity;
use ddd_domain::error::{DomainError, DomainResult};
use ddd_domain::repository::Repository;
use ddd_infrastructure::options::InfrastructureOptions;
use ddd_infrastructure::{DbContext, DomainEventBroker, DomainEventHandler, InMemoryDatabase, UnitOfWork};
use demo::domain::{GuestMessage, GuestMessageCreated, GuestMessagesCounter};
use demo::specifications::{guest_messages_by_author, guest_messages_on_date, latest_counter};
use std::sync::Arc;

fn context_at(clock: Arc<FixedClock>) -> DbContext {
    let clock: Arc<dyn Clock> = clock;
    demo::build_context(InfrastructureOptions::default(), Some(clock))
}

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 3, 18, 14, 22, 20).unwrap(),
    ))
}

async fn counter(uow: &mut UnitOfWork) -> GuestMessagesCounter {
    uow.repository::<GuestMessagesCounter>()
        .single(&latest_counter())
        .await
        .unwrap()
}

#[tokio::test]
async fn adding_a_message_populates_it_and_starts_the_counter() {
    let clock = clock();
    let context = context_at(clock.clone());
    let mut uow = context.unit_of_work();

    let saved = uow
        .repository::<GuestMessage>()
        .add(GuestMessage::create("hello", "alice"))
        .await
        .unwrap();

    assert!(!saved.id().is_nil());
    assert_eq!(saved.audit().creation_date(), clock.now());
    assert_eq!(saved.audit().last_modified_date(), saved.audit().creation_date());
    assert_eq!(saved.author(), "alice");

    let counter = counter(&mut uow).await;
    assert_eq!(counter.count, 1);
    assert_eq!(counter.last_entry_by, "alice");
}

#[tokio::test]
async fn counter_tracks_the_latest_author() {
    let context = context_at(clock());
    let mut uow = context.unit_of_work();
    let mut repo = uow.repository::<GuestMessage>();
    repo.add(GuestMessage::create("hello", "alice")).await.unwrap();
    repo.add(GuestMessage::create("hi there", "bob")).await.unwrap();

    let counter = counter(&mut uow).await;
    assert_eq!(counter.count, 2);
    assert_eq!(counter.last_entry_by, "bob");
    assert_eq!(
        uow.repository::<GuestMessagesCounter>().list().await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn counter_bootstraps_from_existing_messages() {
    let context = context_at(clock());
    let mut uow = context.unit_of_work();

    // 直接写入的留言不带事件
    let mut quiet = GuestMessage::create("old", "carol");
    quiet.events_mut().drain();
    uow.repository::<GuestMessage>().add(quiet).await.unwrap();
    assert!(uow
        .repository::<GuestMessagesCounter>()
        .list()
        .await
        .unwrap()
        .is_empty());

    uow.repository::<GuestMessage>()
        .add(GuestMessage::create("new", "dave"))
        .await
        .unwrap();
    let counter = counter(&mut uow).await;
    assert_eq!(counter.count, 2);
    assert_eq!(counter.last_entry_by, "dave");
}

#[tokio::test]
async fn deleted_message_is_gone() {
    let context = context_at(clock());
    let mut uow = context.unit_of_work();
    let mut repo = uow.repository::<GuestMessage>();
    let saved = repo.add(GuestMessage::create("bye", "alice")).await.unwrap();
    let id = *saved.id();

    repo.delete(saved).await.unwrap();
    assert!(repo.get_by_id(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn queries_by_author_and_date() {
    let clock = clock();
    let context = context_at(clock.clone());
    let mut uow = context.unit_of_work();
    let mut repo = uow.repository::<GuestMessage>();
    repo.add(GuestMessage::create("first", "alice")).await.unwrap();
    clock.advance(chrono::Duration::days(1));
    repo.add(GuestMessage::create("second", "bob")).await.unwrap();
    repo.add(GuestMessage::create("third", "alice")).await.unwrap();

    let by_alice = repo.list_by(&guest_messages_by_author("alice")).await.unwrap();
    let texts: Vec<_> = by_alice.iter().map(|m| m.message.as_str()).collect();
    assert_eq!(texts, vec!["first", "third"]);

    let day_two = chrono::NaiveDate::from_ymd_opt(2024, 3, 19).unwrap();
    assert_eq!(repo.count(&guest_messages_on_date(day_two)).await.unwrap(), 2);
}

struct Rejecting;

#[async_trait]
impl DomainEventHandler<GuestMessageCreated> for Rejecting {
    async fn handle(&self, _uow: &mut UnitOfWork, event: &GuestMessageCreated) -> DomainResult<()> {
        Err(DomainError::event_handler(
            "Rejecting",
            format!("message from {} rejected", event.author),
        ))
    }
}

#[tokio::test]
async fn failing_handler_keeps_the_message_out() {
    let broker = DomainEventBroker::new();
    demo::register_handlers(&broker);
    broker.register::<GuestMessageCreated, _>(Arc::new(Rejecting));
    let db = Arc::new(InMemoryDatabase::new());
    let context = DbContext::builder()
        .database(db.clone())
        .broker(Arc::new(broker))
        .build();
    let mut uow = context.unit_of_work();

    let result = uow
        .repository::<GuestMessage>()
        .add(GuestMessage::create("spam", "mallory"))
        .await;

    assert!(matches!(result, Err(DomainError::EventHandler { .. })));
    assert_eq!(db.committed_rows("guest_messages"), 0);
    assert_eq!(db.committed_rows("guest_messages_counter"), 0);
    assert!(uow.repository::<GuestMessage>().list().await.unwrap().is_empty());
}
