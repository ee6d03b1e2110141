use chrono::Utc;
use ddd_domain::entity::Entity;
use ddd_domain::repository::Repository;
use ddd_infrastructure::options::InfrastructureOptions;
use demo::domain::{GuestMessage, GuestMessagesCounter};
use demo::specifications::{guest_messages_by_author, guest_messages_on_date, latest_counter};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let options = InfrastructureOptions::from_env();
    info!(?options, "starting guestbook");
    let context = demo::build_context(options, None);
    let mut uow = context.unit_of_work();

    // 留言
    for (message, author) in [
        ("hello", "alice"),
        ("nice place", "bob"),
        ("me again", "alice"),
    ] {
        let saved = uow
            .repository::<GuestMessage>()
            .add(GuestMessage::create(message, author))
            .await?;
        info!(id = %saved.id(), author, "guest message added");
    }

    let by_alice = uow
        .repository::<GuestMessage>()
        .list_by(&guest_messages_by_author("alice"))
        .await?;
    info!(count = by_alice.len(), "messages by alice");

    let today = uow
        .repository::<GuestMessage>()
        .count(&guest_messages_on_date(Utc::now().date_naive()))
        .await?;
    info!(count = today, "messages today");

    let counter = uow
        .repository::<GuestMessagesCounter>()
        .first(&latest_counter())
        .await?;
    info!(count = counter.count, last_entry_by = %counter.last_entry_by, "guestbook counter");

    // 删除第一条留言
    if let Some(first) = by_alice.into_iter().next() {
        let id = *first.id();
        uow.repository::<GuestMessage>().delete(first).await?;
        let gone = uow.repository::<GuestMessage>().get_by_id(&id).await?.is_none();
        info!(%id, gone, "guest message deleted");
    }

    Ok(())
}
