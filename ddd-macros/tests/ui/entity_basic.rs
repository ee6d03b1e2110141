use ddd_domain::entity::{AggregateRoot, Entity};
use ddd_macros::entity;

#[entity]
struct Account {
    name: String,
}

impl AggregateRoot for Account {}

fn main() {
    let mut account = Account {
        name: "alice".into(),
        ..Default::default()
    };
    account.set_id("a-1".to_string());
    assert_eq!(account.id(), "a-1");
    assert_eq!(Account::TABLE, "account");
    assert!(account.domain_events_mut().is_some());
    assert!(account.events().is_empty());
}
