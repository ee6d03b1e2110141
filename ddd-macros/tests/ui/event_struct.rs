use ddd_domain::domain_event::DomainEvent;
use ddd_macros::domain_event;

#[domain_event(name = "bank.opened")]
struct Opened {
    owner: String,
}

#[domain_event]
#[derive(PartialEq)]
struct Closed;

fn main() {
    let opened = Opened { owner: "bob".into() };
    assert_eq!(opened.event_type(), "bank.opened");
    assert_eq!(opened.clone().owner, "bob");
    assert_eq!(Closed.event_type(), "Closed");
    assert_eq!(Closed, Closed);
}
