use ddd_domain::domain_event::DomainEvent;
use ddd_macros::domain_event;

#[domain_event]
enum BankEvent {
    #[event(name = "bank.renamed")]
    Renamed { to: String },
    Deposited(u64),
    Frozen,
}

fn main() {
    assert_eq!(BankEvent::Renamed { to: "x".into() }.event_type(), "bank.renamed");
    assert_eq!(BankEvent::Deposited(5).event_type(), "BankEvent.Deposited");
    assert_eq!(BankEvent::Frozen.event_type(), "BankEvent.Frozen");
}
