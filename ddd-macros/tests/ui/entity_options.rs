use ddd_domain::entity::Entity;
use ddd_macros::entity;

#[entity(id = i64, table = "ledger_lines", events = false, debug = false)]
#[derive(PartialEq)]
struct LedgerLine {
    amount: i64,
}

impl std::fmt::Debug for LedgerLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedgerLine({})", self.amount)
    }
}

fn main() {
    let mut line = LedgerLine::default();
    assert_eq!(*line.id(), 0);
    assert_eq!(LedgerLine::TABLE, "ledger_lines");
    assert!(line.domain_events_mut().is_none());
    assert_eq!(format!("{line:?}"), "LedgerLine(0)");
}
