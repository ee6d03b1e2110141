use chrono::{TimeZone, Utc};
use ddd_domain::domain_event::DomainEvent;
use ddd_domain::entity::{Audit, Entity};
use ddd_macros::{domain_event, entity};
use uuid::Uuid;

#[domain_event(name = "note.written")]
struct NoteWritten {
    text: String,
}

#[entity(id = Uuid, table = "notes")]
struct Note {
    text: String,
}

#[test]
fn injected_fields_come_first_and_audit_is_flattened() {
    let mut note = Note {
        text: "hello".into(),
        audit: Audit::by("alice"),
        ..Default::default()
    };
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    note.audit_mut().mark_created(at);

    let row = serde_json::to_value(&note).unwrap();
    let keys: Vec<&str> = row
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert!(keys.contains(&"id"));
    assert!(keys.contains(&"created_by"));
    assert!(keys.contains(&"creation_date"));
    assert!(!keys.contains(&"audit"));
    assert!(!keys.contains(&"events"));

    let back: Note = serde_json::from_value(row).unwrap();
    assert_eq!(back.text, "hello");
    assert_eq!(back.audit().created_by(), "alice");
    assert_eq!(back.audit().creation_date(), at);
    assert!(back.id().is_nil());
}

#[test]
fn events_are_carried_but_not_cloned_into_rows() {
    let mut note = Note::default();
    note.events_mut().push(NoteWritten { text: "hi".into() });
    assert_eq!(note.events().len(), 1);

    let drained = note.domain_events_mut().unwrap().drain();
    assert_eq!(drained.len(), 1);
    assert_eq!(drained[0].event_type(), "note.written");
    assert_eq!(
        drained[0].downcast_ref::<NoteWritten>().map(|e| e.text.as_str()),
        Some("hi")
    );
    assert!(note.events().is_empty());
    assert_eq!(Note::TABLE, "notes");
}
