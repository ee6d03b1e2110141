use super::DomainEvent;
use std::fmt;
use std::sync::Arc;

/// 实体上的待发布领域事件（按产生顺序）
///
/// 不参与持久化（实体字段上应标注 `#[serde(skip)]`），每个保存周期被取空一次。
#[derive(Clone, Default)]
pub struct DomainEvents {
    events: Vec<Arc<dyn DomainEvent>>,
}

impl DomainEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加事件
    pub fn push<E: DomainEvent>(&mut self, event: E) {
        self.events.push(Arc::new(event));
    }

    pub fn push_shared(&mut self, event: Arc<dyn DomainEvent>) {
        self.events.push(event);
    }

    /// 取出全部事件并清空集合
    pub fn drain(&mut self) -> Vec<Arc<dyn DomainEvent>> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn DomainEvent>> {
        self.events.iter()
    }
}

impl fmt::Debug for DomainEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.events.iter().map(|e| e.event_type()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Opened;
    impl DomainEvent for Opened {
        fn event_type(&self) -> &'static str {
            "opened"
        }
    }

    #[derive(Debug)]
    struct Closed;
    impl DomainEvent for Closed {}

    #[test]
    fn drain_preserves_order_and_empties() {
        let mut events = DomainEvents::new();
        events.push(Opened);
        events.push(Closed);
        assert_eq!(events.len(), 2);

        let drained = events.drain();
        assert!(events.is_empty());
        assert_eq!(drained.len(), 2);
        assert!(drained[0].is::<Opened>());
        assert!(drained[1].downcast_ref::<Closed>().is_some());
        assert!(drained[1].downcast_ref::<Opened>().is_none());
        assert_eq!(drained[0].event_type(), "opened");
        assert!(drained[1].event_type().ends_with("Closed"));

        assert!(events.drain().is_empty());
    }

    #[test]
    fn debug_lists_event_types() {
        let mut events = DomainEvents::new();
        events.push(Opened);
        assert_eq!(format!("{events:?}"), "[\"opened\"]");
    }
}
