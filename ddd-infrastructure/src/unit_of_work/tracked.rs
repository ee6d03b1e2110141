use crate::database::{Database, Write};
use chrono::{DateTime, Utc};
use ddd_domain::domain_event::DomainEvent;
use ddd_domain::entity::{Entity, Identity};
use ddd_domain::error::DomainResult;
use serde::Serialize;
use std::any::Any;
use std::sync::Arc;

/// 跟踪条目的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Added,
    Modified,
    Deleted,
}

// 工作单元内以类型擦除方式持有的待保存实体
pub(crate) trait TrackedEntry: Send + Sync {
    /// 保存前处理：为新增实体分配标识并写入审计时间
    fn prepare(&mut self, db: &dyn Database, now: DateTime<Utc>);

    fn take_events(&mut self) -> Vec<Arc<dyn DomainEvent>>;

    fn to_write(&self) -> DomainResult<Write>;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

pub(crate) struct Entry<T> {
    pub(crate) state: EntryState,
    pub(crate) entity: T,
}

impl<T> TrackedEntry for Entry<T>
where
    T: Entity + Serialize,
{
    fn prepare(&mut self, db: &dyn Database, now: DateTime<Utc>) {
        match self.state {
            EntryState::Added => {
                if self.entity.id().is_unset() {
                    let id = T::Id::generate(db.next_identity(T::TABLE));
                    self.entity.set_id(id);
                }
                self.entity.audit_mut().mark_created(now);
            }
            EntryState::Modified => self.entity.audit_mut().mark_modified(now),
            EntryState::Deleted => {}
        }
    }

    fn take_events(&mut self) -> Vec<Arc<dyn DomainEvent>> {
        self.entity
            .domain_events_mut()
            .map(|events| events.drain())
            .unwrap_or_default()
    }

    fn to_write(&self) -> DomainResult<Write> {
        let table = T::TABLE;
        let key = self.entity.id().to_string();
        let write = match self.state {
            EntryState::Added => Write::Insert {
                table,
                key,
                row: serde_json::to_value(&self.entity)?,
            },
            EntryState::Modified => Write::Update {
                table,
                key,
                row: serde_json::to_value(&self.entity)?,
            },
            EntryState::Deleted => Write::Delete { table, key },
        };
        Ok(write)
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}
