#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use ddd_domain::clock::FixedClock;
use ddd_domain::entity::{AggregateRoot, Audit};
use ddd_domain::error::{DomainError, DomainResult};
use ddd_domain::repository::Repository;
use ddd_infrastructure::options::InfrastructureOptions;
use ddd_infrastructure::{DbContext, DomainEventBroker, DomainEventHandler, InMemoryDatabase, UnitOfWork};
use ddd_macros::{domain_event, entity};
use parking_lot::Mutex;
use std::sync::Arc;

#[entity(id = i64, table = "notes")]
pub struct Note {
    pub text: String,
    pub author: String,
}

impl AggregateRoot for Note {}

impl Note {
    /// 带事件的新便签
    pub fn write(text: &str, author: &str) -> Self {
        let mut note = Self::quiet(text, author);
        note.events.push(NoteWritten {
            text: text.to_string(),
            author: author.to_string(),
        });
        note
    }

    /// 不带事件的新便签
    pub fn quiet(text: &str, author: &str) -> Self {
        Self {
            text: text.to_string(),
            author: author.to_string(),
            audit: Audit::by(author),
            ..Default::default()
        }
    }
}

#[entity(id = i64, table = "audit_log", events = false)]
pub struct AuditLog {
    pub line: String,
}

impl AggregateRoot for AuditLog {}

impl AuditLog {
    pub fn new(line: String) -> Self {
        Self {
            line,
            ..Default::default()
        }
    }
}

#[domain_event(name = "note.written")]
pub struct NoteWritten {
    pub text: String,
    pub author: String,
}

#[domain_event(name = "note.archived")]
pub struct NoteArchived {
    pub text: String,
}

pub type Journal = Arc<Mutex<Vec<String>>>;

/// 记录收到的事件
pub struct Recorder {
    pub label: &'static str,
    pub journal: Journal,
}

#[async_trait]
impl DomainEventHandler<NoteWritten> for Recorder {
    async fn handle(&self, _uow: &mut UnitOfWork, event: &NoteWritten) -> DomainResult<()> {
        self.journal.lock().push(format!("{}:{}", self.label, event.text));
        Ok(())
    }
}

/// 在同一工作单元内写入审计日志
pub struct AuditWriter;

#[async_trait]
impl DomainEventHandler<NoteWritten> for AuditWriter {
    async fn handle(&self, uow: &mut UnitOfWork, event: &NoteWritten) -> DomainResult<()> {
        uow.repository::<AuditLog>()
            .add(AuditLog::new(format!("{} wrote {}", event.author, event.text)))
            .await?;
        Ok(())
    }
}

pub struct Failing;

#[async_trait]
impl DomainEventHandler<NoteWritten> for Failing {
    async fn handle(&self, _uow: &mut UnitOfWork, _event: &NoteWritten) -> DomainResult<()> {
        Err(DomainError::event_handler("Failing", "boom"))
    }
}

#[async_trait]
impl DomainEventHandler<NoteArchived> for Failing {
    async fn handle(&self, _uow: &mut UnitOfWork, _event: &NoteArchived) -> DomainResult<()> {
        Err(DomainError::event_handler("Failing", "boom"))
    }
}

/// 为每条新便签写入一条带 `NoteArchived` 事件的归档便签
pub struct Archiver;

#[async_trait]
impl DomainEventHandler<NoteWritten> for Archiver {
    async fn handle(&self, uow: &mut UnitOfWork, event: &NoteWritten) -> DomainResult<()> {
        let text = format!("archived: {}", event.text);
        let mut archived = Note::quiet(&text, "archiver");
        archived.events.push(NoteArchived { text });
        uow.repository::<Note>().add(archived).await?;
        Ok(())
    }
}

/// 为归档事件写入审计日志
pub struct ArchiveAuditor;

#[async_trait]
impl DomainEventHandler<NoteArchived> for ArchiveAuditor {
    async fn handle(&self, uow: &mut UnitOfWork, event: &NoteArchived) -> DomainResult<()> {
        uow.repository::<AuditLog>()
            .add(AuditLog::new(event.text.clone()))
            .await?;
        Ok(())
    }
}

/// 取消所在工作单元
pub struct Canceller;

#[async_trait]
impl DomainEventHandler<NoteWritten> for Canceller {
    async fn handle(&self, uow: &mut UnitOfWork, _event: &NoteWritten) -> DomainResult<()> {
        uow.cancellation_token().cancel();
        Ok(())
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 18, 14, 22, 20).unwrap()
}

pub struct Fixture {
    pub db: Arc<InMemoryDatabase>,
    pub broker: Arc<DomainEventBroker>,
    pub clock: Arc<FixedClock>,
    pub context: DbContext,
}

impl Fixture {
    pub fn new(configure: impl FnOnce(&DomainEventBroker)) -> Self {
        Self::with_options(InfrastructureOptions::default(), configure)
    }

    pub fn with_options(
        options: InfrastructureOptions,
        configure: impl FnOnce(&DomainEventBroker),
    ) -> Self {
        let db = Arc::new(InMemoryDatabase::new());
        let broker = Arc::new(DomainEventBroker::new());
        configure(&broker);
        let clock = Arc::new(FixedClock::new(start_time()));
        let context = DbContext::builder()
            .database(db.clone())
            .broker(broker.clone())
            .options(options)
            .clock(clock.clone())
            .build();
        Self {
            db,
            broker,
            clock,
            context,
        }
    }

    pub fn uow(&self) -> UnitOfWork {
        self.context.unit_of_work()
    }
}

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}
