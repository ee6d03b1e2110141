//! 工作单元（UnitOfWork）与事务性保存
//!
//! `save_changes` 的执行顺序：
//! 1. 为新增实体分配标识并写入创建/修改时间，为修改实体写入修改时间（同一次保存共用一个时刻）；
//! 2. 按发现顺序取空所有跟踪实体上的领域事件；
//! 3. 事件非空且当前无事务时开启事务，并记录由本次保存持有；
//! 4. 以一个批次写入存储，得到受影响行数；
//! 5. 通过事件代理发布事件，处理器在同一工作单元（同一事务）内读写；
//! 6. 仅当事务由本次保存持有时提交。
//!
//! 第 4、5 步失败时不提交：本次持有的事务被回滚，外部开启的事务交由开启者处理。
//! 已取出但未发布的事件随之丢弃。
//!
mod context;
mod tracked;

pub use context::DbContext;
pub use tracked::EntryState;

use crate::caching::CachingProvider;
use crate::database::{Database, Transaction, TxId, Write};
use crate::repository::GenericRepository;
use ddd_domain::domain_event::DomainEvent;
use ddd_domain::entity::{AggregateRoot, Entity};
use ddd_domain::error::{DomainError, DomainResult};
use futures_util::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracked::{Entry, TrackedEntry};

/// 一次保存的结果：受影响行数与已保存的条目（按跟踪顺序）
pub(crate) struct Saved {
    pub(crate) affected: usize,
    entries: Vec<Box<dyn TrackedEntry>>,
}

impl Saved {
    /// 取出类型为 `T` 的已保存实体
    pub(crate) fn into_entities<T: Entity>(self) -> Vec<T> {
        self.entries
            .into_iter()
            .filter_map(|entry| entry.into_any().downcast::<Entry<T>>().ok())
            .map(|entry| entry.entity)
            .collect()
    }
}

/// 工作单元
///
/// 面向单个逻辑操作，不可并发使用。持有待保存实体、当前事务、取消令牌与缓存提供者；
/// 释放时未提交的事务自动回滚。
pub struct UnitOfWork {
    context: DbContext,
    tracked: Vec<Box<dyn TrackedEntry>>,
    transaction: Option<Transaction>,
    cancellation: CancellationToken,
    cache: Arc<dyn CachingProvider>,
}

impl UnitOfWork {
    pub(crate) fn new(
        context: DbContext,
        cache: Arc<dyn CachingProvider>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            context,
            tracked: Vec::new(),
            transaction: None,
            cancellation,
            cache,
        }
    }

    pub fn context(&self) -> &DbContext {
        &self.context
    }

    pub fn database(&self) -> &Arc<dyn Database> {
        self.context.database()
    }

    pub fn caching_provider(&self) -> &Arc<dyn CachingProvider> {
        &self.cache
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// 当前事务；读写都在其中进行
    pub fn current_transaction(&self) -> Option<TxId> {
        self.transaction.as_ref().map(Transaction::id)
    }

    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// 显式开启事务，由调用方负责提交或回滚
    pub async fn begin_transaction(&mut self) -> DomainResult<TxId> {
        if let Some(tx) = self.current_transaction() {
            return Err(DomainError::transaction(format!(
                "{tx} is already open in this unit of work"
            )));
        }
        let tx = Transaction::begin(self.context.database().clone()).await?;
        let id = tx.id();
        self.transaction = Some(tx);
        debug!(tx = %id, "ambient transaction begun");
        Ok(id)
    }

    pub async fn commit(&mut self) -> DomainResult<()> {
        let tx = self
            .transaction
            .take()
            .ok_or_else(|| DomainError::transaction("no open transaction to commit"))?;
        let id = tx.id();
        tx.commit().await?;
        debug!(tx = %id, "ambient transaction committed");
        Ok(())
    }

    pub fn rollback(&mut self) {
        if let Some(tx) = self.transaction.take() {
            debug!(tx = %tx.id(), "ambient transaction rolled back");
            tx.rollback();
        }
    }

    pub fn track_added<T>(&mut self, entity: T)
    where
        T: Entity + Serialize,
    {
        self.track(EntryState::Added, entity);
    }

    pub fn track_modified<T>(&mut self, entity: T)
    where
        T: Entity + Serialize,
    {
        self.track(EntryState::Modified, entity);
    }

    pub fn track_deleted<T>(&mut self, entity: T)
    where
        T: Entity + Serialize,
    {
        self.track(EntryState::Deleted, entity);
    }

    fn track<T>(&mut self, state: EntryState, entity: T)
    where
        T: Entity + Serialize,
    {
        self.tracked.push(Box::new(Entry { state, entity }));
    }

    /// 是否存在待保存的实体
    pub fn has_changes(&self) -> bool {
        !self.tracked.is_empty()
    }

    /// 保存全部跟踪实体并发布其领域事件，返回受影响行数
    pub async fn save_changes(&mut self) -> DomainResult<usize> {
        self.save_tracked().await.map(|saved| saved.affected)
    }

    /// 面向聚合根 `T` 的仓储
    pub fn repository<T>(&mut self) -> GenericRepository<'_, T>
    where
        T: AggregateRoot + Serialize + DeserializeOwned,
    {
        GenericRepository::new(self)
    }

    // 处理器可能经由仓储再次进入保存流程，返回装箱的 future 以切断递归类型
    pub(crate) fn save_tracked(&mut self) -> BoxFuture<'_, DomainResult<Saved>> {
        Box::pin(async move {
            if self.cancellation.is_cancelled() {
                return Err(DomainError::Cancelled);
            }

            let mut entries = std::mem::take(&mut self.tracked);
            if entries.is_empty() {
                return Ok(Saved {
                    affected: 0,
                    entries,
                });
            }

            let now = self.context.clock().now();
            let db = self.context.database().clone();
            for entry in entries.iter_mut() {
                entry.prepare(db.as_ref(), now);
            }

            let events: Vec<Arc<dyn DomainEvent>> = entries
                .iter_mut()
                .flat_map(|entry| entry.take_events())
                .collect();
            let writes = entries
                .iter()
                .map(|entry| entry.to_write())
                .collect::<DomainResult<Vec<_>>>()?;
            debug!(
                entries = entries.len(),
                events = events.len(),
                "saving tracked entities"
            );

            let owned = !events.is_empty() && self.transaction.is_none();
            if owned {
                let tx = Transaction::begin(db).await?;
                debug!(tx = %tx.id(), "transaction begun for domain events");
                self.transaction = Some(tx);
            }

            match self.write_and_publish(writes, &events).await {
                Ok(affected) => {
                    if owned {
                        if let Some(tx) = self.transaction.take() {
                            let id = tx.id();
                            tx.commit().await?;
                            debug!(tx = %id, affected, "transaction committed");
                        }
                    }
                    Ok(Saved { affected, entries })
                }
                Err(err) => {
                    if owned {
                        if let Some(tx) = self.transaction.take() {
                            debug!(tx = %tx.id(), error = %err, "transaction rolled back");
                            tx.rollback();
                        }
                    }
                    Err(err)
                }
            }
        })
    }

    async fn write_and_publish(
        &mut self,
        writes: Vec<Write>,
        events: &[Arc<dyn DomainEvent>],
    ) -> DomainResult<usize> {
        let tables: Vec<&'static str> = writes.iter().map(Write::table).collect();
        let affected = self
            .context
            .database()
            .apply(self.current_transaction(), writes)
            .await?;
        debug!(?tables, affected, "changes written");

        if !events.is_empty() {
            let broker = self.context.broker().clone();
            broker.publish_events(self, events).await?;
        }
        Ok(affected)
    }
}

impl fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("tracked", &self.tracked.len())
            .field("transaction", &self.current_transaction())
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish()
    }
}
