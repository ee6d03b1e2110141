//! 通用仓储（GenericRepository）
//!
//! 借用工作单元完成读写：读取在当前事务内进行，写入暂存后立即触发一次事务性保存。
//! 规约启用缓存时，查询经由工作单元的缓存提供者执行；每次操作记录耗时日志。
//!
use crate::database::{Database, TxId};
use crate::unit_of_work::UnitOfWork;
use async_trait::async_trait;
use ddd_domain::entity::{AggregateRoot, Entity};
use ddd_domain::error::{DomainError, DomainResult};
use ddd_domain::repository::Repository;
use ddd_domain::specification::QuerySpecification;
use futures_core::stream::BoxStream;
use futures_util::stream;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

const PAGE_SIZE: usize = 128;

/// 查询结果的形态，决定缓存键后缀与缓存值的结构
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    List,
    Count,
    First,
    Single,
}

impl Shape {
    fn cache_key(self, key: &str) -> String {
        match self {
            Shape::List => key.to_string(),
            Shape::Count => format!("{key}#count"),
            Shape::First => format!("{key}#first"),
            Shape::Single => format!("{key}#single"),
        }
    }
}

enum Fetched<T> {
    Rows(Vec<T>),
    Count(usize),
}

impl<T> Fetched<T>
where
    T: Serialize + DeserializeOwned,
{
    fn into_value(self) -> DomainResult<Value> {
        match self {
            Fetched::Rows(rows) => Ok(serde_json::to_value(rows)?),
            Fetched::Count(n) => Ok(Value::from(n)),
        }
    }

    fn from_value(shape: Shape, value: Value) -> DomainResult<Self> {
        match shape {
            Shape::Count => value
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .map(Fetched::Count)
                .ok_or_else(|| DomainError::TypeMismatch {
                    expected: "count".to_string(),
                    found: value.to_string(),
                }),
            _ => Ok(Fetched::Rows(serde_json::from_value(value)?)),
        }
    }

    fn into_rows(self) -> Vec<T> {
        match self {
            Fetched::Rows(rows) => rows,
            Fetched::Count(_) => Vec::new(),
        }
    }
}

async fn load_all<T>(db: &dyn Database, tx: Option<TxId>) -> DomainResult<Vec<T>>
where
    T: Entity + DeserializeOwned,
{
    let mut out = Vec::new();
    let mut after = None;
    loop {
        let page = db.scan(tx, T::TABLE, after, PAGE_SIZE).await?;
        after = page.last_position().or(after);
        let exhausted = page.exhausted;
        for (_, row) in page.rows {
            out.push(serde_json::from_value(row)?);
        }
        if exhausted {
            return Ok(out);
        }
    }
}

async fn fetch<T>(
    db: Arc<dyn Database>,
    tx: Option<TxId>,
    spec: &QuerySpecification<T>,
    shape: Shape,
) -> DomainResult<Fetched<T>>
where
    T: Entity + DeserializeOwned,
{
    let all = load_all::<T>(db.as_ref(), tx).await?;
    let fetched = match shape {
        Shape::Count => Fetched::Count(spec.evaluate(all).len()),
        Shape::First => Fetched::Rows(spec.evaluate(all).into_iter().take(1).collect()),
        Shape::List | Shape::Single => Fetched::Rows(spec.evaluate(all)),
    };
    Ok(fetched)
}

/// 面向单一聚合根类型的通用仓储
pub struct GenericRepository<'u, T> {
    uow: &'u mut UnitOfWork,
    _entity: PhantomData<fn() -> T>,
}

impl<'u, T> GenericRepository<'u, T>
where
    T: AggregateRoot + Serialize + DeserializeOwned,
{
    pub(crate) fn new(uow: &'u mut UnitOfWork) -> Self {
        Self {
            uow,
            _entity: PhantomData,
        }
    }

    /// 所属工作单元
    pub fn unit_of_work(&mut self) -> &mut UnitOfWork {
        &mut *self.uow
    }

    // 按规约执行查询；启用缓存且不在事务内时经由缓存提供者，返回结果与是否命中缓存
    async fn query(
        &self,
        spec: &QuerySpecification<T>,
        shape: Shape,
    ) -> DomainResult<(Fetched<T>, bool)> {
        let db = self.uow.database().clone();
        let tx = self.uow.current_transaction();

        // 事务内可能读到未提交的行，不经过缓存
        let Some(key) = spec.cache_key().filter(|_| tx.is_none()) else {
            return Ok((fetch(db, tx, spec, shape).await?, false));
        };

        let compute = Box::pin(async move { fetch(db, tx, spec, shape).await?.into_value() });
        let cached = self
            .uow
            .caching_provider()
            .get_or_compute(
                &shape.cache_key(key),
                spec.cache_ttl(),
                spec.has_forced_cache_refresh(),
                compute,
            )
            .await?;
        Ok((Fetched::from_value(shape, cached.value)?, cached.hit))
    }

    async fn query_rows(
        &self,
        operation: &'static str,
        spec: &QuerySpecification<T>,
        shape: Shape,
    ) -> DomainResult<Vec<T>> {
        let started = Instant::now();
        let (fetched, cached) = self.query(spec, shape).await?;
        log_query(operation, T::TABLE, started, Some(spec.name()), cached);
        Ok(fetched.into_rows())
    }

    fn no_match(spec: &QuerySpecification<T>) -> DomainError {
        DomainError::not_found(format!(
            "no {} matches specification {}",
            T::TABLE,
            spec.name()
        ))
    }

    fn ensure_at_most_one(spec: &QuerySpecification<T>, rows: Vec<T>) -> DomainResult<Option<T>> {
        if rows.len() > 1 {
            return Err(DomainError::MultipleResults {
                entity: format!("{} ({})", T::TABLE, spec.name()),
                found: rows.len(),
            });
        }
        Ok(rows.into_iter().next())
    }

    // 保存后取回本次暂存的最后 `count` 个实体
    async fn save_and_take(&mut self, count: usize) -> DomainResult<Vec<T>> {
        let mut saved = self.uow.save_tracked().await?.into_entities::<T>();
        if saved.len() < count {
            return Err(DomainError::database(format!(
                "expected {count} saved {} entities, found {}",
                T::TABLE,
                saved.len()
            )));
        }
        Ok(saved.split_off(saved.len() - count))
    }
}

fn log_query(
    operation: &'static str,
    entity: &'static str,
    started: Instant,
    specification: Option<&str>,
    cached: bool,
) {
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    match specification {
        Some(specification) => info!(
            operation,
            entity,
            elapsed_ms,
            specification,
            cached,
            "repository query executed"
        ),
        None => info!(operation, entity, elapsed_ms, "repository query executed"),
    }
}

fn log_write(operation: &'static str, entity: &'static str, started: Instant, count: usize) {
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(operation, entity, elapsed_ms, count, "repository changes saved");
}

#[async_trait]
impl<'u, T> Repository<T> for GenericRepository<'u, T>
where
    T: AggregateRoot + Serialize + DeserializeOwned,
{
    async fn get_by_id(&mut self, id: &T::Id) -> DomainResult<Option<T>> {
        let started = Instant::now();
        let row = self
            .uow
            .database()
            .get(self.uow.current_transaction(), T::TABLE, &id.to_string())
            .await?;
        let entity = row.map(serde_json::from_value::<T>).transpose()?;
        log_query("get_by_id", T::TABLE, started, None, false);
        Ok(entity)
    }

    async fn list(&mut self) -> DomainResult<Vec<T>> {
        let started = Instant::now();
        let all = load_all::<T>(self.uow.database().as_ref(), self.uow.current_transaction()).await?;
        log_query("list", T::TABLE, started, None, false);
        Ok(all)
    }

    async fn list_by(&mut self, spec: &QuerySpecification<T>) -> DomainResult<Vec<T>> {
        self.query_rows("list_by", spec, Shape::List).await
    }

    fn enumerate<'a>(
        &'a mut self,
        spec: &'a QuerySpecification<T>,
    ) -> DomainResult<BoxStream<'a, DomainResult<T>>> {
        if spec.cache_enabled() {
            return Err(DomainError::configuration(format!(
                "enumerate does not support cached specifications (specification {})",
                spec.name()
            )));
        }
        let cursor = Cursor::new(
            self.uow.database().clone(),
            self.uow.current_transaction(),
            spec,
        );
        Ok(Box::pin(cursor.into_stream()))
    }

    async fn count(&mut self, spec: &QuerySpecification<T>) -> DomainResult<usize> {
        let started = Instant::now();
        let (fetched, cached) = self.query(spec, Shape::Count).await?;
        log_query("count", T::TABLE, started, Some(spec.name()), cached);
        match fetched {
            Fetched::Count(n) => Ok(n),
            Fetched::Rows(rows) => Ok(rows.len()),
        }
    }

    async fn first(&mut self, spec: &QuerySpecification<T>) -> DomainResult<T> {
        self.first_or_default(spec)
            .await?
            .ok_or_else(|| Self::no_match(spec))
    }

    async fn first_or_default(&mut self, spec: &QuerySpecification<T>) -> DomainResult<Option<T>> {
        let rows = self.query_rows("first", spec, Shape::First).await?;
        Ok(rows.into_iter().next())
    }

    async fn single(&mut self, spec: &QuerySpecification<T>) -> DomainResult<T> {
        self.single_or_default(spec)
            .await?
            .ok_or_else(|| Self::no_match(spec))
    }

    async fn single_or_default(
        &mut self,
        spec: &QuerySpecification<T>,
    ) -> DomainResult<Option<T>> {
        let rows = self.query_rows("single", spec, Shape::Single).await?;
        Self::ensure_at_most_one(spec, rows)
    }

    async fn add(&mut self, entity: T) -> DomainResult<T> {
        let mut saved = self.add_range(vec![entity]).await?;
        saved
            .pop()
            .ok_or_else(|| DomainError::database(format!("added {} entity missing", T::TABLE)))
    }

    async fn add_range(&mut self, entities: Vec<T>) -> DomainResult<Vec<T>> {
        let started = Instant::now();
        let count = entities.len();
        for entity in entities {
            self.uow.track_added(entity);
        }
        let saved = self.save_and_take(count).await?;
        log_write("add", T::TABLE, started, count);
        Ok(saved)
    }

    async fn update(&mut self, entity: T) -> DomainResult<T> {
        let mut saved = self.update_range(vec![entity]).await?;
        saved
            .pop()
            .ok_or_else(|| DomainError::database(format!("updated {} entity missing", T::TABLE)))
    }

    async fn update_range(&mut self, entities: Vec<T>) -> DomainResult<Vec<T>> {
        let started = Instant::now();
        let count = entities.len();
        for entity in entities {
            self.uow.track_modified(entity);
        }
        let saved = self.save_and_take(count).await?;
        log_write("update", T::TABLE, started, count);
        Ok(saved)
    }

    async fn delete(&mut self, entity: T) -> DomainResult<()> {
        self.delete_range(vec![entity]).await
    }

    async fn delete_range(&mut self, entities: Vec<T>) -> DomainResult<()> {
        let started = Instant::now();
        let count = entities.len();
        for entity in entities {
            self.uow.track_deleted(entity);
        }
        self.save_and_take(count).await?;
        log_write("delete", T::TABLE, started, count);
        Ok(())
    }
}

/// 惰性枚举游标
///
/// 无排序时按存储顺序分页读取并逐页过滤，分页条件在产出时应用；
/// 有排序时首次拉取即读取全部并按规约求值。流耗尽时记录整次枚举的耗时。
struct Cursor<'a, T> {
    started: Instant,
    db: Arc<dyn Database>,
    tx: Option<TxId>,
    spec: &'a QuerySpecification<T>,
    after: Option<u64>,
    buffer: VecDeque<T>,
    exhausted: bool,
    skipped: usize,
    yielded: usize,
}

impl<'a, T> Cursor<'a, T>
where
    T: Entity + DeserializeOwned,
{
    fn new(db: Arc<dyn Database>, tx: Option<TxId>, spec: &'a QuerySpecification<T>) -> Self {
        Self {
            started: Instant::now(),
            db,
            tx,
            spec,
            after: None,
            buffer: VecDeque::new(),
            exhausted: false,
            skipped: 0,
            yielded: 0,
        }
    }

    fn into_stream(self) -> impl futures_core::Stream<Item = DomainResult<T>> + Send + 'a {
        stream::unfold(Some(self), |cursor| async move {
            let mut cursor = cursor?;
            match cursor.next().await {
                Ok(Some(item)) => Some((Ok(item), Some(cursor))),
                Ok(None) => {
                    log_query(
                        "enumerate",
                        T::TABLE,
                        cursor.started,
                        Some(cursor.spec.name()),
                        false,
                    );
                    None
                }
                Err(err) => Some((Err(err), None)),
            }
        })
    }

    async fn next(&mut self) -> DomainResult<Option<T>> {
        let ordered = self.spec.has_ordering();
        loop {
            if self.spec.take_count().is_some_and(|take| self.yielded >= take) {
                return Ok(None);
            }
            if let Some(item) = self.buffer.pop_front() {
                // 有排序时缓冲区已按规约完成分页
                if !ordered && self.skipped < self.spec.skip_count().unwrap_or(0) {
                    self.skipped += 1;
                    continue;
                }
                self.yielded += 1;
                return Ok(Some(item));
            }
            if self.exhausted {
                return Ok(None);
            }
            if ordered {
                self.load_ordered().await?;
            } else {
                self.load_page().await?;
            }
        }
    }

    async fn load_page(&mut self) -> DomainResult<()> {
        let page = self
            .db
            .scan(self.tx, T::TABLE, self.after, PAGE_SIZE)
            .await?;
        self.after = page.last_position().or(self.after);
        self.exhausted = page.exhausted;
        for (_, row) in page.rows {
            let entity: T = serde_json::from_value(row)?;
            if self.spec.is_satisfied_by(&entity) {
                self.buffer.push_back(entity);
            }
        }
        Ok(())
    }

    async fn load_ordered(&mut self) -> DomainResult<()> {
        let all = load_all::<T>(self.db.as_ref(), self.tx).await?;
        self.buffer = self.spec.evaluate(all).into();
        self.exhausted = true;
        Ok(())
    }
}
