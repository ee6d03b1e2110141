//! 仓储（Repository）协议
//!
//! 面向单一聚合根类型的统一读写接口：
//! - 按主键读取、全量列举与基于规约的查询（可选缓存）；
//! - 惰性枚举（不支持缓存）；
//! - 新增/修改/删除及其批量版本，每次调用都会触发一次事务性保存。
//!
use crate::entity::AggregateRoot;
use crate::error::DomainResult;
use crate::specification::QuerySpecification;
use async_trait::async_trait;
use futures_core::stream::BoxStream;

#[async_trait]
pub trait Repository<T>: Send
where
    T: AggregateRoot,
{
    /// 按主键查找，不存在时返回 `None`；不经过缓存
    async fn get_by_id(&mut self, id: &T::Id) -> DomainResult<Option<T>>;

    /// 列举全部实体；不经过缓存
    async fn list(&mut self) -> DomainResult<Vec<T>>;

    /// 按规约列举
    async fn list_by(&mut self, spec: &QuerySpecification<T>) -> DomainResult<Vec<T>>;

    /// 以惰性流的形式按规约枚举
    ///
    /// 规约启用缓存时立即返回配置错误，不会访问存储。
    fn enumerate<'a>(
        &'a mut self,
        spec: &'a QuerySpecification<T>,
    ) -> DomainResult<BoxStream<'a, DomainResult<T>>>;

    /// 满足规约的数量（应用过滤与分页）
    async fn count(&mut self, spec: &QuerySpecification<T>) -> DomainResult<usize>;

    /// 第一个匹配项，不存在时返回 `NotFound`
    async fn first(&mut self, spec: &QuerySpecification<T>) -> DomainResult<T>;

    async fn first_or_default(&mut self, spec: &QuerySpecification<T>) -> DomainResult<Option<T>>;

    /// 唯一匹配项；不存在时返回 `NotFound`，多于一个时返回 `MultipleResults`
    async fn single(&mut self, spec: &QuerySpecification<T>) -> DomainResult<T>;

    /// 唯一匹配项；多于一个时返回 `MultipleResults`
    async fn single_or_default(&mut self, spec: &QuerySpecification<T>)
    -> DomainResult<Option<T>>;

    /// 新增并保存，返回填充了标识与审计信息的实体
    async fn add(&mut self, entity: T) -> DomainResult<T>;

    async fn add_range(&mut self, entities: Vec<T>) -> DomainResult<Vec<T>>;

    /// 修改并保存，返回刷新了修改时间的实体
    async fn update(&mut self, entity: T) -> DomainResult<T>;

    async fn update_range(&mut self, entities: Vec<T>) -> DomainResult<Vec<T>>;

    /// 删除并保存
    async fn delete(&mut self, entity: T) -> DomainResult<()>;

    async fn delete_range(&mut self, entities: Vec<T>) -> DomainResult<()>;
}
