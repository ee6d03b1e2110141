//! 规约（Specification）
//!
//! - `Specification`：可复用、可组合的过滤条件（AND/OR/NOT）；
//! - `QuerySpecification`：面向仓储的完整查询描述（条件、排序、分页与缓存配置）；
//! - `CacheOptions`：直接内嵌在查询规约中的缓存元数据（缓存键、TTL、强制刷新）。
//!
mod cache;
mod query;

pub use cache::CacheOptions;
pub use query::QuerySpecification;

/// 过滤条件
///
/// 组合结果按值持有两侧规约，可继续组合或交给 `QuerySpecification::filter`。
pub trait Specification<T>: Send + Sync {
    fn is_satisfied_by(&self, candidate: &T) -> bool;

    fn and<S>(self, other: S) -> And<Self, S>
    where
        Self: Sized,
        S: Specification<T>,
    {
        And(self, other)
    }

    fn or<S>(self, other: S) -> Or<Self, S>
    where
        Self: Sized,
        S: Specification<T>,
    {
        Or(self, other)
    }

    fn not(self) -> Not<Self>
    where
        Self: Sized,
    {
        Not(self)
    }
}

impl<T> Specification<T> for Box<dyn Specification<T>> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.as_ref().is_satisfied_by(candidate)
    }
}

/// 以闭包表达的规约
pub struct FnSpecification<F>(F);

impl<F> FnSpecification<F> {
    pub fn new(predicate: F) -> Self {
        Self(predicate)
    }
}

impl<T, F> Specification<T> for FnSpecification<F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        (self.0)(candidate)
    }
}

/// 两侧同时满足
pub struct And<A, B>(A, B);

impl<T, A, B> Specification<T> for And<A, B>
where
    A: Specification<T>,
    B: Specification<T>,
{
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.0.is_satisfied_by(candidate) && self.1.is_satisfied_by(candidate)
    }
}

/// 任一侧满足
pub struct Or<A, B>(A, B);

impl<T, A, B> Specification<T> for Or<A, B>
where
    A: Specification<T>,
    B: Specification<T>,
{
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.0.is_satisfied_by(candidate) || self.1.is_satisfied_by(candidate)
    }
}

/// 取反
pub struct Not<A>(A);

impl<T, A> Specification<T> for Not<A>
where
    A: Specification<T>,
{
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        !self.0.is_satisfied_by(candidate)
    }
}
