use super::{CacheOptions, FnSpecification, Specification};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::time::Duration;

type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// 面向仓储的查询规约
///
/// 描述一次查询的过滤条件、排序、分页与缓存策略。仓储据此选择直接访问存储
/// 或经由缓存提供者读取。
///
/// ```
/// use ddd_domain::specification::QuerySpecification;
/// use std::time::Duration;
///
/// let spec = QuerySpecification::<i32>::new("EvenNumbers")
///     .filter_by(|n| n % 2 == 0)
///     .order_by_descending(|n| *n)
///     .take(2)
///     .enable_cache("numbers:even")
///     .with_cache_ttl(Duration::from_secs(60));
///
/// assert_eq!(spec.evaluate(vec![1, 2, 3, 4, 6]), vec![6, 4]);
/// assert_eq!(spec.cache_key(), Some("numbers:even"));
/// assert_eq!(spec.cache_ttl(), Duration::from_secs(60));
/// ```
pub struct QuerySpecification<T> {
    name: Cow<'static, str>,
    criteria: Vec<Box<dyn Specification<T>>>,
    ordering: Vec<Comparator<T>>,
    skip: Option<usize>,
    take: Option<usize>,
    cache: CacheOptions,
}

impl<T: 'static> QuerySpecification<T> {
    /// 创建规约；`name` 用于日志
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            criteria: Vec::new(),
            ordering: Vec::new(),
            skip: None,
            take: None,
            cache: CacheOptions::default(),
        }
    }

    /// 追加过滤条件（多个条件之间为 AND 关系）
    pub fn filter<S>(mut self, spec: S) -> Self
    where
        S: Specification<T> + 'static,
    {
        self.criteria.push(Box::new(spec));
        self
    }

    pub fn filter_by<F>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.filter(FnSpecification::new(predicate))
    }

    /// 按键升序；多次调用时依次作为次级排序
    pub fn order_by<K, F>(mut self, key: F) -> Self
    where
        K: Ord + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.ordering
            .push(Box::new(move |a: &T, b: &T| key(a).cmp(&key(b))));
        self
    }

    /// 按键降序
    pub fn order_by_descending<K, F>(mut self, key: F) -> Self
    where
        K: Ord + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.ordering
            .push(Box::new(move |a: &T, b: &T| key(b).cmp(&key(a))));
        self
    }

    pub fn skip(mut self, count: usize) -> Self {
        self.skip = Some(count);
        self
    }

    pub fn take(mut self, count: usize) -> Self {
        self.take = Some(count);
        self
    }

    /// 以给定缓存键启用缓存
    pub fn enable_cache(mut self, key: impl Into<String>) -> Self {
        self.cache.set_key(key);
        self
    }

    /// 配置缓存过期时长
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache.set_ttl(ttl);
        self
    }
}

impl<T> QuerySpecification<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_ordering(&self) -> bool {
        !self.ordering.is_empty()
    }

    pub fn skip_count(&self) -> Option<usize> {
        self.skip
    }

    pub fn take_count(&self) -> Option<usize> {
        self.take
    }

    pub fn cache_options(&self) -> &CacheOptions {
        &self.cache
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_enabled()
    }

    pub fn cache_key(&self) -> Option<&str> {
        self.cache.key()
    }

    pub fn set_cache_ttl(&mut self, ttl: Duration) {
        self.cache.set_ttl(ttl);
    }

    /// 缓存过期时长，未配置时为 `Duration::MAX`
    pub fn cache_ttl(&self) -> Duration {
        self.cache.ttl()
    }

    /// 要求下一次经由缓存的读取忽略已有缓存条目
    pub fn set_forced_cache_refresh(&mut self) {
        self.cache.set_force_refresh();
    }

    pub fn has_forced_cache_refresh(&self) -> bool {
        self.cache.force_refresh()
    }

    /// 候选对象是否满足全部过滤条件
    pub fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.criteria.iter().all(|c| c.is_satisfied_by(candidate))
    }

    /// 依次应用排序键比较两个候选对象
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        self.ordering
            .iter()
            .map(|cmp| cmp(a, b))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    /// 仅应用过滤条件（用于计数）
    pub fn evaluate_criteria(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .filter(|item| self.is_satisfied_by(item))
            .collect()
    }

    /// 应用过滤、排序与分页
    pub fn evaluate(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let mut matched = self.evaluate_criteria(items);
        if self.has_ordering() {
            matched.sort_by(|a, b| self.compare(a, b));
        }
        let skip = self.skip.unwrap_or(0);
        let take = self.take.unwrap_or(usize::MAX);
        matched.into_iter().skip(skip).take(take).collect()
    }
}

impl<T> fmt::Debug for QuerySpecification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySpecification")
            .field("name", &self.name)
            .field("criteria", &self.criteria.len())
            .field("ordering", &self.ordering.len())
            .field("skip", &self.skip)
            .field("take", &self.take)
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Message {
        author: &'static str,
        length: usize,
    }

    fn messages() -> Vec<Message> {
        vec![
            Message { author: "bob", length: 12 },
            Message { author: "alice", length: 5 },
            Message { author: "alice", length: 40 },
            Message { author: "carol", length: 5 },
        ]
    }

    #[test]
    fn evaluate_applies_filter_order_and_paging() {
        let spec = QuerySpecification::<Message>::new("LongestFirst")
            .filter_by(|m| m.length > 4)
            .order_by_descending(|m| m.length)
            .skip(1)
            .take(2);

        let out = spec.evaluate(messages());
        assert_eq!(
            out.iter().map(|m| m.length).collect::<Vec<_>>(),
            vec![12, 5]
        );
    }

    #[test]
    fn secondary_ordering_breaks_ties() {
        let spec = QuerySpecification::<Message>::new("ByLength")
            .order_by(|m| m.length)
            .order_by(|m| m.author);

        let out = spec.evaluate(messages());
        assert_eq!(
            out.iter().map(|m| m.author).collect::<Vec<_>>(),
            vec!["alice", "carol", "bob", "alice"]
        );
    }

    #[test]
    fn evaluate_criteria_ignores_paging() {
        let spec = QuerySpecification::<Message>::new("ByAlice")
            .filter_by(|m| m.author == "alice")
            .take(1);
        assert_eq!(spec.evaluate_criteria(messages()).len(), 2);
        assert_eq!(spec.evaluate(messages()).len(), 1);
    }

    #[test]
    fn cache_metadata_lives_on_the_specification() {
        let mut spec = QuerySpecification::<Message>::new("Cached");
        assert!(!spec.cache_enabled());
        assert_eq!(spec.cache_ttl(), Duration::MAX);
        assert!(!spec.has_forced_cache_refresh());

        spec = spec.enable_cache("messages:all");
        spec.set_cache_ttl(Duration::from_secs(5));
        spec.set_forced_cache_refresh();

        assert!(spec.cache_enabled());
        assert_eq!(spec.cache_key(), Some("messages:all"));
        assert_eq!(spec.cache_ttl(), Duration::from_secs(5));
        assert!(spec.has_forced_cache_refresh());
    }
}
