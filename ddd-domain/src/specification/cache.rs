use std::time::Duration;

/// 查询规约的缓存元数据
///
/// 作为规约自身的字段存在，随规约一起创建与释放。
/// 未设置缓存键时表示不启用缓存；未设置 TTL 时视为永不过期（`Duration::MAX`）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheOptions {
    key: Option<String>,
    ttl: Option<Duration>,
    force_refresh: bool,
}

impl CacheOptions {
    /// 以给定缓存键启用缓存
    pub fn enabled(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Default::default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn set_key(&mut self, key: impl Into<String>) {
        self.key = Some(key.into());
    }

    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = Some(ttl);
    }

    /// 缓存过期时长，未配置时返回 `Duration::MAX`
    pub fn ttl(&self) -> Duration {
        self.ttl.unwrap_or(Duration::MAX)
    }

    pub fn set_force_refresh(&mut self) {
        self.force_refresh = true;
    }

    pub fn force_refresh(&self) -> bool {
        self.force_refresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_disabled_and_unbounded() {
        let opts = CacheOptions::default();
        assert!(!opts.is_enabled());
        assert_eq!(opts.key(), None);
        assert_eq!(opts.ttl(), Duration::MAX);
        assert!(!opts.force_refresh());
    }

    #[test]
    fn enabled_options_keep_ttl_and_refresh_flag() {
        let mut opts = CacheOptions::enabled("messages:alice");
        opts.set_ttl(Duration::from_secs(30));
        opts.set_force_refresh();
        assert!(opts.is_enabled());
        assert_eq!(opts.key(), Some("messages:alice"));
        assert_eq!(opts.ttl(), Duration::from_secs(30));
        assert!(opts.force_refresh());
    }
}
