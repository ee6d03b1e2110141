//! 基础设施配置
//!
//! 可通过构建器显式设置，也可从环境变量（以及 `.env` 文件）读取：
//!
//! | 变量 | 取值 | 默认 |
//! |---|---|---|
//! | `DDD_CACHE_PROVIDER` | `stub` / `memory` | `stub` |
//! | `DDD_CACHE_LIFETIME` | `singleton` / `scoped` | `singleton` |
//! | `DDD_CACHE_STRICT` | `true` / `false` / `1` / `0` | `false` |
//!
use bon::Builder;
use ddd_domain::error::DomainError;
use std::str::FromStr;

/// 缓存提供者种类
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachingProviderKind {
    #[default]
    Stub,
    Memory,
}

impl FromStr for CachingProviderKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stub" => Ok(Self::Stub),
            "memory" => Ok(Self::Memory),
            other => Err(DomainError::parse(format!(
                "unknown caching provider '{other}'"
            ))),
        }
    }
}

/// 缓存提供者的生命周期
///
/// - `Singleton`：所有工作单元共享一个提供者
/// - `Scoped`：每个工作单元创建独立的提供者
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServiceLifetime {
    #[default]
    Singleton,
    Scoped,
}

impl FromStr for ServiceLifetime {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "singleton" => Ok(Self::Singleton),
            "scoped" => Ok(Self::Scoped),
            other => Err(DomainError::parse(format!(
                "unknown service lifetime '{other}'"
            ))),
        }
    }
}

/// 占位缓存提供者的行为
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StubMode {
    /// 永远未命中
    #[default]
    PassThrough,
    /// 以 `CachingProviderUnconfigured` 拒绝
    Strict,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Builder)]
pub struct InfrastructureOptions {
    #[builder(default)]
    caching_provider: CachingProviderKind,
    #[builder(default)]
    caching_lifetime: ServiceLifetime,
    #[builder(default)]
    stub_mode: StubMode,
}

impl InfrastructureOptions {
    /// 从环境变量读取，缺失或非法的取值回退为默认值
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let strict = parse_bool(var("DDD_CACHE_STRICT").as_deref(), false);
        Self {
            caching_provider: parse_or_default(var("DDD_CACHE_PROVIDER")),
            caching_lifetime: parse_or_default(var("DDD_CACHE_LIFETIME")),
            stub_mode: if strict {
                StubMode::Strict
            } else {
                StubMode::PassThrough
            },
        }
    }

    pub fn caching_provider(&self) -> CachingProviderKind {
        self.caching_provider
    }

    pub fn caching_lifetime(&self) -> ServiceLifetime {
        self.caching_lifetime
    }

    pub fn stub_mode(&self) -> StubMode {
        self.stub_mode
    }
}

fn parse_or_default<T: FromStr + Default>(value: Option<String>) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or_default()
}

fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value.map(str::trim) {
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
        _ => default,
    }
}
