//! 领域类型（枚举式值对象）
//!
//! 一组封闭的、带名称的取值，名称即其持久化与展示形式。
//! 通常使用 `#[domain_type]` 宏在无字段枚举上派生。
//!
use crate::error::{DomainError, DomainResult};

/// 具名的封闭取值集合
pub trait DomainType: Copy + Sized + 'static {
    /// 该取值的名称
    fn name(&self) -> &'static str;

    /// 全部取值，按声明顺序
    fn all() -> &'static [Self];

    /// 按名称查找取值，`ignore_case` 为真时忽略大小写
    fn from_name(name: &str, ignore_case: bool) -> Option<Self> {
        Self::all().iter().copied().find(|value| {
            if ignore_case {
                value.name().to_lowercase() == name.to_lowercase()
            } else {
                value.name() == name
            }
        })
    }

    /// 严格按名称解析，未知名称返回 `Parse` 错误
    fn parse_name(name: &str) -> DomainResult<Self> {
        Self::from_name(name, false).ok_or_else(|| {
            DomainError::parse(format!(
                "unknown {} '{name}'",
                std::any::type_name::<Self>()
                    .rsplit("::")
                    .next()
                    .unwrap_or("domain type")
            ))
        })
    }
}
