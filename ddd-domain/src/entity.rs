//! 实体（Entity）基础抽象
//!
//! 为持久化实体提供统一的标识（Id）、审计字段（Audit）与待发布领域事件的承载能力。
//! 审计时间戳只由持久化层在插入/更新时写入，应用代码仅设置创建者/修改者。
//!
use crate::domain_event::DomainEvents;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use uuid::Uuid;

/// 实体标识类型
///
/// 未赋值的标识在保存时由存储层生成（类似数据库的自增列或 GUID 默认值）。
pub trait Identity: Clone + PartialEq + Debug + Display + Send + Sync + 'static {
    /// 是否为“未赋值”状态
    fn is_unset(&self) -> bool;

    /// 生成新标识；`sequence` 为存储层按表分配的递增序号（从 1 开始）
    fn generate(sequence: u64) -> Self;
}

impl Identity for Uuid {
    fn is_unset(&self) -> bool {
        self.is_nil()
    }

    fn generate(_sequence: u64) -> Self {
        Uuid::now_v7()
    }
}

impl Identity for String {
    fn is_unset(&self) -> bool {
        self.is_empty()
    }

    fn generate(_sequence: u64) -> Self {
        Uuid::now_v7().to_string()
    }
}

impl Identity for i64 {
    fn is_unset(&self) -> bool {
        *self == 0
    }

    fn generate(sequence: u64) -> Self {
        i64::try_from(sequence).unwrap_or(i64::MAX)
    }
}

impl Identity for u64 {
    fn is_unset(&self) -> bool {
        *self == 0
    }

    fn generate(sequence: u64) -> Self {
        sequence
    }
}

/// 审计字段
///
/// 时间戳字段仅提供只读访问，写入入口 `mark_created`/`mark_modified` 供持久化层在保存时调用。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    created_by: String,
    last_modified_by: String,
    creation_date: DateTime<Utc>,
    last_modified_date: DateTime<Utc>,
}

impl Audit {
    /// 以同一作者作为创建者与最后修改者
    pub fn by(author: impl Into<String>) -> Self {
        let author = author.into();
        Self {
            created_by: author.clone(),
            last_modified_by: author,
            ..Default::default()
        }
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    pub fn last_modified_by(&self) -> &str {
        &self.last_modified_by
    }

    pub fn creation_date(&self) -> DateTime<Utc> {
        self.creation_date
    }

    pub fn last_modified_date(&self) -> DateTime<Utc> {
        self.last_modified_date
    }

    /// 记录修改者（应用层在修改实体时调用）
    pub fn set_last_modified_by(&mut self, author: impl Into<String>) {
        self.last_modified_by = author.into();
    }

    /// 新增实体：同时写入创建时间与最后修改时间
    pub fn mark_created(&mut self, now: DateTime<Utc>) {
        self.creation_date = now;
        self.last_modified_date = now;
    }

    /// 修改实体：仅写入最后修改时间
    pub fn mark_modified(&mut self, now: DateTime<Utc>) {
        self.last_modified_date = now;
    }
}

/// 具备唯一标识与审计信息的持久化实体
pub trait Entity: Send + Sync + 'static {
    /// 实体标识类型
    type Id: Identity;

    /// 实体所在的表名
    const TABLE: &'static str;

    fn id(&self) -> &Self::Id;

    fn set_id(&mut self, id: Self::Id);

    fn audit(&self) -> &Audit;

    fn audit_mut(&mut self) -> &mut Audit;

    /// 待发布领域事件；不承载事件的实体返回 `None`
    fn domain_events_mut(&mut self) -> Option<&mut DomainEvents> {
        None
    }
}

/// 聚合根标记：仓储只面向聚合根开放
pub trait AggregateRoot: Entity {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn unset_identities_are_detected() {
        assert!(Uuid::nil().is_unset());
        assert!(!Uuid::generate(1).is_unset());
        assert!(String::new().is_unset());
        assert!(!String::generate(1).is_unset());
        assert!(0_i64.is_unset());
        assert_eq!(i64::generate(7), 7);
        assert_eq!(u64::generate(3), 3);
    }

    #[test]
    fn audit_marks_follow_insert_and_update_rules() {
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();

        let mut audit = Audit::by("alice");
        assert_eq!(audit.created_by(), "alice");
        assert_eq!(audit.last_modified_by(), "alice");

        audit.mark_created(t1);
        assert_eq!(audit.creation_date(), t1);
        assert_eq!(audit.last_modified_date(), t1);

        audit.set_last_modified_by("bob");
        audit.mark_modified(t2);
        assert_eq!(audit.creation_date(), t1);
        assert_eq!(audit.last_modified_date(), t2);
        assert_eq!(audit.created_by(), "alice");
        assert_eq!(audit.last_modified_by(), "bob");
    }
}
