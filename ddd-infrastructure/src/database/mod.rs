//! 存储边界（Database）
//!
//! 以表为单位保存 JSON 行，行以实体标识的文本形式为键。
//! - 读写可指定事务；未指定事务的写入以单批次原子方式立即生效；
//! - 事务对外以 `TxId` 表示，提交前的写入仅对同一事务可见；
//! - 每张表维护独立的标识序列，供未赋值的实体标识使用。
//!
mod memory;
mod transaction;

pub use memory::{DatabaseStats, InMemoryDatabase};
pub use transaction::Transaction;

use async_trait::async_trait;
use ddd_domain::error::DomainResult;

/// 表中的一行
pub type Row = serde_json::Value;

/// 事务标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxId(pub(crate) u64);

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tx-{}", self.0)
    }
}

/// 一次写入
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    Insert {
        table: &'static str,
        key: String,
        row: Row,
    },
    Update {
        table: &'static str,
        key: String,
        row: Row,
    },
    Delete {
        table: &'static str,
        key: String,
    },
}

impl Write {
    pub fn table(&self) -> &'static str {
        match self {
            Write::Insert { table, .. } | Write::Update { table, .. } | Write::Delete { table, .. } => {
                table
            }
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Write::Insert { key, .. } | Write::Update { key, .. } | Write::Delete { key, .. } => key,
        }
    }
}

/// 按插入顺序扫描得到的一页数据；`position` 可作为下一次扫描的起点
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub rows: Vec<(u64, Row)>,
    pub exhausted: bool,
}

impl ScanPage {
    /// 本页最后一行的位置
    pub fn last_position(&self) -> Option<u64> {
        self.rows.last().map(|(pos, _)| *pos)
    }
}

#[async_trait]
pub trait Database: Send + Sync {
    /// 开启事务
    async fn begin(&self) -> DomainResult<TxId>;

    /// 提交事务；失败时事务被丢弃
    async fn commit(&self, tx: TxId) -> DomainResult<()>;

    /// 回滚事务；未知事务忽略
    fn rollback(&self, tx: TxId);

    async fn get(&self, tx: Option<TxId>, table: &str, key: &str) -> DomainResult<Option<Row>>;

    /// 自 `after` 之后（不含）按插入顺序读取至多 `limit` 行
    async fn scan(
        &self,
        tx: Option<TxId>,
        table: &str,
        after: Option<u64>,
        limit: usize,
    ) -> DomainResult<ScanPage>;

    /// 以原子方式应用一批写入，返回受影响行数
    ///
    /// 更新或删除不存在的行返回 `NotFound`，插入已存在的键返回 `Database` 错误；
    /// 任一写入失败时整批不生效。
    async fn apply(&self, tx: Option<TxId>, writes: Vec<Write>) -> DomainResult<usize>;

    /// 分配表的下一个标识序号（从 1 开始，不随事务回滚）
    fn next_identity(&self, table: &str) -> u64;
}
