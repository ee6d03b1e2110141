use super::{Database, Row, ScanPage, TxId, Write};
use async_trait::async_trait;
use ddd_domain::error::{DomainError, DomainResult};
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use tracing::{debug, trace};

#[derive(Debug, Clone, Default)]
struct Table {
    // 位置 -> (键, 行)，位置单调递增，保持插入顺序
    rows: BTreeMap<u64, (String, Row)>,
    index: HashMap<String, u64>,
    last_position: u64,
}

impl Table {
    fn get(&self, key: &str) -> Option<&Row> {
        let position = self.index.get(key)?;
        self.rows.get(position).map(|(_, row)| row)
    }

    fn scan(&self, after: Option<u64>, limit: usize) -> ScanPage {
        let start = after.map_or(Bound::Unbounded, Bound::Excluded);
        let mut iter = self.rows.range((start, Bound::Unbounded));
        let rows: Vec<(u64, Row)> = iter
            .by_ref()
            .take(limit)
            .map(|(position, (_, row))| (*position, row.clone()))
            .collect();
        let exhausted = iter.next().is_none();
        ScanPage { rows, exhausted }
    }

    fn apply(&mut self, write: &Write) -> DomainResult<()> {
        match write {
            Write::Insert { table, key, row } => {
                if self.index.contains_key(key) {
                    return Err(DomainError::database(format!(
                        "duplicate key '{key}' in table '{table}'"
                    )));
                }
                self.last_position += 1;
                self.rows
                    .insert(self.last_position, (key.clone(), row.clone()));
                self.index.insert(key.clone(), self.last_position);
            }
            Write::Update { table, key, row } => {
                let slot = self
                    .index
                    .get(key)
                    .and_then(|position| self.rows.get_mut(position))
                    .ok_or_else(|| missing_row(table, key))?;
                slot.1 = row.clone();
            }
            Write::Delete { table, key } => {
                let position = self
                    .index
                    .remove(key)
                    .ok_or_else(|| missing_row(table, key))?;
                self.rows.remove(&position);
            }
        }
        Ok(())
    }
}

fn missing_row(table: &str, key: &str) -> DomainError {
    DomainError::not_found(format!("row '{key}' in table '{table}'"))
}

type Tables = HashMap<String, Table>;

// 在受影响表的副本上依次应用写入，全部成功后才替换原表
fn apply_batch(tables: &mut Tables, writes: &[Write]) -> DomainResult<()> {
    let mut staged: HashMap<&'static str, Table> = HashMap::new();
    for write in writes {
        let name = write.table();
        let table = match staged.entry(name) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(tables.get(name).cloned().unwrap_or_default()),
        };
        table.apply(write)?;
    }
    for (name, table) in staged {
        tables.insert(name.to_string(), table);
    }
    Ok(())
}

struct Working {
    tables: Tables,
    log: Vec<Write>,
}

/// 存储访问统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatabaseStats {
    /// get/scan 调用次数
    pub reads: u64,
    /// 成功应用的写入条数（含事务内）
    pub writes: u64,
    pub begun: u64,
    pub committed: u64,
    pub rolled_back: u64,
}

#[derive(Default)]
struct State {
    tables: Tables,
    transactions: HashMap<TxId, Working>,
    last_tx: u64,
    identities: HashMap<String, u64>,
    stats: DatabaseStats,
}

impl State {
    fn tables(&self, tx: Option<TxId>) -> DomainResult<&Tables> {
        match tx {
            None => Ok(&self.tables),
            Some(id) => self
                .transactions
                .get(&id)
                .map(|w| &w.tables)
                .ok_or_else(|| unknown_transaction(id)),
        }
    }
}

fn unknown_transaction(tx: TxId) -> DomainError {
    DomainError::transaction(format!("{tx} is not open"))
}

/// 内存存储
///
/// 事务开启时复制一份已提交数据作为工作副本，并记录写入日志；
/// 提交时将日志重放到已提交数据上。读写均在同一把锁内完成。
#[derive(Default)]
pub struct InMemoryDatabase {
    state: Mutex<State>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> DatabaseStats {
        self.state.lock().stats
    }

    /// 已提交数据中表的行数
    pub fn committed_rows(&self, table: &str) -> usize {
        self.state
            .lock()
            .tables
            .get(table)
            .map_or(0, |t| t.rows.len())
    }

    /// 当前未结束的事务数
    pub fn open_transactions(&self) -> usize {
        self.state.lock().transactions.len()
    }
}

#[async_trait]
impl Database for InMemoryDatabase {
    async fn begin(&self) -> DomainResult<TxId> {
        let mut state = self.state.lock();
        state.last_tx += 1;
        let id = TxId(state.last_tx);
        let working = Working {
            tables: state.tables.clone(),
            log: Vec::new(),
        };
        state.transactions.insert(id, working);
        state.stats.begun += 1;
        debug!(tx = %id, "transaction begun");
        Ok(id)
    }

    async fn commit(&self, tx: TxId) -> DomainResult<()> {
        let mut state = self.state.lock();
        let working = state
            .transactions
            .remove(&tx)
            .ok_or_else(|| unknown_transaction(tx))?;

        if let Err(err) = apply_batch(&mut state.tables, &working.log) {
            state.stats.rolled_back += 1;
            return Err(DomainError::transaction(format!(
                "commit of {tx} failed: {err}"
            )));
        }
        state.stats.committed += 1;
        debug!(tx = %tx, writes = working.log.len(), "transaction committed");
        Ok(())
    }

    fn rollback(&self, tx: TxId) {
        let mut state = self.state.lock();
        if state.transactions.remove(&tx).is_some() {
            state.stats.rolled_back += 1;
            debug!(tx = %tx, "transaction rolled back");
        }
    }

    async fn get(&self, tx: Option<TxId>, table: &str, key: &str) -> DomainResult<Option<Row>> {
        let mut state = self.state.lock();
        state.stats.reads += 1;
        let row = state
            .tables(tx)?
            .get(table)
            .and_then(|t| t.get(key))
            .cloned();
        trace!(table, key, found = row.is_some(), "get");
        Ok(row)
    }

    async fn scan(
        &self,
        tx: Option<TxId>,
        table: &str,
        after: Option<u64>,
        limit: usize,
    ) -> DomainResult<ScanPage> {
        let mut state = self.state.lock();
        state.stats.reads += 1;
        let page = state
            .tables(tx)?
            .get(table)
            .map(|t| t.scan(after, limit))
            .unwrap_or(ScanPage {
                rows: Vec::new(),
                exhausted: true,
            });
        trace!(table, rows = page.rows.len(), "scan");
        Ok(page)
    }

    async fn apply(&self, tx: Option<TxId>, writes: Vec<Write>) -> DomainResult<usize> {
        let mut state = self.state.lock();
        let affected = writes.len();
        match tx {
            None => apply_batch(&mut state.tables, &writes)?,
            Some(id) => {
                let working = state
                    .transactions
                    .get_mut(&id)
                    .ok_or_else(|| unknown_transaction(id))?;
                apply_batch(&mut working.tables, &writes)?;
                working.log.extend(writes);
            }
        }
        state.stats.writes += affected as u64;
        Ok(affected)
    }

    fn next_identity(&self, table: &str) -> u64 {
        let mut state = self.state.lock();
        let next = state.identities.entry(table.to_string()).or_insert(0);
        *next += 1;
        *next
    }
}
