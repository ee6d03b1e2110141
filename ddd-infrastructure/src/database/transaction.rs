use super::{Database, TxId};
use ddd_domain::error::DomainResult;
use std::sync::Arc;

/// 事务句柄
///
/// 未显式提交的句柄在释放时回滚。
pub struct Transaction {
    db: Arc<dyn Database>,
    id: TxId,
    finished: bool,
}

impl Transaction {
    pub async fn begin(db: Arc<dyn Database>) -> DomainResult<Self> {
        let id = db.begin().await?;
        Ok(Self {
            db,
            id,
            finished: false,
        })
    }

    pub fn id(&self) -> TxId {
        self.id
    }

    pub async fn commit(mut self) -> DomainResult<()> {
        self.finished = true;
        self.db.commit(self.id).await
    }

    pub fn rollback(mut self) {
        self.finished = true;
        self.db.rollback(self.id);
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.finished {
            self.db.rollback(self.id);
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("finished", &self.finished)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{InMemoryDatabase, Write};

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let mem = Arc::new(InMemoryDatabase::new());
        let db: Arc<dyn Database> = mem.clone();
        {
            let tx = Transaction::begin(db.clone()).await.unwrap();
            db.apply(
                Some(tx.id()),
                vec![Write::Delete {
                    table: "t",
                    key: "k".into(),
                }],
            )
            .await
            .unwrap_err();
        }
        assert_eq!(mem.open_transactions(), 0);
        assert_eq!(mem.stats().rolled_back, 1);

        let tx = Transaction::begin(db).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(mem.stats().committed, 1);
        assert_eq!(mem.stats().rolled_back, 1);
    }
}
