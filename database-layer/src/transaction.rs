// Transaction management
use crate::connection::DatabasePool;
use crate::error::{DatabaseError, DatabaseResult};
use sqlx::{Postgres, Transaction};
use tracing::debug;

/// Hands out transactions on the shared pool
#[derive(Clone)]
pub struct TransactionManager {
    pool: DatabasePool,
}

impl TransactionManager {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Begin a new transaction
    pub async fn begin(&self) -> DatabaseResult<Transaction<'static, Postgres>> {
        debug!("Beginning transaction");

        self.pool
            .pool()
            .begin()
            .await
            .map_err(|e| DatabaseError::QueryFailed(format!("Failed to begin transaction: {}", e)))
    }

    /// Commit, classifying any failure the same way as a query
    pub async fn commit(&self, tx: Transaction<'static, Postgres>) -> DatabaseResult<()> {
        tx.commit().await?;
        debug!("Transaction committed");
        Ok(())
    }
}
