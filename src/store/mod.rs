use async_trait::async_trait;

use crate::error::StorageError;
use crate::models::{NewUser, User};

pub mod clickhouse;
#[cfg(test)]
pub mod memory;
pub mod sql;

pub use clickhouse::ClickHouseStore;

#[async_trait]
pub trait UserStore: Send + Sync {
    // create if not exists
    async fn ensure_schema(&self) -> Result<(), StorageError>;

    // one statement for all rows, created_at set by the server
    async fn insert_users(&self, rows: &[NewUser]) -> Result<(), StorageError>;

    async fn recent_users(&self, limit: u32) -> Result<Vec<User>, StorageError>;

    // None when the query yields no row
    async fn count_users(&self) -> Result<Option<u64>, StorageError>;
}
