use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::UserStore;
use crate::error::StorageError;
use crate::models::{NewUser, User};

// In-process stand-in for ClickHouse
pub struct MemoryUserStore {
    rows: Mutex<Vec<(u64, User)>>, // (insertion sequence, row)
    seq: AtomicUsize,
    insert_calls: AtomicUsize,
    fail: bool,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            seq: AtomicUsize::new(0),
            insert_calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    // Every call is rejected the way a broken server would
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError::Rejected {
                status: 500,
                body: "Code: 210. DB::NetException: Connection refused".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn ensure_schema(&self) -> Result<(), StorageError> {
        self.check()
    }

    async fn insert_users(&self, rows: &[NewUser]) -> Result<(), StorageError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;

        let now = Utc::now().naive_utc();
        let mut stored = self.rows.lock().unwrap();
        for row in rows {
            let seq = self.seq.fetch_add(1, Ordering::SeqCst) as u64;
            stored.push((
                seq,
                User {
                    id: row.id,
                    name: row.name.clone(),
                    age: row.age,
                    created_at: now,
                },
            ));
        }
        Ok(())
    }

    async fn recent_users(&self, limit: u32) -> Result<Vec<User>, StorageError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| (b.1.created_at, b.0).cmp(&(a.1.created_at, a.0)));
        Ok(rows
            .into_iter()
            .take(limit as usize)
            .map(|(_, user)| user)
            .collect())
    }

    async fn count_users(&self) -> Result<Option<u64>, StorageError> {
        self.check()?;
        Ok(Some(self.len() as u64))
    }
}
