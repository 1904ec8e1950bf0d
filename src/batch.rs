// whole batch goes out in one insert; all rows land or none do, no retry

use log::{error, info};
use std::ops::RangeInclusive;
use std::time::Instant;

use crate::error::StorageError;
use crate::faker::Faker;
use crate::metrics::{BATCH_LATENCY, ROWS_INSERTED};
use crate::models::NewUser;
use crate::store::UserStore;

pub const DEFAULT_BATCH_SIZE: usize = 10_000;
pub const SYNTHETIC_AGE: RangeInclusive<u8> = 1..=20;

pub fn generate_users(faker: &Faker, n: usize) -> Vec<NewUser> {
    (0..n)
        .map(|_| NewUser::new(faker.first_name().to_string(), faker.int_in(SYNTHETIC_AGE)))
        .collect()
}

// Generate `n` users and persist them in one statement; returns rows written
pub async fn ingest_batch(store: &dyn UserStore, n: usize) -> Result<usize, StorageError> {
    let rows = generate_users(&Faker, n);
    let start = Instant::now();

    match store.insert_users(&rows).await {
        Ok(()) => {
            let elapsed = start.elapsed();
            BATCH_LATENCY.observe(elapsed.as_secs_f64());
            ROWS_INSERTED.inc_by(rows.len() as f64);
            info!("[Batch] inserted {} rows in {:?}", rows.len(), elapsed);
            Ok(rows.len())
        }
        Err(e) => {
            error!("[Batch] insert of {} rows failed: {}", rows.len(), e);
            Err(e)
        }
    }
}
