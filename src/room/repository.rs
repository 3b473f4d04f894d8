use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::models::{RoomRecord, StorageKey};
use crate::shared::AppError;

/// Trait for room metadata storage.
///
/// Records are written by whoever creates rooms; this crate only deletes them.
#[async_trait]
pub trait RoomRecordRepository {
    /// Inserts or replaces the record at `key`
    async fn write_record(&self, key: &StorageKey, record: &RoomRecord) -> Result<(), AppError>;
    async fn get_record(&self, key: &StorageKey) -> Result<Option<RoomRecord>, AppError>;

    /// Deletes the record at `key`. Returns whether one existed; deleting an
    /// absent record is not an error.
    async fn delete_record(&self, key: &StorageKey) -> Result<bool, AppError>;
}

/// In-memory implementation of RoomRecordRepository for development and testing
pub struct InMemoryRoomRecordRepository {
    records: Mutex<HashMap<StorageKey, RoomRecord>>,
}

impl Default for InMemoryRoomRecordRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomRecordRepository {
    /// Creates a new empty in-memory repository
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<StorageKey, RoomRecord>>, AppError> {
        self.records
            .lock()
            .map_err(|_| AppError::DatabaseError("Room record store poisoned".to_string()))
    }

    /// Returns the current number of records in the repository
    pub fn record_count(&self) -> usize {
        self.lock().map(|records| records.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RoomRecordRepository for InMemoryRoomRecordRepository {
    #[instrument(skip(self, record))]
    async fn write_record(&self, key: &StorageKey, record: &RoomRecord) -> Result<(), AppError> {
        debug!(room_name = %record.room_name, "Writing room record in memory");

        let mut records = self.lock()?;
        records.insert(key.clone(), record.clone());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_record(&self, key: &StorageKey) -> Result<Option<RoomRecord>, AppError> {
        let records = self.lock()?;
        let record = records.get(key).cloned();

        match &record {
            Some(_) => debug!(room_name = %key.key, "Room record found in memory"),
            None => debug!(room_name = %key.key, "Room record not found in memory"),
        }

        Ok(record)
    }

    #[instrument(skip(self))]
    async fn delete_record(&self, key: &StorageKey) -> Result<bool, AppError> {
        let mut records = self.lock()?;
        let existed = records.remove(key).is_some();

        if existed {
            info!(room_name = %key.key, user_id = %key.user_id, "Room record deleted from memory");
        } else {
            debug!(room_name = %key.key, "Room record already absent");
        }

        Ok(existed)
    }
}

/// PostgreSQL implementation of RoomRecordRepository
///
/// Expects a generic key-value table:
/// `storage(collection TEXT, key TEXT, user_id TEXT, value TEXT, PRIMARY KEY (collection, key, user_id))`
/// with the record serialized as JSON in `value`.
pub struct PostgresRoomRecordRepository {
    pool: PgPool,
}

impl PostgresRoomRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the storage table if it does not exist yet
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS storage (
                collection TEXT NOT NULL,
                key TEXT NOT NULL,
                user_id TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (collection, key, user_id)
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to create storage table");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!("Storage table ready");
        Ok(())
    }
}

#[async_trait]
impl RoomRecordRepository for PostgresRoomRecordRepository {
    #[instrument(skip(self, record))]
    async fn write_record(&self, key: &StorageKey, record: &RoomRecord) -> Result<(), AppError> {
        let value =
            serde_json::to_string(record).map_err(|e| AppError::DatabaseError(e.to_string()))?;

        sqlx::query(
            "INSERT INTO storage (collection, key, user_id, value) VALUES ($1, $2, $3, $4)
             ON CONFLICT (collection, key, user_id) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(&key.collection)
        .bind(&key.key)
        .bind(&key.user_id)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, room_name = %key.key, "Failed to write room record");
            AppError::DatabaseError(e.to_string())
        })?;

        debug!(room_name = %key.key, "Room record written to database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_record(&self, key: &StorageKey) -> Result<Option<RoomRecord>, AppError> {
        let row = sqlx::query(
            "SELECT value FROM storage WHERE collection = $1 AND key = $2 AND user_id = $3",
        )
        .bind(&key.collection)
        .bind(&key.key)
        .bind(&key.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, room_name = %key.key, "Failed to fetch room record");
            AppError::DatabaseError(e.to_string())
        })?;

        match row {
            Some(row) => {
                let value: String = row.get("value");
                let record = serde_json::from_str(&value)
                    .map_err(|e| AppError::DatabaseError(e.to_string()))?;
                Ok(Some(record))
            }
            None => {
                debug!(room_name = %key.key, "Room record not found in database");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    async fn delete_record(&self, key: &StorageKey) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM storage WHERE collection = $1 AND key = $2 AND user_id = $3",
        )
        .bind(&key.collection)
        .bind(&key.key)
        .bind(&key.user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, room_name = %key.key, "Failed to delete room record");
            AppError::DatabaseError(e.to_string())
        })?;

        let existed = result.rows_affected() > 0;
        debug!(room_name = %key.key, existed = existed, "Room record delete executed");
        Ok(existed)
    }
}
