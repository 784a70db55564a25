// src/services/store.rs
//! Key-value store with per-entry expiry
//!
//! OTP and rate-limit records live here. Both backends apply expiry on read,
//! so an expired entry is never visible even before the sweeper removes it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait TtlStore: Send + Sync {
    /// Value for `key`, if present and not expired
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes `value` with a fresh expiry, replacing any previous entry
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError>;

    /// Overwrites the value of a live entry, keeping its expiry.
    ///
    /// Returns `false` when the key is missing or already expired.
    async fn replace(&self, key: &str, value: String) -> Result<bool, StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Drops expired entries, returning how many were removed
    async fn cleanup_expired(&self) -> Result<u64, StoreError>;
}

/// Saturates at the latest representable instant
fn expiry_from_now(ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|span| Utc::now().checked_add_signed(span))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

pub async fn get_json<T: DeserializeOwned>(
    store: &dyn TtlStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub async fn set_json<T: Serialize>(
    store: &dyn TtlStore,
    key: &str,
    value: &T,
    ttl: Duration,
) -> Result<(), StoreError> {
    store.set(key, serde_json::to_string(value)?, ttl).await
}

pub async fn replace_json<T: Serialize>(
    store: &dyn TtlStore,
    key: &str,
    value: &T,
) -> Result<bool, StoreError> {
    store.replace(key, serde_json::to_string(value)?).await
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Process-local store; suitable for a single instance
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TtlStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(Utc::now()))
            .map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: expiry_from_now(ttl),
            },
        );
        Ok(())
    }

    async fn replace(&self, key: &str, value: String) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        let now = Utc::now();
        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.value = value;
                Ok(true)
            }
            Some(_) => {
                entries.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<u64, StoreError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let now = Utc::now();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = (before - entries.len()) as u64;
        debug!(removed = removed, "Cleaned up expired memory store entries");
        Ok(removed)
    }
}

/// Store shared by every instance pointing at the same database.
///
/// Expiry is stored as epoch milliseconds in `kv_entries.expires_at`.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TtlStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM kv_entries WHERE key = ? AND expires_at > ?")
                .bind(key)
                .bind(Utc::now().timestamp_millis())
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (key, value, expires_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expiry_from_now(ttl).timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn replace(&self, key: &str, value: String) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE kv_entries SET value = ? WHERE key = ? AND expires_at > ?")
                .bind(value)
                .bind(key)
                .bind(Utc::now().timestamp_millis())
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM kv_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM kv_entries WHERE expires_at <= ?")
            .bind(Utc::now().timestamp_millis())
            .execute(&self.pool)
            .await?;
        debug!(
            removed = result.rows_affected(),
            "Cleaned up expired sqlite store entries"
        );
        Ok(result.rows_affected())
    }
}
