use anyhow::Result;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

use crate::entities::{cache_entry, prelude::CacheEntry};

pub struct CacheRepository {
    conn: DatabaseConnection,
}

impl CacheRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Returns the cached value for `key` if it has not expired.
    ///
    /// Expired rows are removed opportunistically on every read; a background
    /// sweeper is not worth the moving parts at this volume.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = chrono::Utc::now().to_rfc3339();

        let _ = CacheEntry::delete_many()
            .filter(cache_entry::Column::ExpiresAt.lt(&now))
            .exec(&self.conn)
            .await;

        let entry = CacheEntry::find()
            .filter(cache_entry::Column::Key.eq(key))
            .filter(cache_entry::Column::ExpiresAt.gt(&now))
            .one(&self.conn)
            .await?;

        Ok(entry.map(|e| e.value))
    }

    /// Overwrites wholesale: the previous row for `key` is deleted, never
    /// partially merged.
    pub async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let now = chrono::Utc::now();
        #[allow(clippy::cast_possible_wrap)]
        let expires_at = (now + chrono::Duration::seconds(ttl_secs as i64)).to_rfc3339();

        let _ = CacheEntry::delete_many()
            .filter(cache_entry::Column::Key.eq(key))
            .exec(&self.conn)
            .await;

        let active_model = cache_entry::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            created_at: Set(now.to_rfc3339()),
            expires_at: Set(expires_at),
            ..Default::default()
        };

        CacheEntry::insert(active_model).exec(&self.conn).await?;

        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        CacheEntry::delete_many()
            .filter(cache_entry::Column::Key.eq(key))
            .exec(&self.conn)
            .await?;
        Ok(())
    }

    /// Deletes every row under `prefix` and returns how many were removed.
    pub async fn clear_prefix(&self, prefix: &str) -> Result<u64> {
        let result = CacheEntry::delete_many()
            .filter(cache_entry::Column::Key.starts_with(prefix))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected)
    }
}
