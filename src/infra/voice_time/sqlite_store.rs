use crate::core::voice_time::{VoiceTimeError, VoiceTimeRecord, VoiceTimeStore};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

pub struct SqliteVoiceTimeStore {
    pool: Pool<Sqlite>,
}

impl SqliteVoiceTimeStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure the file exists if it's a file path
        let path_str = database_url.trim_start_matches("sqlite://");
        if !database_url.contains(":memory:") && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path_str)?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&conn_str)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS voice_time (
                user_id INTEGER NOT NULL,
                guild_id INTEGER NOT NULL,
                total_time INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (user_id, guild_id)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_voice_time_guild_total
            ON voice_time(guild_id, total_time DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

fn storage_error(e: sqlx::Error) -> VoiceTimeError {
    VoiceTimeError::StorageError(e.to_string())
}

#[async_trait]
impl VoiceTimeStore for SqliteVoiceTimeStore {
    async fn add_time(
        &self,
        user_id: u64,
        guild_id: u64,
        seconds: u64,
    ) -> Result<(), VoiceTimeError> {
        // One statement: concurrent writers to the same row can't lose an increment.
        sqlx::query(
            r#"
            INSERT INTO voice_time (user_id, guild_id, total_time)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id, guild_id) DO UPDATE SET
            total_time = total_time + excluded.total_time
            "#,
        )
        .bind(user_id as i64)
        .bind(guild_id as i64)
        .bind(i64::try_from(seconds).unwrap_or(i64::MAX))
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(())
    }

    async fn get_time(&self, user_id: u64, guild_id: u64) -> Result<u64, VoiceTimeError> {
        let result =
            sqlx::query("SELECT total_time FROM voice_time WHERE user_id = ? AND guild_id = ?")
                .bind(user_id as i64)
                .bind(guild_id as i64)
                .fetch_optional(&self.pool)
                .await
                .map_err(storage_error)?;

        Ok(result
            .map(|row| row.get::<i64, _>(0).max(0) as u64)
            .unwrap_or(0))
    }

    async fn get_leaderboard(
        &self,
        guild_id: u64,
        limit: usize,
    ) -> Result<Vec<VoiceTimeRecord>, VoiceTimeError> {
        let rows = sqlx::query(
            "SELECT user_id, guild_id, total_time FROM voice_time WHERE guild_id = ? ORDER BY total_time DESC, user_id ASC LIMIT ?",
        )
        .bind(guild_id as i64)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        let records = rows
            .iter()
            .map(|row| VoiceTimeRecord {
                user_id: row.get::<i64, _>("user_id") as u64,
                guild_id: row.get::<i64, _>("guild_id") as u64,
                total_seconds: row.get::<i64, _>("total_time").max(0) as u64,
            })
            .collect();

        Ok(records)
    }

    async fn reset_user(&self, user_id: u64, guild_id: u64) -> Result<(), VoiceTimeError> {
        sqlx::query("UPDATE voice_time SET total_time = 0 WHERE user_id = ? AND guild_id = ?")
            .bind(user_id as i64)
            .bind(guild_id as i64)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn reset_guild(&self, guild_id: u64) -> Result<u64, VoiceTimeError> {
        let result = sqlx::query("DELETE FROM voice_time WHERE guild_id = ?")
            .bind(guild_id as i64)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn open_store(dir: &TempDir) -> SqliteVoiceTimeStore {
        let path = dir.path().join("voice_time.db");
        SqliteVoiceTimeStore::new(path.to_str().unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn creates_database_file_and_reads_zero() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        assert!(dir.path().join("voice_time.db").exists());
        assert_eq!(store.get_time(1, 2).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn add_time_upserts() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        store.add_time(1, 2, 125).await.unwrap();
        store.add_time(1, 2, 75).await.unwrap();

        assert_eq!(store.get_time(1, 2).await.unwrap(), 200);
    }

    #[tokio::test]
    async fn totals_survive_reopening() {
        let dir = TempDir::new().unwrap();
        {
            let store = open_store(&dir).await;
            store.add_time(5, 7, 123).await.unwrap();
            store.pool.close().await;
        }

        let reopened = open_store(&dir).await;
        assert_eq!(reopened.get_time(5, 7).await.unwrap(), 123);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_adds_to_one_key_sum_exactly() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(open_store(&dir).await);

        let handles: Vec<_> = (1..=20u64)
            .map(|seconds| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.add_time(1, 100, seconds).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.get_time(1, 100).await.unwrap(), (1..=20u64).sum::<u64>());
    }

    #[tokio::test]
    async fn leaderboard_orders_limits_and_scopes() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        store.add_time(1, 100, 500).await.unwrap();
        store.add_time(2, 100, 300).await.unwrap();
        store.add_time(3, 100, 700).await.unwrap();
        store.add_time(6, 100, 300).await.unwrap();
        store.add_time(4, 100, 100).await.unwrap();
        store.add_time(5, 100, 50).await.unwrap();
        store.add_time(9, 200, 9_000).await.unwrap();

        let top = store.get_leaderboard(100, 5).await.unwrap();
        let users: Vec<u64> = top.iter().map(|r| r.user_id).collect();
        assert_eq!(users, vec![3, 1, 2, 6, 4]);
        assert!(top.iter().all(|r| r.guild_id == 100));

        let everyone = store.get_leaderboard(100, usize::MAX).await.unwrap();
        assert_eq!(everyone.len(), 6);
    }

    #[tokio::test]
    async fn reset_user_zeroes_one_record() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        store.add_time(1, 100, 10).await.unwrap();
        store.add_time(1, 200, 20).await.unwrap();
        store.add_time(2, 100, 30).await.unwrap();

        store.reset_user(1, 100).await.unwrap();

        assert_eq!(store.get_time(1, 100).await.unwrap(), 0);
        assert_eq!(store.get_time(1, 200).await.unwrap(), 20);
        assert_eq!(store.get_time(2, 100).await.unwrap(), 30);
        let board = store.get_leaderboard(100, 10).await.unwrap();
        assert_eq!(board.len(), 2, "record is retained after reset");
    }

    #[tokio::test]
    async fn reset_guild_removes_only_that_guild() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;
        store.add_time(1, 100, 10).await.unwrap();
        store.add_time(2, 100, 30).await.unwrap();
        store.add_time(1, 200, 20).await.unwrap();

        assert_eq!(store.reset_guild(100).await.unwrap(), 2);

        assert!(store.get_leaderboard(100, 10).await.unwrap().is_empty());
        assert_eq!(store.get_time(1, 200).await.unwrap(), 20);
    }
}
