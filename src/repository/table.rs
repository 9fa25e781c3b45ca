//! Database table operations and implementations.

use sqlx::SqlitePool;

use crate::entity::LiveStateModel;
use crate::entity::SubscriptionModel;
use crate::repository::error::DatabaseError;

/// Base table struct providing database pool access.
#[derive(Clone)]
pub struct BaseTable {
    pub pool: SqlitePool,
}

impl BaseTable {
    /// Creates a new base table with the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Base trait for table operations.
#[async_trait::async_trait]
pub trait TableBase {
    /// Deletes all rows from the table.
    async fn delete_all(&self) -> Result<(), DatabaseError>;
}

macro_rules! impl_table_base {
    ($struct_name:ident, $table:expr) => {
        #[derive(Clone)]
        pub struct $struct_name {
            base: BaseTable,
        }

        impl $struct_name {
            pub fn new(pool: SqlitePool) -> Self {
                Self {
                    base: BaseTable::new(pool),
                }
            }
        }

        #[async_trait::async_trait]
        impl TableBase for $struct_name {
            async fn delete_all(&self) -> Result<(), DatabaseError> {
                sqlx::query(concat!("DELETE FROM ", $table))
                    .execute(&self.base.pool)
                    .await?;
                Ok(())
            }
        }
    };
}

// ============================================================================
// LiveStateTable
// ============================================================================

impl_table_base!(LiveStateTable, "live_states");

impl LiveStateTable {
    /// Last stored flag of a pair. Unseen pairs read as not live.
    pub async fn get_live(&self, creator_id: &str, platform_id: &str) -> Result<bool, DatabaseError> {
        let row: Option<(bool,)> = sqlx::query_as(
            "SELECT is_live FROM live_states WHERE creator_id = ? AND platform_id = ?",
        )
        .bind(creator_id)
        .bind(platform_id)
        .fetch_optional(&self.base.pool)
        .await?;
        Ok(row.is_some_and(|(is_live,)| is_live))
    }

    /// Creates or overwrites the flag of a pair in one statement.
    pub async fn set_live(
        &self,
        creator_id: &str,
        platform_id: &str,
        is_live: bool,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO live_states (creator_id, platform_id, is_live)
            VALUES (?, ?, ?)
            ON CONFLICT (creator_id, platform_id) DO UPDATE SET is_live = excluded.is_live
            "#,
        )
        .bind(creator_id)
        .bind(platform_id)
        .bind(is_live)
        .execute(&self.base.pool)
        .await?;
        Ok(())
    }

    pub async fn select(
        &self,
        creator_id: &str,
        platform_id: &str,
    ) -> Result<Option<LiveStateModel>, DatabaseError> {
        Ok(sqlx::query_as::<_, LiveStateModel>(
            "SELECT * FROM live_states WHERE creator_id = ? AND platform_id = ?",
        )
        .bind(creator_id)
        .bind(platform_id)
        .fetch_optional(&self.base.pool)
        .await?)
    }

    pub async fn select_all_by_creator(
        &self,
        creator_id: &str,
    ) -> Result<Vec<LiveStateModel>, DatabaseError> {
        Ok(sqlx::query_as::<_, LiveStateModel>(
            "SELECT * FROM live_states WHERE creator_id = ? ORDER BY platform_id",
        )
        .bind(creator_id)
        .fetch_all(&self.base.pool)
        .await?)
    }
}

// ============================================================================
// SubscriptionTable
// ============================================================================

impl_table_base!(SubscriptionTable, "subscriptions");

impl SubscriptionTable {
    /// Inserts the pair. Returns false if it already existed.
    pub async fn insert_or_ignore(&self, user_id: i64, creator_id: &str) -> Result<bool, DatabaseError> {
        let result =
            sqlx::query("INSERT OR IGNORE INTO subscriptions (user_id, creator_id) VALUES (?, ?)")
                .bind(user_id)
                .bind(creator_id)
                .execute(&self.base.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deletes the pair. Returns false if it did not exist.
    pub async fn delete(&self, user_id: i64, creator_id: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = ? AND creator_id = ?")
            .bind(user_id)
            .bind(creator_id)
            .execute(&self.base.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deletes every subscription of a user, returning how many were removed.
    pub async fn delete_all_by_user(&self, user_id: i64) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.base.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn exists(&self, user_id: i64, creator_id: &str) -> Result<bool, DatabaseError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM subscriptions WHERE user_id = ? AND creator_id = ? LIMIT 1")
                .bind(user_id)
                .bind(creator_id)
                .fetch_optional(&self.base.pool)
                .await?;
        Ok(row.is_some())
    }

    /// Get all users following a creator
    pub async fn select_user_ids_by_creator(&self, creator_id: &str) -> Result<Vec<i64>, DatabaseError> {
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT user_id FROM subscriptions WHERE creator_id = ? ORDER BY user_id")
                .bind(creator_id)
                .fetch_all(&self.base.pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Get all creators a user is following
    pub async fn select_creator_ids_by_user(&self, user_id: i64) -> Result<Vec<String>, DatabaseError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT creator_id FROM subscriptions WHERE user_id = ? ORDER BY creator_id")
                .bind(user_id)
                .fetch_all(&self.base.pool)
                .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn select_all(&self) -> Result<Vec<SubscriptionModel>, DatabaseError> {
        Ok(sqlx::query_as::<_, SubscriptionModel>("SELECT * FROM subscriptions")
            .fetch_all(&self.base.pool)
            .await?)
    }
}
