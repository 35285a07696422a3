// File: gkey-core/src/repositories/postgres/g_keys.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;
use gkey_common::error::Error;
use gkey_common::models::{CooloffRelease, GKey, KeyStatus};
use gkey_common::traits::repository_traits::KeyRepository;

const KEY_COLUMNS: &str = r#"
    key_id,
    user_id,
    category,
    status,
    usage_count,
    locked_with,
    locked_at,
    cooloff_ends_at,
    last_used,
    last_brand_id,
    last_brand_cooloff_hours,
    created_at,
    updated_at
"#;

pub struct PostgresKeyRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresKeyRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn key_from_row(r: &PgRow) -> Result<GKey, Error> {
    let status: String = r.try_get("status")?;
    Ok(GKey {
        key_id: r.try_get("key_id")?,
        user_id: r.try_get("user_id")?,
        category: r.try_get("category")?,
        status: status.parse::<KeyStatus>()?,
        usage_count: r.try_get("usage_count")?,
        locked_with: r.try_get("locked_with")?,
        locked_at: r.try_get("locked_at")?,
        cooloff_ends_at: r.try_get("cooloff_ends_at")?,
        last_used: r.try_get("last_used")?,
        last_brand_id: r.try_get("last_brand_id")?,
        last_brand_cooloff_hours: r.try_get("last_brand_cooloff_hours")?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

#[async_trait]
impl KeyRepository for PostgresKeyRepository {
    async fn get_key(&self, user_id: &str, category: &str) -> Result<Option<GKey>, Error> {
        let sql = format!(
            "SELECT {KEY_COLUMNS} FROM g_keys WHERE user_id = $1 AND category = $2"
        );
        let row_opt = sqlx::query(&sql)
            .bind(user_id)
            .bind(category)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.as_ref().map(key_from_row).transpose()
    }

    async fn list_keys_for_user(&self, user_id: &str) -> Result<Vec<GKey>, Error> {
        let sql = format!(
            "SELECT {KEY_COLUMNS} FROM g_keys WHERE user_id = $1 ORDER BY created_at ASC, category ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(key_from_row).collect()
    }

    async fn insert_keys(&self, keys: &[GKey]) -> Result<u64, Error> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0u64;

        for key in keys {
            let result = sqlx::query(
                r#"
                INSERT INTO g_keys (
                    key_id,
                    user_id,
                    category,
                    status,
                    usage_count,
                    locked_with,
                    locked_at,
                    cooloff_ends_at,
                    last_used,
                    last_brand_id,
                    last_brand_cooloff_hours,
                    created_at,
                    updated_at
                )
                VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)
                ON CONFLICT (user_id, category) DO NOTHING
                "#,
            )
                .bind(key.key_id)
                .bind(&key.user_id)
                .bind(&key.category)
                .bind(key.status.as_str())
                .bind(key.usage_count)
                .bind(&key.locked_with)
                .bind(key.locked_at)
                .bind(key.cooloff_ends_at)
                .bind(key.last_used)
                .bind(&key.last_brand_id)
                .bind(key.last_brand_cooloff_hours)
                .bind(key.created_at)
                .bind(key.updated_at)
                .execute(&mut *tx)
                .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn try_lock_key(
        &self,
        user_id: &str,
        category: &str,
        campaign_id: &str,
        brand_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<GKey>, Error> {
        // Concurrent updaters of the same row re-check this WHERE clause after
        // the first commit, so only one of them gets a row back.
        let sql = format!(
            r#"
            UPDATE g_keys
            SET
              status = 'locked',
              locked_with = $3,
              locked_at = $5,
              cooloff_ends_at = NULL,
              updated_at = $5
            WHERE user_id = $1
              AND category = $2
              AND (
                status = 'available'
                OR (status = 'cooloff' AND last_brand_id = $4)
              )
            RETURNING {KEY_COLUMNS}
            "#
        );
        let row_opt = sqlx::query(&sql)
            .bind(user_id)
            .bind(category)
            .bind(campaign_id)
            .bind(brand_id)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.as_ref().map(key_from_row).transpose()
    }

    async fn find_locked_key(&self, user_id: &str, campaign_id: &str) -> Result<Option<GKey>, Error> {
        let sql = format!(
            r#"
            SELECT {KEY_COLUMNS}
            FROM g_keys
            WHERE user_id = $1
              AND status = 'locked'
              AND locked_with = $2
            ORDER BY locked_at ASC
            LIMIT 1
            "#
        );
        let row_opt = sqlx::query(&sql)
            .bind(user_id)
            .bind(campaign_id)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.as_ref().map(key_from_row).transpose()
    }

    async fn release_key(
        &self,
        key_id: Uuid,
        campaign_id: &str,
        release: &CooloffRelease,
        now: DateTime<Utc>,
    ) -> Result<Option<GKey>, Error> {
        let sql = format!(
            r#"
            UPDATE g_keys
            SET
              status = 'cooloff',
              locked_with = NULL,
              locked_at = NULL,
              last_used = $3,
              usage_count = usage_count + 1,
              cooloff_ends_at = $4,
              last_brand_id = $5,
              last_brand_cooloff_hours = $6,
              updated_at = $3
            WHERE key_id = $1
              AND status = 'locked'
              AND locked_with = $2
            RETURNING {KEY_COLUMNS}
            "#
        );
        let row_opt = sqlx::query(&sql)
            .bind(key_id)
            .bind(campaign_id)
            .bind(now)
            .bind(release.cooloff_ends_at)
            .bind(&release.brand_id)
            .bind(release.cooloff_hours)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.as_ref().map(key_from_row).transpose()
    }

    async fn expire_cooloffs(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query(
            r#"
            UPDATE g_keys
            SET
              status = 'available',
              cooloff_ends_at = NULL,
              updated_at = $1
            WHERE status = 'cooloff'
              AND cooloff_ends_at <= $1
            "#,
        )
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn reset_key(&self, user_id: &str, category: &str, now: DateTime<Utc>) -> Result<Option<GKey>, Error> {
        let sql = format!(
            r#"
            UPDATE g_keys
            SET
              status = 'available',
              locked_with = NULL,
              locked_at = NULL,
              cooloff_ends_at = NULL,
              updated_at = $3
            WHERE user_id = $1
              AND category = $2
            RETURNING {KEY_COLUMNS}
            "#
        );
        let row_opt = sqlx::query(&sql)
            .bind(user_id)
            .bind(category)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.as_ref().map(key_from_row).transpose()
    }

    async fn list_user_ids(&self) -> Result<Vec<String>, Error> {
        let rows = sqlx::query("SELECT DISTINCT user_id FROM g_keys ORDER BY user_id ASC")
            .fetch_all(&self.pool)
            .await?;

        let mut ids = Vec::with_capacity(rows.len());
        for r in rows {
            ids.push(r.try_get("user_id")?);
        }
        Ok(ids)
    }
}
