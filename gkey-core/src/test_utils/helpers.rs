// File: gkey-core/src/test_utils/helpers.rs

use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::warn;
use crate::db::Database;
use crate::Error;

/// Connection pool to the test DB named by `TEST_DATABASE_URL`.
/// Returns `None` when the variable is unset so Postgres tests can skip.
pub async fn create_test_db_pool() -> Result<Option<Pool<Postgres>>, Error> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(u) => u,
        Err(_) => {
            warn!("TEST_DATABASE_URL not set; skipping Postgres-backed test.");
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await?;

    Ok(Some(pool))
}

/// Returns a migrated test DB handle, or `None` when no test DB is configured.
/// Tests share the database, so they should use unique user/campaign ids
/// instead of truncating tables.
pub async fn setup_test_database() -> Result<Option<Database>, Error> {
    let Some(pool) = create_test_db_pool().await? else {
        return Ok(None);
    };
    let db = Database::from_pool(pool);
    db.migrate().await?;
    Ok(Some(db))
}

/// Inserts or replaces a row in the campaign read model.
pub async fn upsert_test_campaign(
    pool: &Pool<Postgres>,
    campaign_id: &str,
    brand_id: &str,
    categories: &[&str],
    status: &str,
) -> Result<(), Error> {
    let categories: Vec<String> = categories.iter().map(|c| c.to_string()).collect();
    sqlx::query(
        r#"
        INSERT INTO campaigns (campaign_id, brand_id, title, categories, status)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (campaign_id) DO UPDATE
        SET brand_id = EXCLUDED.brand_id,
            title = EXCLUDED.title,
            categories = EXCLUDED.categories,
            status = EXCLUDED.status
        "#,
    )
        .bind(campaign_id)
        .bind(brand_id)
        .bind(format!("Test campaign {}", campaign_id))
        .bind(&categories)
        .bind(status)
        .execute(pool)
        .await?;
    Ok(())
}
