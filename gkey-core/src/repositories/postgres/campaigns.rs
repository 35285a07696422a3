// File: gkey-core/src/repositories/postgres/campaigns.rs

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use gkey_common::error::Error;
use gkey_common::models::{CampaignInfo, normalize_category};
use gkey_common::traits::repository_traits::CampaignLookup;

/// Reads the campaign service's `campaigns` table. Never writes.
pub struct PostgresCampaignLookup {
    pub pool: Pool<Postgres>,
}

impl PostgresCampaignLookup {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn campaign_from_row(r: &PgRow) -> Result<CampaignInfo, Error> {
    Ok(CampaignInfo {
        campaign_id: r.try_get("campaign_id")?,
        brand_id: r.try_get("brand_id")?,
        categories: r.try_get("categories")?,
        title: r.try_get("title")?,
        status: r.try_get("status")?,
    })
}

#[async_trait]
impl CampaignLookup for PostgresCampaignLookup {
    async fn get_campaign(&self, campaign_id: &str) -> Result<Option<CampaignInfo>, Error> {
        let row_opt = sqlx::query(
            r#"
            SELECT campaign_id, brand_id, categories, title, status
            FROM campaigns
            WHERE campaign_id = $1
            "#,
        )
            .bind(campaign_id)
            .fetch_optional(&self.pool)
            .await?;

        row_opt.as_ref().map(campaign_from_row).transpose()
    }

    async fn list_active_campaigns(&self, category: &str) -> Result<Vec<CampaignInfo>, Error> {
        // Campaign categories are free-form casing; compare normalized.
        let rows = sqlx::query(
            r#"
            SELECT campaign_id, brand_id, categories, title, status
            FROM campaigns
            WHERE LOWER(status) = 'active'
              AND EXISTS (
                SELECT 1 FROM UNNEST(categories) AS c
                WHERE LOWER(TRIM(c)) = $1
              )
            ORDER BY created_at DESC
            "#,
        )
            .bind(normalize_category(category))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(campaign_from_row).collect()
    }
}
