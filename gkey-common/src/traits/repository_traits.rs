use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::error::Error;
use crate::models::{CampaignInfo, CooloffRelease, GKey};

/// Persistence for keys. Every state transition is a single conditional
/// write so concurrent callers cannot both win the same key.
#[async_trait]
pub trait KeyRepository: Send + Sync {
    async fn get_key(&self, user_id: &str, category: &str) -> Result<Option<GKey>, Error>;

    async fn list_keys_for_user(&self, user_id: &str) -> Result<Vec<GKey>, Error>;

    /// Inserts keys, skipping any (user_id, category) that already exists.
    /// Returns the number of rows actually inserted.
    async fn insert_keys(&self, keys: &[GKey]) -> Result<u64, Error>;

    /// Locks the key if it is `available`, or `cooloff` with `last_brand_id == brand_id`.
    /// Returns `None` when the key is missing or the predicate did not match.
    async fn try_lock_key(
        &self,
        user_id: &str,
        category: &str,
        campaign_id: &str,
        brand_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<GKey>, Error>;

    async fn find_locked_key(&self, user_id: &str, campaign_id: &str) -> Result<Option<GKey>, Error>;

    /// Moves a key still locked with `campaign_id` into cooloff.
    /// Returns `None` when the key is no longer locked with that campaign.
    async fn release_key(
        &self,
        key_id: Uuid,
        campaign_id: &str,
        release: &CooloffRelease,
        now: DateTime<Utc>,
    ) -> Result<Option<GKey>, Error>;

    /// Every `cooloff` key whose deadline is `<= now` becomes `available`.
    async fn expire_cooloffs(&self, now: DateTime<Utc>) -> Result<u64, Error>;

    /// Unconditionally clears lock and cooloff state.
    async fn reset_key(&self, user_id: &str, category: &str, now: DateTime<Utc>) -> Result<Option<GKey>, Error>;

    /// Distinct user ids that own at least one key.
    async fn list_user_ids(&self) -> Result<Vec<String>, Error>;
}

/// Read-only access to the campaign store.
#[async_trait]
pub trait CampaignLookup: Send + Sync {
    async fn get_campaign(&self, campaign_id: &str) -> Result<Option<CampaignInfo>, Error>;

    /// Active campaigns tagged with `category`. Reporting only.
    async fn list_active_campaigns(&self, category: &str) -> Result<Vec<CampaignInfo>, Error> {
        let _ = category;
        Ok(Vec::new())
    }
}
