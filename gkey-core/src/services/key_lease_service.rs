// File: gkey-core/src/services/key_lease_service.rs

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use gkey_common::models::{
    normalize_categories, normalize_category, CampaignInfo, CategoryCatalog, CooloffRelease,
    Eligibility, GKey, KeyDiagnostic, KeyStatus, KeySummary, KeySummaryEntry,
};
use gkey_common::traits::repository_traits::{CampaignLookup, KeyRepository};
use crate::catalog::DEFAULT_COOLOFF_HOURS;
use crate::utils::time::{format_duration_ms, Clock, SystemClock};
use crate::Error;

/// Owns the lifecycle of every (user, category) key and decides whether a
/// user may join a campaign. Holds no key state of its own; the
/// `KeyRepository` is the single source of truth.
pub struct KeyLeaseManager {
    key_repo: Arc<dyn KeyRepository + Send + Sync>,
    campaigns: Arc<dyn CampaignLookup + Send + Sync>,
    catalog: Arc<CategoryCatalog>,
    clock: Arc<dyn Clock>,
}

impl KeyLeaseManager {
    pub fn new(
        key_repo: Arc<dyn KeyRepository + Send + Sync>,
        campaigns: Arc<dyn CampaignLookup + Send + Sync>,
        catalog: Arc<CategoryCatalog>,
    ) -> Self {
        Self::with_clock(key_repo, campaigns, catalog, Arc::new(SystemClock))
    }

    pub fn with_clock(
        key_repo: Arc<dyn KeyRepository + Send + Sync>,
        campaigns: Arc<dyn CampaignLookup + Send + Sync>,
        catalog: Arc<CategoryCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            key_repo,
            campaigns,
            catalog,
            clock,
        }
    }

    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    /// Creates any catalog category the user has no key for. Existing keys are
    /// never touched. Returns the user's full key set in catalog order.
    pub async fn ensure_catalog_for_user(&self, user_id: &str) -> Result<Vec<GKey>, Error> {
        let existing = self.key_repo.list_keys_for_user(user_id).await?;
        let present: HashSet<&str> = existing.iter().map(|k| k.category.as_str()).collect();

        let now = self.clock.now();
        let missing: Vec<GKey> = self
            .catalog
            .slugs()
            .filter(|slug| !present.contains(slug))
            .map(|slug| GKey::new(user_id, slug, now))
            .collect();

        if missing.is_empty() {
            return Ok(self.in_catalog_order(existing));
        }

        let inserted = self.key_repo.insert_keys(&missing).await?;
        if inserted > 0 {
            info!("Created {} key(s) for user_id={}", inserted, user_id);
        }

        let keys = self.key_repo.list_keys_for_user(user_id).await?;
        Ok(self.in_catalog_order(keys))
    }

    /// Dashboard read: sweeps due cooloffs, backfills, then lists.
    pub async fn list_keys(&self, user_id: &str) -> Result<Vec<GKey>, Error> {
        self.expire_due_cooloffs().await?;
        self.ensure_catalog_for_user(user_id).await
    }

    pub async fn get_key(&self, user_id: &str, category: &str) -> Result<GKey, Error> {
        let slug = normalize_category(category);
        self.key_repo
            .get_key(user_id, &slug)
            .await?
            .ok_or_else(|| Error::LeaseNotFound {
                user_id: user_id.to_string(),
                category: slug,
            })
    }

    /// Read-only. A missing key is reported as `Eligibility::Missing`, not created.
    pub async fn check_eligibility(
        &self,
        user_id: &str,
        category: &str,
        brand_id: Option<&str>,
    ) -> Result<Eligibility, Error> {
        let slug = normalize_category(category);
        let key = self.key_repo.get_key(user_id, &slug).await?;
        let eligibility = match key {
            Some(k) => eligibility_of(&k, brand_id, self.clock.now()),
            None => Eligibility::Missing,
        };
        debug!(
            "Eligibility user_id={} category={} brand={:?} => {:?}",
            user_id, slug, brand_id, eligibility
        );
        Ok(eligibility)
    }

    pub async fn is_eligible(
        &self,
        user_id: &str,
        category: &str,
        brand_id: Option<&str>,
    ) -> Result<bool, Error> {
        Ok(self.check_eligibility(user_id, category, brand_id).await?.is_eligible())
    }

    /// Locks the first key, in the campaign's category order, that is available
    /// or cooling off with this same brand.
    pub async fn consume<S: AsRef<str>>(
        &self,
        user_id: &str,
        campaign_id: &str,
        campaign_categories: &[S],
        campaign_brand_id: &str,
    ) -> Result<GKey, Error> {
        let categories = normalize_categories(campaign_categories);
        if categories.is_empty() {
            return Err(Error::NoEligibleKey {
                categories,
                reason: "campaign has no categories".to_string(),
            });
        }

        let now = self.clock.now();
        for category in &categories {
            let locked = self
                .key_repo
                .try_lock_key(user_id, category, campaign_id, campaign_brand_id, now)
                .await?;
            if let Some(key) = locked {
                info!(
                    "Locked key user_id={} category={} campaign_id={} brand_id={}",
                    user_id, category, campaign_id, campaign_brand_id
                );
                return Ok(key);
            }
        }

        let reason = self
            .describe_blockers(user_id, &categories, campaign_brand_id, now)
            .await?;
        debug!("No eligible key for user_id={} campaign_id={}: {}", user_id, campaign_id, reason);
        Err(Error::NoEligibleKey { categories, reason })
    }

    /// Join workflow entry point: resolves the campaign, backfills the user's
    /// keys and then consumes.
    pub async fn consume_for_campaign(&self, user_id: &str, campaign_id: &str) -> Result<GKey, Error> {
        let campaign = self.require_campaign(campaign_id).await?;
        self.ensure_catalog_for_user(user_id).await?;
        self.consume(user_id, campaign_id, &campaign.categories, &campaign.brand_id)
            .await
    }

    /// Ends a participation: the key locked with `campaign_id` goes into cooloff.
    ///
    /// Cooloff length is the override, else the category default, else
    /// `DEFAULT_COOLOFF_HOURS`. When the campaign's brand matches the key's
    /// last brand, the longer of that and the brand's previous cooloff applies.
    pub async fn release(
        &self,
        user_id: &str,
        campaign_id: &str,
        cooloff_hours: Option<i32>,
    ) -> Result<GKey, Error> {
        if let Some(hours) = cooloff_hours {
            if hours < 0 {
                return Err(Error::InvalidCooloffHours(hours));
            }
        }

        let no_locked_key = || Error::NoLockedKey {
            user_id: user_id.to_string(),
            campaign_id: campaign_id.to_string(),
        };

        let key = self
            .key_repo
            .find_locked_key(user_id, campaign_id)
            .await?
            .ok_or_else(no_locked_key)?;
        let campaign = self.require_campaign(campaign_id).await?;

        let requested = self.resolve_cooloff_hours(&key.category, cooloff_hours);
        let same_brand = key.last_brand_id.as_deref() == Some(campaign.brand_id.as_str());
        let final_hours = if same_brand {
            requested.max(key.last_brand_cooloff_hours.unwrap_or(0))
        } else {
            requested
        };

        let now = self.clock.now();
        let release = CooloffRelease {
            brand_id: campaign.brand_id.clone(),
            cooloff_hours: final_hours,
            cooloff_ends_at: now + Duration::hours(i64::from(final_hours)),
        };

        let released = self
            .key_repo
            .release_key(key.key_id, campaign_id, &release, now)
            .await?
            .ok_or_else(no_locked_key)?;

        info!(
            "Released key user_id={} category={} campaign_id={} brand_id={} cooloff_hours={} (requested {}, same_brand={})",
            user_id, released.category, campaign_id, campaign.brand_id, final_hours, requested, same_brand
        );
        Ok(released)
    }

    /// Makes every cooloff whose deadline has passed available again.
    pub async fn expire_due_cooloffs(&self) -> Result<u64, Error> {
        let changed = self.key_repo.expire_cooloffs(self.clock.now()).await?;
        if changed > 0 {
            info!("Expired {} cooloff key(s)", changed);
        }
        Ok(changed)
    }

    /// Admin escape hatch: clears lock and cooloff state regardless of why it was set.
    pub async fn force_unlock(&self, user_id: &str, category: &str) -> Result<GKey, Error> {
        let slug = normalize_category(category);
        let previous = self.key_repo.get_key(user_id, &slug).await?;

        let key = self
            .key_repo
            .reset_key(user_id, &slug, self.clock.now())
            .await?
            .ok_or_else(|| Error::LeaseNotFound {
                user_id: user_id.to_string(),
                category: slug.clone(),
            })?;

        let (prev_status, prev_campaign) = previous
            .map(|p| (p.status, p.locked_with))
            .unwrap_or((KeyStatus::Available, None));
        warn!(
            "FORCE UNLOCK user_id={} category={} previous_status={} previous_campaign={:?}",
            user_id, slug, prev_status, prev_campaign
        );
        Ok(key)
    }

    pub async fn summarize(&self, user_id: &str) -> Result<KeySummary, Error> {
        let keys = self.list_keys(user_id).await?;
        let now = self.clock.now();

        let count = |status: KeyStatus| keys.iter().filter(|k| k.status == status).count();
        let entries: Vec<KeySummaryEntry> = keys
            .iter()
            .map(|k| {
                let definition = self.catalog.get(&k.category);
                let remaining = k.cooloff_remaining_ms(now);
                KeySummaryEntry {
                    category: k.category.clone(),
                    display_name: definition.map(|d| d.display_name.clone()),
                    color: definition.map(|d| d.color.clone()),
                    status: k.status,
                    completions: k.usage_count,
                    locked_with: k.locked_with.clone(),
                    cooloff_ends_at: k.cooloff_ends_at,
                    time_remaining: remaining,
                    cooloff_time_formatted: remaining.map(format_duration_ms),
                    last_brand_id: k.last_brand_id.clone(),
                }
            })
            .collect();

        Ok(KeySummary {
            user_id: user_id.to_string(),
            total_keys: keys.len(),
            available: count(KeyStatus::Available),
            locked: count(KeyStatus::Locked),
            cooloff: count(KeyStatus::Cooloff),
            total_completions: keys.iter().map(|k| i64::from(k.usage_count)).sum(),
            keys: entries,
            generated_at: now,
        })
    }

    /// Runs `ensure_catalog_for_user` for every user already holding a key.
    /// Returns (users visited, keys created).
    pub async fn backfill_catalog(&self) -> Result<(usize, usize), Error> {
        let user_ids = self.key_repo.list_user_ids().await?;
        let mut created = 0usize;
        for user_id in &user_ids {
            let before = self.key_repo.list_keys_for_user(user_id).await?.len();
            let after = self.ensure_catalog_for_user(user_id).await?.len();
            created += after.saturating_sub(before);
        }
        Ok((user_ids.len(), created))
    }

    /// Support view: every key with its catalog entry, eligibility for an
    /// unnamed brand, and the campaign it is locked with if still known.
    pub async fn inspect_user(&self, user_id: &str) -> Result<Vec<KeyDiagnostic>, Error> {
        let keys = self.in_catalog_order(self.key_repo.list_keys_for_user(user_id).await?);
        let now = self.clock.now();

        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let active_campaign = match key.locked_with.as_deref() {
                Some(campaign_id) => self.campaigns.get_campaign(campaign_id).await?,
                None => None,
            };
            let definition = self.catalog.get(&key.category).cloned();
            out.push(KeyDiagnostic {
                eligibility: eligibility_of(&key, None, now),
                in_catalog: definition.is_some(),
                definition,
                active_campaign,
                key,
            });
        }
        Ok(out)
    }

    pub async fn active_campaigns_for_category(&self, category: &str) -> Result<Vec<CampaignInfo>, Error> {
        let slug = normalize_category(category);
        if !self.catalog.contains(&slug) {
            return Err(Error::UnknownCategory(slug));
        }
        self.campaigns.list_active_campaigns(&slug).await
    }

    async fn require_campaign(&self, campaign_id: &str) -> Result<CampaignInfo, Error> {
        self.campaigns
            .get_campaign(campaign_id)
            .await?
            .ok_or_else(|| Error::CampaignNotFound(campaign_id.to_string()))
    }

    fn resolve_cooloff_hours(&self, category: &str, requested: Option<i32>) -> i32 {
        requested
            .or_else(|| self.catalog.get(category).map(|d| d.default_cooloff_hours))
            .unwrap_or(DEFAULT_COOLOFF_HOURS)
    }

    async fn describe_blockers(
        &self,
        user_id: &str,
        categories: &[String],
        brand_id: &str,
        now: DateTime<Utc>,
    ) -> Result<String, Error> {
        let mut parts = Vec::with_capacity(categories.len());
        for category in categories {
            let key = self.key_repo.get_key(user_id, category).await?;
            let part = match key.map(|k| eligibility_of(&k, Some(brand_id), now)) {
                None | Some(Eligibility::Missing) => format!("{}: no key", category),
                Some(Eligibility::Locked { campaign_id }) => format!(
                    "{}: locked by active campaign {}",
                    category,
                    campaign_id.unwrap_or_else(|| "unknown".to_string())
                ),
                Some(Eligibility::CrossBrandCooloff { last_brand_id, remaining_ms, .. }) => format!(
                    "{}: in cooloff with brand {} ({} remaining)",
                    category,
                    last_brand_id.unwrap_or_else(|| "unknown".to_string()),
                    format_duration_ms(remaining_ms)
                ),
                Some(Eligibility::Available) | Some(Eligibility::SameBrandCooloff { .. }) => {
                    format!("{}: claimed by a concurrent request", category)
                }
            };
            parts.push(part);
        }
        Ok(parts.join("; "))
    }

    fn in_catalog_order(&self, mut keys: Vec<GKey>) -> Vec<GKey> {
        keys.sort_by(|a, b| {
            match (self.catalog.position(&a.category), self.catalog.position(&b.category)) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a.category.cmp(&b.category),
            }
        });
        keys
    }
}

fn eligibility_of(key: &GKey, brand_id: Option<&str>, now: DateTime<Utc>) -> Eligibility {
    match key.status {
        KeyStatus::Available => Eligibility::Available,
        KeyStatus::Locked => Eligibility::Locked {
            campaign_id: key.locked_with.clone(),
        },
        KeyStatus::Cooloff => {
            let same_brand = brand_id.is_some() && key.last_brand_id.as_deref() == brand_id;
            if same_brand {
                Eligibility::SameBrandCooloff {
                    ends_at: key.cooloff_ends_at,
                }
            } else {
                Eligibility::CrossBrandCooloff {
                    last_brand_id: key.last_brand_id.clone(),
                    ends_at: key.cooloff_ends_at,
                    remaining_ms: key.cooloff_remaining_ms(now).unwrap_or(0),
                }
            }
        }
    }
}
