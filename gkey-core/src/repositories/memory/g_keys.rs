// File: gkey-core/src/repositories/memory/g_keys.rs

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;
use gkey_common::error::Error;
use gkey_common::models::{CooloffRelease, GKey, KeyStatus};
use gkey_common::traits::repository_traits::KeyRepository;

type KeyMap = HashMap<(String, String), GKey>;

/// In-memory key store. Each method holds the map lock across its whole
/// check-and-write.
#[derive(Clone, Default)]
pub struct InMemoryKeyRepository {
    keys: Arc<Mutex<KeyMap>>,
}

impl InMemoryKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw snapshot of every stored key, for assertions.
    pub async fn all_keys(&self) -> Vec<GKey> {
        let keys = self.keys.lock().await;
        keys.values().cloned().collect()
    }

    /// Overwrites a stored key wholesale. Test setup only.
    pub async fn put_key(&self, key: GKey) {
        let mut keys = self.keys.lock().await;
        keys.insert((key.user_id.clone(), key.category.clone()), key);
    }
}

fn sorted(mut list: Vec<GKey>) -> Vec<GKey> {
    list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.category.cmp(&b.category)));
    list
}

#[async_trait]
impl KeyRepository for InMemoryKeyRepository {
    async fn get_key(&self, user_id: &str, category: &str) -> Result<Option<GKey>, Error> {
        let keys = self.keys.lock().await;
        Ok(keys.get(&(user_id.to_string(), category.to_string())).cloned())
    }

    async fn list_keys_for_user(&self, user_id: &str) -> Result<Vec<GKey>, Error> {
        let keys = self.keys.lock().await;
        let list = keys
            .values()
            .filter(|k| k.user_id == user_id)
            .cloned()
            .collect();
        Ok(sorted(list))
    }

    async fn insert_keys(&self, new_keys: &[GKey]) -> Result<u64, Error> {
        let mut keys = self.keys.lock().await;
        let mut inserted = 0u64;
        for key in new_keys {
            let id = (key.user_id.clone(), key.category.clone());
            if !keys.contains_key(&id) {
                keys.insert(id, key.clone());
                inserted += 1;
            }
        }
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
        let mut keys = self.keys.lock().await;
        match keys.get_mut(&(user_id.to_string(), category.to_string())) {
            Some(key) if key.can_lock_for(brand_id) => {
                key.lock(campaign_id, now);
                Ok(Some(key.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn find_locked_key(&self, user_id: &str, campaign_id: &str) -> Result<Option<GKey>, Error> {
        let keys = self.keys.lock().await;
        let found = keys
            .values()
            .filter(|k| {
                k.user_id == user_id
                    && k.status == KeyStatus::Locked
                    && k.locked_with.as_deref() == Some(campaign_id)
            })
            .min_by_key(|k| k.locked_at)
            .cloned();
        Ok(found)
    }

    async fn release_key(
        &self,
        key_id: Uuid,
        campaign_id: &str,
        release: &CooloffRelease,
        now: DateTime<Utc>,
    ) -> Result<Option<GKey>, Error> {
        let mut keys = self.keys.lock().await;
        let target = keys.values_mut().find(|k| {
            k.key_id == key_id
                && k.status == KeyStatus::Locked
                && k.locked_with.as_deref() == Some(campaign_id)
        });
        match target {
            Some(key) => {
                key.start_cooloff(release, now);
                Ok(Some(key.clone()))
            }
            None => Ok(None),
        }
    }

    async fn expire_cooloffs(&self, now: DateTime<Utc>) -> Result<u64, Error> {
        let mut keys = self.keys.lock().await;
        let mut changed = 0u64;
        for key in keys.values_mut() {
            let due = key.status == KeyStatus::Cooloff
                && key.cooloff_ends_at.map(|ends| ends <= now).unwrap_or(false);
            if due {
                key.make_available(now);
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn reset_key(&self, user_id: &str, category: &str, now: DateTime<Utc>) -> Result<Option<GKey>, Error> {
        let mut keys = self.keys.lock().await;
        match keys.get_mut(&(user_id.to_string(), category.to_string())) {
            Some(key) => {
                key.make_available(now);
                Ok(Some(key.clone()))
            }
            None => Ok(None),
        }
    }

    async fn list_user_ids(&self) -> Result<Vec<String>, Error> {
        let keys = self.keys.lock().await;
        let ids: BTreeSet<String> = keys.values().map(|k| k.user_id.clone()).collect();
        Ok(ids.into_iter().collect())
    }
}
