// File: gkey-core/src/repositories/memory/campaigns.rs

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::RwLock;
use gkey_common::error::Error;
use gkey_common::models::{CampaignInfo, normalize_category};
use gkey_common::traits::repository_traits::CampaignLookup;

#[derive(Clone, Default)]
pub struct InMemoryCampaignLookup {
    campaigns: Arc<RwLock<HashMap<String, CampaignInfo>>>,
}

impl InMemoryCampaignLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, campaign: CampaignInfo) {
        let mut campaigns = self.campaigns.write().await;
        campaigns.insert(campaign.campaign_id.clone(), campaign);
    }

    pub async fn remove(&self, campaign_id: &str) -> Option<CampaignInfo> {
        let mut campaigns = self.campaigns.write().await;
        campaigns.remove(campaign_id)
    }
}

#[async_trait]
impl CampaignLookup for InMemoryCampaignLookup {
    async fn get_campaign(&self, campaign_id: &str) -> Result<Option<CampaignInfo>, Error> {
        let campaigns = self.campaigns.read().await;
        Ok(campaigns.get(campaign_id).cloned())
    }

    async fn list_active_campaigns(&self, category: &str) -> Result<Vec<CampaignInfo>, Error> {
        let slug = normalize_category(category);
        let campaigns = self.campaigns.read().await;
        let mut list: Vec<CampaignInfo> = campaigns
            .values()
            .filter(|c| {
                c.status
                    .as_deref()
                    .map(|s| s.eq_ignore_ascii_case("active"))
                    .unwrap_or(true)
            })
            .filter(|c| c.categories.iter().any(|cat| normalize_category(cat) == slug))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.campaign_id.cmp(&b.campaign_id));
        Ok(list)
    }
}
