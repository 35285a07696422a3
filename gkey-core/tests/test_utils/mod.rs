// File: gkey-core/tests/test_utils/mod.rs
#![allow(dead_code)]

use std::sync::Arc;
use chrono::{DateTime, TimeZone, Utc};
use gkey_core::catalog::default_catalog;
use gkey_core::models::CampaignInfo;
use gkey_core::repositories::{InMemoryCampaignLookup, InMemoryKeyRepository};
use gkey_core::utils::time::ManualClock;
use gkey_core::KeyLeaseManager;

pub const BRAND_A: &str = "brand-a";
pub const BRAND_B: &str = "brand-b";
pub const BRAND_C: &str = "brand-c";

pub struct Fixture {
    pub manager: Arc<KeyLeaseManager>,
    pub keys: InMemoryKeyRepository,
    pub campaigns: InMemoryCampaignLookup,
    pub clock: ManualClock,
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

/// Manager over in-memory stores, the built-in catalog and a frozen clock.
pub fn fixture() -> Fixture {
    let keys = InMemoryKeyRepository::new();
    let campaigns = InMemoryCampaignLookup::new();
    let clock = ManualClock::new(start_time());
    let manager = KeyLeaseManager::with_clock(
        Arc::new(keys.clone()),
        Arc::new(campaigns.clone()),
        Arc::new(default_catalog()),
        Arc::new(clock.clone()),
    );
    Fixture {
        manager: Arc::new(manager),
        keys,
        campaigns,
        clock,
    }
}

pub fn campaign(campaign_id: &str, brand_id: &str, categories: &[&str]) -> CampaignInfo {
    CampaignInfo {
        campaign_id: campaign_id.to_string(),
        brand_id: brand_id.to_string(),
        categories: categories.iter().map(|c| c.to_string()).collect(),
        title: Some(format!("Campaign {}", campaign_id)),
        status: Some("active".to_string()),
    }
}

impl Fixture {
    pub async fn add_campaign(&self, campaign_id: &str, brand_id: &str, categories: &[&str]) {
        self.campaigns.insert(campaign(campaign_id, brand_id, categories)).await;
    }

    /// Every stored key satisfies the status/field invariants.
    pub async fn assert_all_consistent(&self) {
        for key in self.keys.all_keys().await {
            assert!(key.is_consistent(), "inconsistent key: {:?}", key);
        }
    }
}
