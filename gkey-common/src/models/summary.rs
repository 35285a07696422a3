// File: gkey-common/src/models/summary.rs
//
// Read models handed to dashboards and support tooling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::models::campaign::CampaignInfo;
use crate::models::catalog::CategoryDefinition;
use crate::models::g_key::{GKey, KeyStatus};

/// Why a key can or cannot be used to join a campaign right now.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Eligibility {
    Available,
    /// Cooling off, but with the brand asking.
    SameBrandCooloff {
        ends_at: Option<DateTime<Utc>>,
    },
    /// No key stored for this (user, category).
    Missing,
    Locked {
        campaign_id: Option<String>,
    },
    CrossBrandCooloff {
        last_brand_id: Option<String>,
        ends_at: Option<DateTime<Utc>>,
        remaining_ms: i64,
    },
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Available | Eligibility::SameBrandCooloff { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KeySummaryEntry {
    pub category: String,
    pub display_name: Option<String>,
    pub color: Option<String>,
    pub status: KeyStatus,
    pub completions: i32,
    pub locked_with: Option<String>,
    pub cooloff_ends_at: Option<DateTime<Utc>>,
    pub time_remaining: Option<i64>,
    pub cooloff_time_formatted: Option<String>,
    pub last_brand_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KeySummary {
    pub user_id: String,
    pub total_keys: usize,
    pub available: usize,
    pub locked: usize,
    pub cooloff: usize,
    pub total_completions: i64,
    pub keys: Vec<KeySummaryEntry>,
    pub generated_at: DateTime<Utc>,
}

impl KeySummary {
    pub fn entry(&self, category: &str) -> Option<&KeySummaryEntry> {
        self.keys.iter().find(|e| e.category == category)
    }
}

/// Support view of one key, cross-referenced with the campaign it is locked with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KeyDiagnostic {
    pub key: GKey,
    pub definition: Option<CategoryDefinition>,
    pub eligibility: Eligibility,
    pub active_campaign: Option<CampaignInfo>,
    pub in_catalog: bool,
}
