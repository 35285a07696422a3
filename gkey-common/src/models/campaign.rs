// File: gkey-common/src/models/campaign.rs

use serde::{Deserialize, Serialize};

/// The slice of a campaign the key manager reads. Owned by the campaign store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CampaignInfo {
    pub campaign_id: String,
    pub brand_id: String,
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
