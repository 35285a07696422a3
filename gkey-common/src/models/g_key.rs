// File: gkey-common/src/models/g_key.rs

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored as TEXT in `g_keys.status`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    Available,
    Locked,
    Cooloff,
}

impl KeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStatus::Available => "available",
            KeyStatus::Locked => "locked",
            KeyStatus::Cooloff => "cooloff",
        }
    }
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "available" => Ok(KeyStatus::Available),
            "locked" => Ok(KeyStatus::Locked),
            "cooloff" => Ok(KeyStatus::Cooloff),
            _ => Err(format!("Unknown key status: {}", s)),
        }
    }
}

/// One campaign-participation key per (user, category).
///
/// A key moves `available -> locked -> cooloff -> available`. The only way back
/// to `available` from `cooloff` is the expiry sweep (or an admin reset).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GKey {
    pub key_id: Uuid,
    pub user_id: String,
    pub category: String,
    pub status: KeyStatus,

    /// Completed participations (lock -> cooloff transitions).
    pub usage_count: i32,

    pub locked_with: Option<String>,
    pub locked_at: Option<DateTime<Utc>>,
    pub cooloff_ends_at: Option<DateTime<Utc>>,
    pub last_used: Option<DateTime<Utc>>,

    /// Brand of the most recent completed participation. Drives the
    /// same-brand exception and "highest cooloff wins".
    pub last_brand_id: Option<String>,
    pub last_brand_cooloff_hours: Option<i32>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The cooloff a release writes onto a locked key.
#[derive(Debug, Clone, PartialEq)]
pub struct CooloffRelease {
    pub brand_id: String,
    pub cooloff_hours: i32,
    pub cooloff_ends_at: DateTime<Utc>,
}

impl GKey {
    pub fn new(user_id: &str, category: &str, now: DateTime<Utc>) -> Self {
        Self {
            key_id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            category: category.to_string(),
            status: KeyStatus::Available,
            usage_count: 0,
            locked_with: None,
            locked_at: None,
            cooloff_ends_at: None,
            last_used: None,
            last_brand_id: None,
            last_brand_cooloff_hours: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Lock predicate: available, or cooling off with this same brand.
    /// The Postgres `try_lock_key` WHERE clause encodes the same rule.
    pub fn can_lock_for(&self, brand_id: &str) -> bool {
        match self.status {
            KeyStatus::Available => true,
            KeyStatus::Cooloff => self.last_brand_id.as_deref() == Some(brand_id),
            KeyStatus::Locked => false,
        }
    }

    /// Status and lock/cooloff fields agree with each other.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            KeyStatus::Available => {
                self.locked_with.is_none() && self.locked_at.is_none() && self.cooloff_ends_at.is_none()
            }
            KeyStatus::Locked => {
                self.locked_with.is_some() && self.locked_at.is_some() && self.cooloff_ends_at.is_none()
            }
            KeyStatus::Cooloff => {
                self.cooloff_ends_at.is_some() && self.locked_with.is_none() && self.locked_at.is_none()
            }
        }
    }

    /// Milliseconds until the cooloff ends, floored at zero. `None` unless cooling off.
    pub fn cooloff_remaining_ms(&self, now: DateTime<Utc>) -> Option<i64> {
        match (self.status, self.cooloff_ends_at) {
            (KeyStatus::Cooloff, Some(ends_at)) => Some((ends_at - now).num_milliseconds().max(0)),
            _ => None,
        }
    }

    pub fn lock(&mut self, campaign_id: &str, now: DateTime<Utc>) {
        self.status = KeyStatus::Locked;
        self.locked_with = Some(campaign_id.to_string());
        self.locked_at = Some(now);
        self.cooloff_ends_at = None;
        self.updated_at = now;
    }

    pub fn start_cooloff(&mut self, release: &CooloffRelease, now: DateTime<Utc>) {
        self.status = KeyStatus::Cooloff;
        self.locked_with = None;
        self.locked_at = None;
        self.last_used = Some(now);
        self.usage_count += 1;
        self.cooloff_ends_at = Some(release.cooloff_ends_at);
        self.last_brand_id = Some(release.brand_id.clone());
        self.last_brand_cooloff_hours = Some(release.cooloff_hours);
        self.updated_at = now;
    }

    /// Clears lock and cooloff state. Usage and brand history are kept.
    pub fn make_available(&mut self, now: DateTime<Utc>) {
        self.status = KeyStatus::Available;
        self.locked_with = None;
        self.locked_at = None;
        self.cooloff_ends_at = None;
        self.updated_at = now;
    }
}
