// ================================================================
// File: gkey-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// `consume` found no category with a lockable key.
    #[error("No eligible key for categories [{}]: {reason}", .categories.join(", "))]
    NoEligibleKey {
        categories: Vec<String>,
        reason: String,
    },

    /// `release` found no key locked with the campaign for this user.
    #[error("No locked key for user '{user_id}' and campaign '{campaign_id}'")]
    NoLockedKey {
        user_id: String,
        campaign_id: String,
    },

    #[error("Key not found for user '{user_id}' and category '{category}'")]
    LeaseNotFound {
        user_id: String,
        category: String,
    },

    #[error("Campaign not found: {0}")]
    CampaignNotFound(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Invalid cooloff hours: {0}")]
    InvalidCooloffHours(i32),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    /// True for errors the caller can correct (bad category, wrong campaign,
    /// key state that forbids the action). Infrastructure failures are false.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::NoEligibleKey { .. }
                | Error::NoLockedKey { .. }
                | Error::LeaseNotFound { .. }
                | Error::CampaignNotFound(_)
                | Error::UnknownCategory(_)
                | Error::InvalidCooloffHours(_)
        )
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

impl From<uuid::Error> for Error {
    fn from(err: uuid::Error) -> Self {
        Error::Parse(err.to_string())
    }
}
