// File: gkey-common/src/models/mod.rs
pub mod g_key;
pub mod catalog;
pub mod campaign;
pub mod summary;

pub use g_key::{GKey, KeyStatus, CooloffRelease};
pub use catalog::{CategoryCatalog, CategoryDefinition, normalize_category, normalize_categories};
pub use campaign::CampaignInfo;
pub use summary::{Eligibility, KeyDiagnostic, KeySummary, KeySummaryEntry};
