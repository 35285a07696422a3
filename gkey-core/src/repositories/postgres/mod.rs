// src/repositories/postgres/mod.rs

pub mod g_keys;
pub mod campaigns;

pub use g_keys::PostgresKeyRepository;
pub use campaigns::PostgresCampaignLookup;
