// src/repositories/memory/mod.rs
//
// Process-local stores. Used by tests and by embedders without Postgres.

pub mod g_keys;
pub mod campaigns;

pub use g_keys::InMemoryKeyRepository;
pub use campaigns::InMemoryCampaignLookup;
