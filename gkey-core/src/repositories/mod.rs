// src/repositories/mod.rs

pub mod postgres;
pub mod memory;

pub use gkey_common::traits::repository_traits::{CampaignLookup, KeyRepository};
pub use postgres::{PostgresCampaignLookup, PostgresKeyRepository};
pub use memory::{InMemoryCampaignLookup, InMemoryKeyRepository};
