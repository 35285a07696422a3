// File: src/services/mod.rs

pub mod key_lease_service;

pub use key_lease_service::KeyLeaseManager;
