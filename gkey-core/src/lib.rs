// src/lib.rs

pub mod db;
pub mod repositories;
pub mod catalog;
pub mod services;
pub mod tasks;
pub mod utils;
pub mod test_utils;

pub use db::Database;
pub use gkey_common::error::Error;
pub use gkey_common::models;
pub use services::key_lease_service::KeyLeaseManager;
