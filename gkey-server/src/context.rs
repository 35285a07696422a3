//! gkey-server/src/context.rs
//!
//! Wires the database, repositories, catalog and key manager together.

use std::path::Path;
use std::sync::Arc;
use tracing::info;
use gkey_common::models::CategoryCatalog;
use gkey_core::catalog::load_catalog;
use gkey_core::repositories::{PostgresCampaignLookup, PostgresKeyRepository};
use gkey_core::{Database, Error, KeyLeaseManager};

use crate::Args;

pub struct ServerContext {
    pub db: Database,
    pub catalog: Arc<CategoryCatalog>,
    pub manager: Arc<KeyLeaseManager>,
}

impl ServerContext {
    pub async fn new(args: &Args) -> Result<Self, Error> {
        // Fail on a bad catalog before touching the database.
        let catalog = Arc::new(load_catalog(args.catalog.as_deref().map(Path::new))?);

        let db = Database::with_max_connections(&args.database_url, args.max_connections).await?;
        db.migrate().await?;

        let key_repo = Arc::new(PostgresKeyRepository::new(db.pool().clone()));
        let campaigns = Arc::new(PostgresCampaignLookup::new(db.pool().clone()));
        let manager = Arc::new(KeyLeaseManager::new(key_repo, campaigns, catalog.clone()));

        info!("Server context ready ({} categories).", catalog.len());
        Ok(Self { db, catalog, manager })
    }
}
