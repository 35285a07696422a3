// gkey-core/src/tasks/catalog_backfill.rs

use tracing::info;
use crate::services::KeyLeaseManager;
use crate::Error;

/// Gives every known user a key for each catalog category. Run after a
/// catalog change is deployed.
pub async fn run_catalog_backfill(manager: &KeyLeaseManager) -> Result<(usize, usize), Error> {
    info!("Starting catalog backfill ({} categories)...", manager.catalog().len());
    let (users, created) = manager.backfill_catalog().await?;
    info!("Catalog backfill done: {} user(s) checked, {} key(s) created.", users, created);
    Ok((users, created))
}
