// gkey-core/src/tasks/cooloff_sweep.rs

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};
use crate::services::KeyLeaseManager;
use crate::Error;

/// Spawns a background task that expires due cooloffs every `interval`.
/// A failed sweep is logged and the loop keeps going.
pub fn spawn_cooloff_sweep_task(
    manager: Arc<KeyLeaseManager>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = run_cooloff_sweep(&manager).await {
                error!("Cooloff sweep failed: {:?}", e);
            }
        }
    })
}

/// One sweep. Returns how many keys went back to `available`.
pub async fn run_cooloff_sweep(manager: &KeyLeaseManager) -> Result<u64, Error> {
    let changed = manager.expire_due_cooloffs().await?;
    info!("Cooloff sweep complete; {} key(s) released from cooloff.", changed);
    Ok(changed)
}
