// File: gkey-core/tests/postgres_repository_tests.rs
//
// Runs only when TEST_DATABASE_URL points at a scratch Postgres database.

use std::sync::Arc;
use chrono::{Duration, TimeZone, Utc};
use futures_util::future::join_all;
use uuid::Uuid;
use gkey_core::catalog::default_catalog;
use gkey_core::models::{CooloffRelease, GKey, KeyStatus};
use gkey_core::repositories::{
    CampaignLookup, KeyRepository, PostgresCampaignLookup, PostgresKeyRepository,
};
use gkey_core::test_utils::helpers::{setup_test_database, upsert_test_campaign};
use gkey_core::utils::time::ManualClock;
use gkey_core::{Error, KeyLeaseManager};

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

#[tokio::test]
async fn test_insert_keys_is_idempotent() -> Result<(), Error> {
    let Some(db) = setup_test_database().await? else { return Ok(()) };
    let repo = PostgresKeyRepository::new(db.pool().clone());
    let user = unique("user");
    let now = Utc::now();

    let keys = vec![GKey::new(&user, "gaming", now), GKey::new(&user, "tech", now)];
    assert_eq!(repo.insert_keys(&keys).await?, 2);

    let dupes = vec![GKey::new(&user, "gaming", now), GKey::new(&user, "music", now)];
    assert_eq!(repo.insert_keys(&dupes).await?, 1);

    let stored = repo.list_keys_for_user(&user).await?;
    assert_eq!(stored.len(), 3);
    let gaming = stored.iter().find(|k| k.category == "gaming").unwrap();
    assert_eq!(gaming.key_id, keys[0].key_id);
    Ok(())
}

#[tokio::test]
async fn test_lock_release_expire_round() -> Result<(), Error> {
    let Some(db) = setup_test_database().await? else { return Ok(()) };
    let repo = PostgresKeyRepository::new(db.pool().clone());
    let user = unique("user");
    let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    repo.insert_keys(&[GKey::new(&user, "gaming", t0)]).await?;

    let locked = repo.try_lock_key(&user, "gaming", "c1", "brand-a", t0).await?.unwrap();
    assert_eq!(locked.status, KeyStatus::Locked);
    assert!(repo.try_lock_key(&user, "gaming", "c2", "brand-a", t0).await?.is_none());

    let found = repo.find_locked_key(&user, "c1").await?.unwrap();
    let release = CooloffRelease {
        brand_id: "brand-a".into(),
        cooloff_hours: 10,
        cooloff_ends_at: t0 + Duration::hours(10),
    };
    let cooling = repo.release_key(found.key_id, "c1", &release, t0).await?.unwrap();
    assert_eq!(cooling.status, KeyStatus::Cooloff);
    assert_eq!(cooling.usage_count, 1);
    assert!(cooling.is_consistent());
    assert!(repo.release_key(found.key_id, "c1", &release, t0).await?.is_none());

    // Other brand blocked, same brand allowed.
    assert!(repo.try_lock_key(&user, "gaming", "c3", "brand-b", t0).await?.is_none());

    repo.expire_cooloffs(t0 + Duration::hours(10)).await?;
    let key = repo.get_key(&user, "gaming").await?.unwrap();
    assert_eq!(key.status, KeyStatus::Available);
    assert!(key.cooloff_ends_at.is_none());
    Ok(())
}

#[tokio::test]
async fn test_postgres_single_winner_locking() -> Result<(), Error> {
    let Some(db) = setup_test_database().await? else { return Ok(()) };
    let repo = Arc::new(PostgresKeyRepository::new(db.pool().clone()));
    let user = unique("user");
    repo.insert_keys(&[GKey::new(&user, "gaming", Utc::now())]).await?;

    let handles = (0..16).map(|i| {
        let repo = Arc::clone(&repo);
        let user = user.clone();
        tokio::spawn(async move {
            repo.try_lock_key(&user, "gaming", &format!("c{}", i), "brand-a", Utc::now())
                .await
        })
    });

    let mut winners = 0;
    for joined in join_all(handles).await {
        if joined??.is_some() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
    Ok(())
}

#[tokio::test]
async fn test_manager_over_postgres() -> Result<(), Error> {
    let Some(db) = setup_test_database().await? else { return Ok(()) };
    let user = unique("user");
    let campaign_id = unique("campaign");
    upsert_test_campaign(db.pool(), &campaign_id, "brand-a", &["Gaming", "tech"], "active").await?;

    let clock = ManualClock::new(Utc::now());
    let manager = KeyLeaseManager::with_clock(
        Arc::new(PostgresKeyRepository::new(db.pool().clone())),
        Arc::new(PostgresCampaignLookup::new(db.pool().clone())),
        Arc::new(default_catalog()),
        Arc::new(clock.clone()),
    );

    let key = manager.consume_for_campaign(&user, &campaign_id).await?;
    assert_eq!(key.category, "gaming");

    let released = manager.release(&user, &campaign_id, None).await?;
    assert_eq!(released.last_brand_cooloff_hours, Some(360));

    let summary = manager.summarize(&user).await?;
    assert_eq!(summary.cooloff, 1);
    assert_eq!(summary.total_keys, default_catalog().len());
    Ok(())
}

#[tokio::test]
async fn test_campaign_lookup_reads_read_model() -> Result<(), Error> {
    let Some(db) = setup_test_database().await? else { return Ok(()) };
    let lookup = PostgresCampaignLookup::new(db.pool().clone());
    let campaign_id = unique("campaign");
    let category = unique("cat");
    upsert_test_campaign(db.pool(), &campaign_id, "brand-z", &[&category.to_uppercase()], "active").await?;

    let info = lookup.get_campaign(&campaign_id).await?.unwrap();
    assert_eq!(info.brand_id, "brand-z");
    assert!(lookup.get_campaign("does-not-exist").await?.is_none());

    let active = lookup.list_active_campaigns(&category).await?;
    assert_eq!(active.len(), 1);
    Ok(())
}
