// File: gkey-core/tests/cooloff_tests.rs

mod test_utils;

use chrono::Duration;
use gkey_core::models::KeyStatus;
use gkey_core::Error;
use test_utils::*;

#[tokio::test]
async fn expiry_makes_key_available_and_second_sweep_is_noop() -> Result<(), Error> {
    let fx = fixture();
    fx.add_campaign("campaign123", BRAND_A, &["gaming"]).await;
    fx.manager.ensure_catalog_for_user("user-1").await?;
    fx.manager.consume("user-1", "campaign123", &["gaming"], BRAND_A).await?;
    fx.manager.release("user-1", "campaign123", None).await?;

    // Not yet due.
    fx.clock.advance(Duration::hours(359));
    assert_eq!(fx.manager.expire_due_cooloffs().await?, 0);
    assert_eq!(fx.manager.get_key("user-1", "gaming").await?.status, KeyStatus::Cooloff);

    // Deadline reached exactly.
    fx.clock.advance(Duration::hours(1));
    assert_eq!(fx.manager.expire_due_cooloffs().await?, 1);
    let key = fx.manager.get_key("user-1", "gaming").await?;
    assert_eq!(key.status, KeyStatus::Available);
    assert!(key.cooloff_ends_at.is_none());
    assert_eq!(key.last_brand_id.as_deref(), Some(BRAND_A));

    assert_eq!(fx.manager.expire_due_cooloffs().await?, 0);
    fx.assert_all_consistent().await;
    Ok(())
}

#[tokio::test]
async fn sweep_only_touches_due_cooloffs() -> Result<(), Error> {
    let fx = fixture();
    fx.add_campaign("short", BRAND_A, &["food"]).await;
    fx.add_campaign("long", BRAND_B, &["tech"]).await;
    fx.add_campaign("active", BRAND_C, &["music"]).await;
    for user in ["u1", "u2"] {
        fx.manager.ensure_catalog_for_user(user).await?;
    }

    fx.manager.consume("u1", "short", &["food"], BRAND_A).await?;
    fx.manager.release("u1", "short", Some(2)).await?;
    fx.manager.consume("u2", "long", &["tech"], BRAND_B).await?;
    fx.manager.release("u2", "long", Some(48)).await?;
    fx.manager.consume("u2", "active", &["music"], BRAND_C).await?;

    fx.clock.advance(Duration::hours(3));
    assert_eq!(fx.manager.expire_due_cooloffs().await?, 1);
    assert_eq!(fx.manager.get_key("u1", "food").await?.status, KeyStatus::Available);
    assert_eq!(fx.manager.get_key("u2", "tech").await?.status, KeyStatus::Cooloff);
    assert_eq!(fx.manager.get_key("u2", "music").await?.status, KeyStatus::Locked);
    Ok(())
}

#[tokio::test]
async fn same_brand_shorter_cooloff_cannot_shorten_existing_one() -> Result<(), Error> {
    let fx = fixture();
    fx.add_campaign("long", BRAND_B, &["lifestyle"]).await;
    fx.add_campaign("short", BRAND_B, &["lifestyle"]).await;
    fx.manager.ensure_catalog_for_user("user-1").await?;

    fx.manager.consume("user-1", "long", &["lifestyle"], BRAND_B).await?;
    fx.manager.release("user-1", "long", Some(200)).await?;

    fx.clock.advance(Duration::hours(10));
    fx.manager.consume("user-1", "short", &["lifestyle"], BRAND_B).await?;
    fx.clock.advance(Duration::hours(1));
    let key = fx.manager.release("user-1", "short", Some(12)).await?;

    let second_release = start_time() + Duration::hours(11);
    assert_eq!(key.cooloff_ends_at, Some(second_release + Duration::hours(200)));
    assert_eq!(key.last_brand_cooloff_hours, Some(200));
    Ok(())
}

#[tokio::test]
async fn same_brand_longer_cooloff_raises_the_bar() -> Result<(), Error> {
    let fx = fixture();
    fx.add_campaign("c1", BRAND_B, &["lifestyle"]).await;
    fx.add_campaign("c2", BRAND_B, &["lifestyle"]).await;
    fx.manager.ensure_catalog_for_user("user-1").await?;

    fx.manager.consume("user-1", "c1", &["lifestyle"], BRAND_B).await?;
    fx.manager.release("user-1", "c1", Some(24)).await?;
    fx.manager.consume("user-1", "c2", &["lifestyle"], BRAND_B).await?;
    let key = fx.manager.release("user-1", "c2", Some(96)).await?;

    assert_eq!(key.cooloff_ends_at, Some(start_time() + Duration::hours(96)));
    assert_eq!(key.last_brand_cooloff_hours, Some(96));
    Ok(())
}

#[tokio::test]
async fn summary_reports_counts_and_formatted_remaining_time() -> Result<(), Error> {
    let fx = fixture();
    fx.add_campaign("c1", BRAND_A, &["gaming"]).await;
    fx.add_campaign("c2", BRAND_B, &["tech"]).await;
    fx.manager.ensure_catalog_for_user("user-1").await?;

    fx.manager.consume("user-1", "c1", &["gaming"], BRAND_A).await?;
    fx.manager.release("user-1", "c1", Some(3)).await?;
    fx.manager.consume("user-1", "c2", &["tech"], BRAND_B).await?;
    fx.clock.advance(Duration::minutes(30));

    let summary = fx.manager.summarize("user-1").await?;
    let total = summary.keys.len();
    assert_eq!(summary.total_keys, total);
    assert_eq!(summary.cooloff, 1);
    assert_eq!(summary.locked, 1);
    assert_eq!(summary.available, total - 2);
    assert_eq!(summary.total_completions, 1);

    let gaming = summary.entry("gaming").unwrap();
    assert_eq!(gaming.time_remaining, Some(Duration::minutes(150).num_milliseconds()));
    assert_eq!(gaming.cooloff_time_formatted.as_deref(), Some("2h 30m"));
    assert_eq!(gaming.completions, 1);
    assert_eq!(gaming.display_name.as_deref(), Some("Gaming"));

    let tech = summary.entry("tech").unwrap();
    assert_eq!(tech.status, KeyStatus::Locked);
    assert!(tech.time_remaining.is_none());
    assert!(tech.cooloff_time_formatted.is_none());
    Ok(())
}

#[tokio::test]
async fn summary_sweeps_stale_cooloffs_first() -> Result<(), Error> {
    let fx = fixture();
    fx.add_campaign("c1", BRAND_A, &["esports"]).await;
    fx.manager.ensure_catalog_for_user("user-1").await?;
    fx.manager.consume("user-1", "c1", &["esports"], BRAND_A).await?;
    fx.manager.release("user-1", "c1", Some(1)).await?;

    fx.clock.advance(Duration::minutes(61));
    let summary = fx.manager.summarize("user-1").await?;
    assert_eq!(summary.cooloff, 0);
    assert_eq!(summary.entry("esports").unwrap().status, KeyStatus::Available);
    Ok(())
}

#[tokio::test]
async fn summary_serializes_with_dashboard_field_names() -> Result<(), Error> {
    let fx = fixture();
    fx.add_campaign("c1", BRAND_A, &["gaming"]).await;
    fx.manager.ensure_catalog_for_user("user-1").await?;
    fx.manager.consume("user-1", "c1", &["gaming"], BRAND_A).await?;
    fx.manager.release("user-1", "c1", None).await?;

    let summary = fx.manager.summarize("user-1").await?;
    let json = serde_json::to_value(&summary)?;
    assert_eq!(json["keys"][0]["category"], "gaming");
    assert_eq!(json["keys"][0]["cooloffTimeFormatted"], "15d");
    assert_eq!(json["keys"][0]["status"], "cooloff");
    assert!(json["totalKeys"].is_number());
    Ok(())
}

#[tokio::test]
async fn list_keys_sweeps_and_backfills() -> Result<(), Error> {
    let fx = fixture();
    let keys = fx.manager.list_keys("fresh-user").await?;
    assert!(!keys.is_empty());
    assert!(keys.iter().all(|k| k.is_consistent()));
    Ok(())
}
