//! Integration tests for the Postgres and Redis backed stores.
//!
//! These need Docker and are ignored by default:
//! `cargo test --test store_integration_tests -- --ignored`

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::TestHarness;
use outlet_core::config::SessionConfig;
use outlet_core::domains::auth::models::{Account, PgAccountStore, PgSessionStore};
use outlet_core::domains::auth::{RedisOtpStore, SessionManager};
use outlet_core::kernel::{BaseAccountStore, BaseOtpStore};
use uuid::Uuid;

/// Phone numbers must be unique across the shared database
fn unique_phone() -> String {
    let suffix = Uuid::new_v4().as_u128() % 10_000_000_000;
    format!("+1{:010}", suffix)
}

async fn seed_account(harness: &TestHarness) -> Account {
    PgAccountStore::new(harness.db_pool.clone())
        .insert(&unique_phone())
        .await
        .unwrap()
        .unwrap()
}

fn manager(harness: &TestHarness) -> SessionManager {
    SessionManager::new(
        Arc::new(PgSessionStore::new(harness.db_pool.clone())),
        SessionConfig::default(),
    )
}

async fn insert_expired(harness: &TestHarness, account_id: Uuid) {
    sqlx::query(
        "INSERT INTO sessions (id, account_id, expires_at) VALUES ($1, $2, NOW() - INTERVAL '1 hour')",
    )
    .bind(Uuid::new_v4())
    .bind(account_id)
    .execute(&harness.db_pool)
    .await
    .unwrap();
}

#[tokio::test]
#[ignore = "requires docker"]
async fn account_insert_detects_duplicate_phone() {
    let harness = TestHarness::new().await.unwrap();
    let store = PgAccountStore::new(harness.db_pool.clone());
    let phone = unique_phone();

    let created = store.insert(&phone).await.unwrap().unwrap();
    assert_eq!(created.phone_number, phone);
    assert!(store.insert(&phone).await.unwrap().is_none());

    let found = store.find_by_phone(&phone).await.unwrap().unwrap();
    assert_eq!(found.id, created.id);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn session_lookup_respects_expiry() {
    let harness = TestHarness::new().await.unwrap();
    let sessions = manager(&harness);
    let account = seed_account(&harness).await;

    let session = sessions.create(account.id, Some("cli".to_string())).await.unwrap();
    assert!(sessions.find_valid(session.id).await.unwrap().is_some());

    sqlx::query("UPDATE sessions SET expires_at = NOW() - INTERVAL '1 second' WHERE id = $1")
        .bind(session.id)
        .execute(&harness.db_pool)
        .await
        .unwrap();

    assert!(sessions.find_valid(session.id).await.unwrap().is_none());
    assert!(sessions.find_by_id(session.id).await.unwrap().is_some());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn sweep_removes_only_expired_rows() {
    let harness = TestHarness::new().await.unwrap();
    let sessions = manager(&harness);
    let account = seed_account(&harness).await;

    for _ in 0..3 {
        insert_expired(&harness, account.id).await;
    }
    for _ in 0..2 {
        sessions.create(account.id, None).await.unwrap();
    }
    assert_eq!(sessions.count_for_account(account.id).await.unwrap(), 5);

    // Other tests share the database, so only this account's rows are checked
    sessions.sweep_expired().await;
    assert_eq!(sessions.count_for_account(account.id).await.unwrap(), 2);
    assert_eq!(
        sessions
            .list_active_for_account(account.id)
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
#[ignore = "requires docker"]
async fn touch_and_revoke_all() {
    let harness = TestHarness::new().await.unwrap();
    let sessions = manager(&harness);
    let account = seed_account(&harness).await;

    let session = sessions.create(account.id, None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(sessions.touch(session.id).await.unwrap());

    let refreshed = sessions.find_by_id(session.id).await.unwrap().unwrap();
    assert!(refreshed.updated_at > refreshed.created_at);

    sessions.create(account.id, None).await.unwrap();
    assert_eq!(sessions.destroy_all_for_account(account.id).await.unwrap(), 2);
    assert!(!sessions.touch(session.id).await.unwrap());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn deleting_account_cascades_to_sessions() {
    let harness = TestHarness::new().await.unwrap();
    let sessions = manager(&harness);
    let account = seed_account(&harness).await;
    let session = sessions.create(account.id, None).await.unwrap();

    sqlx::query("DELETE FROM accounts WHERE id = $1")
        .bind(account.id)
        .execute(&harness.db_pool)
        .await
        .unwrap();

    assert!(sessions.find_by_id(session.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn health_ping_reaches_postgres() {
    let harness = TestHarness::new().await.unwrap();
    manager(&harness).ping().await.unwrap();
}

#[tokio::test]
#[ignore = "requires docker"]
async fn redis_otp_store_stages_and_discards() {
    let harness = TestHarness::new().await.unwrap();
    let store = RedisOtpStore::connect(&harness.redis_url).await.unwrap();
    let key = format!("login:{}", unique_phone());

    assert!(store.fetch(&key).await.unwrap().is_none());

    store.stage(&key, "482913", Duration::from_secs(60)).await.unwrap();
    assert_eq!(store.fetch(&key).await.unwrap().as_deref(), Some("482913"));

    // Restaging replaces the code
    store.stage(&key, "111222", Duration::from_secs(60)).await.unwrap();
    assert_eq!(store.fetch(&key).await.unwrap().as_deref(), Some("111222"));

    store.discard(&key).await.unwrap();
    assert!(store.fetch(&key).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn redis_otp_code_expires() {
    let harness = TestHarness::new().await.unwrap();
    let store = RedisOtpStore::connect(&harness.redis_url).await.unwrap();
    let key = format!("register:{}", unique_phone());

    store.stage(&key, "482913", Duration::from_secs(1)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(2100)).await;

    assert!(store.fetch(&key).await.unwrap().is_none());
}
