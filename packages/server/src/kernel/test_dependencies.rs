// TestDependencies - in-memory implementations for testing
//
// Provides in-memory stores and a spy OTP sender that can be injected into
// ServerDeps for tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BaseAccountStore, BaseOtpSender, BaseOtpStore, BaseSessionStore, ServerDeps};
use crate::config::{OtpConfig, SessionConfig};
use crate::domains::auth::models::{Account, NewSession, Session};
use crate::domains::auth::SessionManager;

// =============================================================================
// In-memory Session Store
// =============================================================================

/// In-memory session table.
///
/// Rows keep insertion order so ties on `created_at` list deterministically.
/// `set_failing` and `set_delay` simulate an unavailable or slow store.
pub struct MemorySessionStore {
    sessions: Arc<RwLock<Vec<Session>>>,
    failing: AtomicBool,
    delay_ms: AtomicU64,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(Vec::new())),
            failing: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
        }
    }

    /// Make every subsequent call fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every subsequent call
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Insert a row with an arbitrary expiry, bypassing the session manager
    pub async fn insert_with_expiry(&self, account_id: Uuid, expires_at: DateTime<Utc>) -> Session {
        let session = NewSession {
            id: Uuid::new_v4(),
            account_id,
            device_tag: None,
            expires_at,
            created_at: Utc::now(),
        }
        .into_session();
        self.sessions.write().await.push(session.clone());
        session
    }

    /// Raw row lookup for assertions
    pub async fn get(&self, id: Uuid) -> Option<Session> {
        self.sessions
            .read()
            .await
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    /// Raw rows owned by an account, in insertion order
    pub async fn for_account(&self, account_id: Uuid) -> Vec<Session> {
        self.sessions
            .read()
            .await
            .iter()
            .filter(|s| s.account_id == account_id)
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn check(&self) -> Result<()> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("session store unavailable"));
        }
        Ok(())
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseSessionStore for MemorySessionStore {
    async fn insert(&self, session: NewSession) -> Result<Session> {
        self.check().await?;
        let session = session.into_session();
        self.sessions.write().await.push(session.clone());
        Ok(session)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Session>> {
        self.check().await?;
        Ok(self.get(id).await)
    }

    async fn find_valid(&self, id: Uuid, now: DateTime<Utc>) -> Result<Option<Session>> {
        self.check().await?;
        Ok(self.get(id).await.filter(|s| s.is_valid_at(now)))
    }

    async fn list_active(&self, account_id: Uuid, now: DateTime<Utc>) -> Result<Vec<Session>> {
        self.check().await?;
        let mut active: Vec<Session> = self
            .sessions
            .read()
            .await
            .iter()
            .filter(|s| s.account_id == account_id && s.is_valid_at(now))
            .cloned()
            .collect();
        active.sort_by_key(|s| s.created_at);
        Ok(active)
    }

    async fn count_for_account(&self, account_id: Uuid) -> Result<u64> {
        self.check().await?;
        let sessions = self.sessions.read().await;
        Ok(sessions.iter().filter(|s| s.account_id == account_id).count() as u64)
    }

    async fn touch(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool> {
        self.check().await?;
        let mut sessions = self.sessions.write().await;
        match sessions.iter_mut().find(|s| s.id == id) {
            Some(session) => {
                session.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<u64> {
        self.check().await?;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_for_account(&self, account_id: Uuid) -> Result<u64> {
        self.check().await?;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|s| s.account_id != account_id);
        Ok((before - sessions.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        self.check().await?;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|s| s.is_valid_at(now));
        Ok((before - sessions.len()) as u64)
    }

    async fn ping(&self) -> Result<()> {
        self.check().await
    }
}

// =============================================================================
// In-memory Account Store
// =============================================================================

pub struct MemoryAccountStore {
    accounts: RwLock<Vec<Account>>,
    delay_ms: AtomicU64,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(Vec::new()),
            delay_ms: AtomicU64::new(0),
        }
    }

    /// Seed an account directly
    pub async fn create(&self, phone_number: &str) -> Account {
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            name: None,
            email: None,
            phone_number: phone_number.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.accounts.write().await.push(account.clone());
        account
    }

    /// Delay every subsequent trait call
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    async fn pause(&self) {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for MemoryAccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseAccountStore for MemoryAccountStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        self.pause().await;
        let accounts = self.accounts.read().await;
        Ok(accounts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<Account>> {
        self.pause().await;
        let accounts = self.accounts.read().await;
        Ok(accounts
            .iter()
            .find(|a| a.phone_number == phone_number)
            .cloned())
    }

    async fn insert(&self, phone_number: &str) -> Result<Option<Account>> {
        if self.find_by_phone(phone_number).await?.is_some() {
            return Ok(None);
        }
        Ok(Some(self.create(phone_number).await))
    }
}

// =============================================================================
// In-memory OTP Store
// =============================================================================

/// Keyed cache with per-key expiry, checked on read
pub struct MemoryOtpStore {
    codes: Mutex<HashMap<String, (String, Instant)>>,
    failing: AtomicBool,
    delay_ms: AtomicU64,
}

impl MemoryOtpStore {
    pub fn new() -> Self {
        Self {
            codes: Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every subsequent call
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Stage a code directly
    pub fn put(&self, key: &str, code: &str, ttl: Duration) {
        self.codes
            .lock()
            .unwrap()
            .insert(key.to_string(), (code.to_string(), Instant::now() + ttl));
    }

    /// Currently staged, unexpired code for a key
    pub fn staged(&self, key: &str) -> Option<String> {
        let codes = self.codes.lock().unwrap();
        codes
            .get(key)
            .filter(|(_, expires)| Instant::now() < *expires)
            .map(|(code, _)| code.clone())
    }

    async fn check(&self) -> Result<()> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("otp store unavailable"));
        }
        Ok(())
    }
}

impl Default for MemoryOtpStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseOtpStore for MemoryOtpStore {
    async fn stage(&self, key: &str, code: &str, ttl: Duration) -> Result<()> {
        self.check().await?;
        self.put(key, code, ttl);
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<String>> {
        self.check().await?;
        Ok(self.staged(key))
    }

    async fn discard(&self, key: &str) -> Result<()> {
        self.check().await?;
        self.codes.lock().unwrap().remove(key);
        Ok(())
    }
}

// =============================================================================
// Spy OTP Sender
// =============================================================================

/// Records every delivered code instead of sending it
pub struct SpyOtpSender {
    sent: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
}

impl SpyOtpSender {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All (phone number, code) pairs delivered so far
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Most recent code delivered to a phone number
    pub fn last_code_for(&self, phone_number: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(phone, _)| phone == phone_number)
            .map(|(_, code)| code.clone())
    }
}

impl Default for SpyOtpSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseOtpSender for SpyOtpSender {
    async fn send_code(&self, phone_number: &str, code: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("sms gateway unavailable"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((phone_number.to_string(), code.to_string()));
        Ok(())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Bundle of in-memory collaborators.
///
/// Keeps a handle on each so tests can seed and inspect state after building
/// `ServerDeps`.
pub struct TestDependencies {
    pub sessions: Arc<MemorySessionStore>,
    pub accounts: Arc<MemoryAccountStore>,
    pub otp_store: Arc<MemoryOtpStore>,
    pub otp_sender: Arc<SpyOtpSender>,
    pub session_config: SessionConfig,
    pub otp_config: OtpConfig,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(MemorySessionStore::new()),
            accounts: Arc::new(MemoryAccountStore::new()),
            otp_store: Arc::new(MemoryOtpStore::new()),
            otp_sender: Arc::new(SpyOtpSender::new()),
            session_config: SessionConfig::default(),
            otp_config: OtpConfig::default(),
        }
    }

    pub fn with_session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    pub fn with_otp_config(mut self, config: OtpConfig) -> Self {
        self.otp_config = config;
        self
    }

    /// Build ServerDeps backed by these collaborators
    pub fn server_deps(&self) -> ServerDeps {
        ServerDeps::new(
            self.accounts.clone(),
            self.otp_store.clone(),
            self.otp_sender.clone(),
            SessionManager::new(self.sessions.clone(), self.session_config.clone()),
            self.otp_config.clone(),
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
