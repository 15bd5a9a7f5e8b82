//! Fakes for exercising controllers without a network or disk.
//!
//! Compiled for this crate's tests and, with the `testing` feature, for
//! downstream integration tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use portal_storage::{MemoryBackend, StorageBackend, StorageError};
use serde_json::Value;
use tokio::sync::Notify;

use crate::api::{ApiEnvelope, ClientList, LoginResponse, PortalApi, StatsPayload};
use crate::error::ApiError;

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// A login call as the API saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCall {
    pub booking_id: String,
    pub token: Option<String>,
}

type Reply<T> = Mutex<Option<Result<T, ApiError>>>;

/// A [`PortalApi`] answering from a script.
///
/// Login replies are consumed in order; once exhausted every login is
/// refused with "no scripted reply". Admin replies are sticky and default
/// to a successful empty envelope.
#[derive(Debug, Default)]
pub struct ScriptedApi {
    login_calls: Mutex<Vec<LoginCall>>,
    login_replies: Mutex<VecDeque<Result<LoginResponse, ApiError>>>,
    hold_logins: AtomicBool,
    gate: Notify,
    logout_calls: AtomicUsize,
    logout_reply: Reply<ApiEnvelope<Value>>,
    clients_reply: Reply<ApiEnvelope<ClientList>>,
    stats_reply: Reply<ApiEnvelope<StatsPayload>>,
    health_reply: Reply<ApiEnvelope<Value>>,
}

impl ScriptedApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer to the next unanswered login.
    #[must_use]
    pub fn with_login(self, reply: Result<LoginResponse, ApiError>) -> Self {
        lock(&self.login_replies).push_back(reply);
        self
    }

    #[must_use]
    pub fn with_logout(self, reply: Result<ApiEnvelope<Value>, ApiError>) -> Self {
        *lock(&self.logout_reply) = Some(reply);
        self
    }

    #[must_use]
    pub fn with_clients(self, reply: Result<ApiEnvelope<ClientList>, ApiError>) -> Self {
        *lock(&self.clients_reply) = Some(reply);
        self
    }

    #[must_use]
    pub fn with_stats(self, reply: Result<ApiEnvelope<StatsPayload>, ApiError>) -> Self {
        *lock(&self.stats_reply) = Some(reply);
        self
    }

    #[must_use]
    pub fn with_health(self, reply: Result<ApiEnvelope<Value>, ApiError>) -> Self {
        *lock(&self.health_reply) = Some(reply);
        self
    }

    /// Park every login after it is recorded until [`release_login`](Self::release_login).
    #[must_use]
    pub fn holding_logins(self) -> Self {
        self.hold_logins.store(true, Ordering::SeqCst);
        self
    }

    /// Let one parked login answer.
    pub fn release_login(&self) {
        self.gate.notify_one();
    }

    /// Every login received, oldest first.
    pub fn login_calls(&self) -> Vec<LoginCall> {
        lock(&self.login_calls).clone()
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

fn sticky<T: Clone>(reply: &Reply<ApiEnvelope<T>>) -> Result<ApiEnvelope<T>, ApiError> {
    lock(reply).clone().unwrap_or(Ok(ApiEnvelope {
        success: true,
        data: None,
        error: None,
    }))
}

#[async_trait::async_trait]
impl PortalApi for ScriptedApi {
    async fn login(
        &self,
        booking_id: &str,
        token: Option<&str>,
    ) -> Result<LoginResponse, ApiError> {
        lock(&self.login_calls).push(LoginCall {
            booking_id: booking_id.to_owned(),
            token: token.map(str::to_owned),
        });
        if self.hold_logins.load(Ordering::SeqCst) {
            self.gate.notified().await;
        }
        lock(&self.login_replies)
            .pop_front()
            .unwrap_or_else(|| Ok(LoginResponse::refused(Some("no scripted reply"))))
    }

    async fn admin_logout(&self) -> Result<ApiEnvelope<Value>, ApiError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        sticky(&self.logout_reply)
    }

    async fn get_all_clients(&self) -> Result<ApiEnvelope<ClientList>, ApiError> {
        sticky(&self.clients_reply)
    }

    async fn get_dashboard_stats(&self) -> Result<ApiEnvelope<StatsPayload>, ApiError> {
        sticky(&self.stats_reply)
    }

    async fn get_system_health(&self) -> Result<ApiEnvelope<Value>, ApiError> {
        sticky(&self.health_reply)
    }
}

/// A store whose every operation fails, like a browser with storage disabled.
#[derive(Debug, Default)]
pub struct FailingStorage;

impl FailingStorage {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl StorageBackend for FailingStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Read {
            key: key.to_owned(),
            reason: "storage disabled".to_owned(),
        })
    }

    async fn put(&self, key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Write {
            key: key.to_owned(),
            reason: "quota exceeded".to_owned(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        Err(StorageError::Delete {
            key: key.to_owned(),
            reason: "storage disabled".to_owned(),
        })
    }
}

/// A [`MemoryBackend`] that counts writes.
#[derive(Debug, Default)]
pub struct CountingStorage {
    inner: MemoryBackend,
    puts: AtomicUsize,
}

impl CountingStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl StorageBackend for CountingStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.inner.delete(key).await
    }
}
