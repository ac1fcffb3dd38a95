//! Storage seams for the auth service.
//!
//! The service talks to persistence through these traits only. `MongoStore`
//! (see `mongo.rs`) is the production implementation; `MemoryStore` backs
//! tests and local development without a database.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use service_core::async_trait::async_trait;
use service_core::error::AppError;
use std::sync::{Arc, Mutex};

use crate::models::{LoginHistoryEntry, LoginStatus, OtpPurpose, PendingOtp, User};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn insert(&self, user: &User) -> Result<(), AppError>;
    /// Whole-document replace keyed by `user.id`.
    async fn update(&self, user: &User) -> Result<(), AppError>;
    async fn health_check(&self) -> Result<(), AppError>;
}

#[async_trait]
pub trait LoginHistoryStore: Send + Sync {
    async fn append(&self, entry: LoginHistoryEntry) -> Result<(), AppError>;
    /// Flip the newest `otp_required` entry for the user to `success`.
    /// Returns false when no such entry exists (the caller appends a fresh
    /// success entry instead). Only this one mutation is ever applied to an
    /// existing entry.
    async fn resolve_latest_pending(&self, user_id: &str) -> Result<bool, AppError>;
    async fn list_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<LoginHistoryEntry>, AppError>;
}

#[async_trait]
pub trait PendingOtpStore: Send + Sync {
    /// Store a pending code, atomically replacing any prior code for the
    /// same `(user, purpose)`. At most one record per key can exist.
    async fn replace(&self, otp: PendingOtp) -> Result<(), AppError>;
    async fn find(&self, user_id: &str, purpose: OtpPurpose)
        -> Result<Option<PendingOtp>, AppError>;
    async fn mark_consumed(
        &self,
        user_id: &str,
        purpose: OtpPurpose,
        at: DateTime<Utc>,
    ) -> Result<(), AppError>;
}

/// In-memory store. DashMap gives per-key exclusive access, which is all the
/// linearization the single-active-code invariant needs.
#[derive(Clone, Default)]
pub struct MemoryStore {
    users: Arc<DashMap<String, User>>,
    history: Arc<Mutex<Vec<LoginHistoryEntry>>>,
    pending: Arc<DashMap<(String, OtpPurpose), PendingOtp>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test helper: snapshot of all history entries in append order.
    pub fn history_entries(&self) -> Vec<LoginHistoryEntry> {
        self.history.lock().expect("history lock poisoned").clone()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .map(|u| u.clone()))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .map(|u| u.clone()))
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|u| u.phone.as_deref() == Some(phone))
            .map(|u| u.clone()))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn insert(&self, user: &User) -> Result<(), AppError> {
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), AppError> {
        self.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[async_trait]
impl LoginHistoryStore for MemoryStore {
    async fn append(&self, entry: LoginHistoryEntry) -> Result<(), AppError> {
        self.history.lock().expect("history lock poisoned").push(entry);
        Ok(())
    }

    async fn resolve_latest_pending(&self, user_id: &str) -> Result<bool, AppError> {
        let mut history = self.history.lock().expect("history lock poisoned");
        match history
            .iter_mut()
            .rev()
            .find(|e| e.user_id == user_id && e.login_status == LoginStatus::OtpRequired)
        {
            Some(entry) => {
                entry.login_status = LoginStatus::Success;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<LoginHistoryEntry>, AppError> {
        let history = self.history.lock().expect("history lock poisoned");
        let mut entries: Vec<LoginHistoryEntry> = history
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.login_time.cmp(&a.login_time));
        entries.truncate(limit.max(0) as usize);
        Ok(entries)
    }
}

#[async_trait]
impl PendingOtpStore for MemoryStore {
    async fn replace(&self, otp: PendingOtp) -> Result<(), AppError> {
        self.pending
            .insert((otp.user_id.clone(), otp.purpose), otp);
        Ok(())
    }

    async fn find(
        &self,
        user_id: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<PendingOtp>, AppError> {
        Ok(self
            .pending
            .get(&(user_id.to_string(), purpose))
            .map(|p| p.clone()))
    }

    async fn mark_consumed(
        &self,
        user_id: &str,
        purpose: OtpPurpose,
        at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if let Some(mut pending) = self.pending.get_mut(&(user_id.to_string(), purpose)) {
            pending.consumed_at = Some(at);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replace_keeps_one_record_per_purpose() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let first = PendingOtp::new("u1".into(), OtpPurpose::Login, "111111".into(), now);
        let second = PendingOtp::new("u1".into(), OtpPurpose::Login, "222222".into(), now);
        store.replace(first).await.unwrap();
        store.replace(second).await.unwrap();

        let found = store.find("u1", OtpPurpose::Login).await.unwrap().unwrap();
        assert_eq!(found.code, "222222");
    }

    #[tokio::test]
    async fn test_purposes_do_not_clobber_each_other() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .replace(PendingOtp::new("u1".into(), OtpPurpose::Login, "111111".into(), now))
            .await
            .unwrap();
        store
            .replace(PendingOtp::new(
                "u1".into(),
                OtpPurpose::PasswordReset,
                "222222".into(),
                now,
            ))
            .await
            .unwrap();

        let login = store.find("u1", OtpPurpose::Login).await.unwrap().unwrap();
        assert_eq!(login.code, "111111");
        let reset = store
            .find("u1", OtpPurpose::PasswordReset)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reset.code, "222222");
    }
}
