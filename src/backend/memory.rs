use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{AuthBackend, BackendError, InsertedOrder, RemoteOrderRecord, RemoteOrderStore};
use crate::domain::{ProfileUpdate, SessionUser, UserMetadata};

struct Account {
    password: String,
    user: SessionUser,
}

#[derive(Default)]
struct State {
    accounts: HashMap<String, Account>,
    admins: HashSet<String>,
    current: Option<String>,
    orders: Vec<(String, RemoteOrderRecord)>,
}

/// A self-contained backend used when no hosted backend is configured, and
/// in tests. Failures can be switched on to exercise fallback paths.
#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
    next_id: AtomicU64,
    fail_inserts: AtomicBool,
    garble_insert_responses: AtomicBool,
    fail_role_lookups: AtomicBool,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub async fn grant_admin(&self, user_id: &str) {
        self.state.lock().await.admins.insert(user_id.to_string());
    }

    pub fn fail_order_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Inserts still land, but the reply cannot be read back.
    pub fn garble_insert_responses(&self, garble: bool) {
        self.garble_insert_responses.store(garble, Ordering::SeqCst);
    }

    pub fn fail_role_lookups(&self, fail: bool) {
        self.fail_role_lookups.store(fail, Ordering::SeqCst);
    }

    /// Orders accepted so far, with their ids.
    pub async fn stored_orders(&self) -> Vec<(String, RemoteOrderRecord)> {
        self.state.lock().await.orders.clone()
    }
}

#[async_trait]
impl RemoteOrderStore for InMemoryBackend {
    async fn insert_order(&self, record: &RemoteOrderRecord) -> Result<InsertedOrder, BackendError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("orders table unreachable".to_string()));
        }
        let id = self.next_id("remote");
        self.state.lock().await.orders.push((id.clone(), record.clone()));
        debug!(order_id = %id, "Remote order inserted");
        if self.garble_insert_responses.load(Ordering::SeqCst) {
            return Err(BackendError::InvalidResponse("expected value at line 1 column 1".to_string()));
        }
        Ok(InsertedOrder {
            id: Some(id),
            created_at: Some(record.created_at),
        })
    }
}

#[async_trait]
impl AuthBackend for InMemoryBackend {
    async fn get_session(&self) -> Result<Option<SessionUser>, BackendError> {
        let state = self.state.lock().await;
        Ok(state
            .current
            .as_ref()
            .and_then(|email| state.accounts.get(email))
            .map(|account| account.user.clone()))
    }

    async fn sign_up(&self, email: &str, password: &str, metadata: &UserMetadata) -> Result<Option<SessionUser>, BackendError> {
        if password.len() < 6 {
            return Err(BackendError::Rejected {
                status: 422,
                message: "Password should be at least 6 characters".to_string(),
            });
        }
        let id = self.next_id("user");
        let mut state = self.state.lock().await;
        if state.accounts.contains_key(email) {
            return Err(BackendError::Rejected {
                status: 422,
                message: "User already registered".to_string(),
            });
        }
        let user = SessionUser {
            id,
            email: email.to_string(),
            user_metadata: metadata.clone(),
        };
        state.accounts.insert(
            email.to_string(),
            Account { password: password.to_string(), user: user.clone() },
        );
        state.current = Some(email.to_string());
        Ok(Some(user))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Option<SessionUser>, BackendError> {
        let mut state = self.state.lock().await;
        let user = match state.accounts.get(email) {
            Some(account) if account.password == password => account.user.clone(),
            _ => return Err(BackendError::Unauthorized("Invalid login credentials".to_string())),
        };
        state.current = Some(email.to_string());
        Ok(Some(user))
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.state.lock().await.current = None;
        Ok(())
    }

    async fn update_user(&self, update: &ProfileUpdate) -> Result<Option<SessionUser>, BackendError> {
        let mut state = self.state.lock().await;
        let Some(email) = state.current.clone() else {
            return Err(BackendError::Unauthorized("No active session".to_string()));
        };
        let Some(account) = state.accounts.get_mut(&email) else {
            return Err(BackendError::Unauthorized("No active session".to_string()));
        };
        let meta = &mut account.user.user_metadata;
        if let Some(name) = &update.name {
            meta.name = Some(name.clone());
        }
        if let Some(phone) = &update.phone {
            meta.phone = Some(phone.clone());
        }
        if let Some(address) = &update.address {
            meta.address = Some(address.clone());
        }
        Ok(Some(account.user.clone()))
    }

    async fn is_admin(&self, user_id: &str) -> Result<bool, BackendError> {
        if self.fail_role_lookups.load(Ordering::SeqCst) {
            return Err(BackendError::Unavailable("user_roles unreachable".to_string()));
        }
        Ok(self.state.lock().await.admins.contains(user_id))
    }
}
