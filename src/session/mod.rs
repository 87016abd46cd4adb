//! The signed-in user: authentication, profile, order history and cart.

pub mod error;

pub use error::*;

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::backend::{AuthBackend, BackendError};
use crate::clients::OrderClient;
use crate::domain::{
    Credentials, LineItem, Order, OrderDraft, OrderOwner, ProfileUpdate, Registration, Role, SessionUser, UserMetadata,
    UserProfile,
};
use crate::repository::{CartStore, Persisted};

/// Notifications pushed by the auth service.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthChange {
    SignedIn(SessionUser),
    UserUpdated(SessionUser),
    SignedOut,
}

/// Tracks the current user and everything tied to them.
///
/// # Notes
/// The profile is rebuilt from the auth session every time it changes. The
/// role relation decides admin status; a failed lookup counts as "not an
/// admin".
pub struct SessionManager {
    auth: Arc<dyn AuthBackend>,
    orders: OrderClient,
    cart: CartStore,
    user: Option<UserProfile>,
    order_history: Vec<Order>,
}

impl SessionManager {
    pub fn new(auth: Arc<dyn AuthBackend>, orders: OrderClient, cart: CartStore) -> Self {
        Self {
            auth,
            orders,
            cart,
            user: None,
            order_history: Vec::new(),
        }
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|user| user.role == Role::Admin)
    }

    pub fn is_customer(&self) -> bool {
        self.user.as_ref().is_some_and(|user| user.role == Role::Customer)
    }

    /// Orders placed by the current user, newest first.
    pub fn order_history(&self) -> &[Order] {
        &self.order_history
    }

    /// Restores an existing session, if the auth service still has one.
    #[instrument(skip(self))]
    pub async fn init(&mut self) -> Result<Option<&UserProfile>, SessionError> {
        match self.auth.get_session().await? {
            Some(user) => {
                self.adopt(&user).await?;
                info!(user_id = %user.id, "Session restored");
            }
            None => debug!("No session to restore"),
        }
        Ok(self.user.as_ref())
    }

    /// Applies an auth-state notification.
    #[instrument(skip(self, change))]
    pub async fn handle_auth_change(&mut self, change: AuthChange) -> Result<(), SessionError> {
        match change {
            AuthChange::SignedIn(user) | AuthChange::UserUpdated(user) => self.adopt(&user).await,
            AuthChange::SignedOut => {
                self.forget();
                Ok(())
            }
        }
    }

    /// Creates an account. Returns `None` when the auth service wants the
    /// email confirmed before a session is issued.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&mut self, registration: Registration) -> Result<Option<&UserProfile>, SessionError> {
        let metadata = UserMetadata {
            name: Some(registration.name),
            role: Some(Role::Customer),
            phone: Some(registration.phone),
            address: Some(registration.address),
        };
        let created = self
            .auth
            .sign_up(&registration.email, &registration.password, &metadata)
            .await?;
        match created {
            Some(user) => {
                self.adopt(&user).await?;
                info!(user_id = %user.id, "Account registered");
                Ok(self.user.as_ref())
            }
            None => {
                info!("Account registered, awaiting confirmation");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&mut self, credentials: Credentials) -> Result<&UserProfile, SessionError> {
        let user = self
            .auth
            .sign_in(&credentials.email, &credentials.password)
            .await?
            .ok_or(SessionError::LoginFailed)?;
        self.adopt(&user).await?;
        info!(user_id = %user.id, "Logged in");
        self.user.as_ref().ok_or(SessionError::LoginFailed)
    }

    /// Signs out and drops the profile, history and cart. Local state is
    /// cleared even when the auth service reports an error.
    #[instrument(skip(self))]
    pub async fn logout(&mut self) -> Result<(), SessionError> {
        let signed_out = self.auth.sign_out().await;
        self.forget();
        self.cart.clear().await?;
        signed_out?;
        info!("Logged out");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn update_profile(&mut self, update: ProfileUpdate) -> Result<&UserProfile, SessionError> {
        if self.user.is_none() {
            return Err(SessionError::NotLoggedIn);
        }
        match self.auth.update_user(&update).await? {
            Some(user) => self.adopt_profile(&user).await,
            None => {
                if let Some(profile) = self.user.as_mut() {
                    if let Some(name) = update.name {
                        profile.name = name;
                    }
                    if let Some(phone) = update.phone {
                        profile.phone = phone;
                    }
                    if let Some(address) = update.address {
                        profile.address = address;
                    }
                }
            }
        }
        self.user.as_ref().ok_or(SessionError::NotLoggedIn)
    }

    /// Checks `password` against the current account by signing in again.
    #[instrument(skip(self, password))]
    pub async fn verify_current_password(&self, password: &str) -> Result<bool, SessionError> {
        let email = self.user.as_ref().map(|u| u.email.clone()).ok_or(SessionError::NotLoggedIn)?;
        match self.auth.sign_in(&email, password).await {
            Ok(session) => Ok(session.is_some()),
            Err(BackendError::Unauthorized(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Places an order for the current user and adds it to their history.
    #[instrument(skip(self, draft), fields(items = draft.items.len()))]
    pub async fn add_order(&mut self, draft: OrderDraft) -> Result<Persisted<Order>, SessionError> {
        let user = self.user.as_ref().ok_or(SessionError::NotLoggedIn)?;
        let owner = OrderOwner::new(user.id.clone(), Some(user.email.clone()));
        let placed = self.orders.create_order(owner, draft).await?;
        if !placed.is_remote() {
            warn!(order_id = %placed.get().id, "Order saved on this device only");
        }
        self.order_history.insert(0, placed.get().clone());
        Ok(placed)
    }

    /// Reloads the history from the order service.
    pub async fn refresh_history(&mut self) -> Result<&[Order], SessionError> {
        let user_id = self.user.as_ref().map(|u| u.id.clone()).ok_or(SessionError::NotLoggedIn)?;
        self.order_history = self.orders.orders_for_user(user_id).await?;
        Ok(&self.order_history)
    }

    pub async fn save_cart(&self, items: &[LineItem]) -> Result<(), SessionError> {
        Ok(self.cart.save(items).await?)
    }

    pub async fn load_cart(&self) -> Result<Vec<LineItem>, SessionError> {
        Ok(self.cart.load().await?)
    }

    async fn adopt(&mut self, user: &SessionUser) -> Result<(), SessionError> {
        self.adopt_profile(user).await;
        self.order_history = self.orders.orders_for_user(user.id.clone()).await?;
        Ok(())
    }

    async fn adopt_profile(&mut self, user: &SessionUser) {
        let is_admin = match self.auth.is_admin(&user.id).await {
            Ok(is_admin) => is_admin,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Role lookup failed, treating as customer");
                false
            }
        };
        self.user = Some(UserProfile::from_session(user, is_admin));
    }

    fn forget(&mut self) {
        self.user = None;
        self.order_history.clear();
    }
}
