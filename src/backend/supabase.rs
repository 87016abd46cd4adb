use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::{AuthBackend, BackendError, InsertedOrder, RemoteOrderRecord, RemoteOrderStore};
use crate::domain::{ProfileUpdate, SessionUser, UserMetadata};

/// Session returned by the token and signup endpoints.
#[derive(Debug, Deserialize)]
struct AuthSession {
    access_token: Option<String>,
    user: Option<SessionUser>,
}

/// HTTP client for a Supabase project: GoTrue auth endpoints plus the
/// PostgREST `orders` and `user_roles` tables.
pub struct SupabaseBackend {
    client: Client,
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
}

impl SupabaseBackend {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            access_token: RwLock::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Adds the project key and the session token (or the anon key when
    /// signed out).
    async fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let token = self.access_token.read().await.clone();
        let bearer = token.unwrap_or_else(|| self.anon_key.clone());
        request
            .header("apikey", &self.anon_key)
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {}", bearer))
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await?;
            return match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(BackendError::Unauthorized(message)),
                _ => Err(BackendError::Rejected { status: status.as_u16(), message }),
            };
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }

    /// Stores the token of a returned session and yields its user.
    async fn accept_session(&self, body: serde_json::Value) -> Result<Option<SessionUser>, BackendError> {
        if body.get("access_token").is_some() {
            let session: AuthSession =
                serde_json::from_value(body).map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
            *self.access_token.write().await = session.access_token;
            return Ok(session.user);
        }
        // Signup without auto-confirm returns the bare user.
        if body.get("id").is_some() {
            let user = serde_json::from_value(body).map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
            return Ok(Some(user));
        }
        Ok(None)
    }
}

#[async_trait]
impl AuthBackend for SupabaseBackend {
    #[instrument(skip(self))]
    async fn get_session(&self) -> Result<Option<SessionUser>, BackendError> {
        if self.access_token.read().await.is_none() {
            debug!("No stored session");
            return Ok(None);
        }
        let request = self.authorize(self.client.get(self.url("auth/v1/user"))).await;
        let user = Self::handle_response(request.send().await?).await?;
        Ok(Some(user))
    }

    #[instrument(skip(self, password, metadata))]
    async fn sign_up(&self, email: &str, password: &str, metadata: &UserMetadata) -> Result<Option<SessionUser>, BackendError> {
        let body = json!({ "email": email, "password": password, "data": metadata });
        let request = self.authorize(self.client.post(self.url("auth/v1/signup")).json(&body)).await;
        let response: serde_json::Value = Self::handle_response(request.send().await?).await?;
        self.accept_session(response).await
    }

    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> Result<Option<SessionUser>, BackendError> {
        let body = json!({ "email": email, "password": password });
        let request = self
            .client
            .post(self.url("auth/v1/token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&body);
        let response: serde_json::Value = Self::handle_response(request.send().await?).await?;
        self.accept_session(response).await
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), BackendError> {
        let request = self.authorize(self.client.post(self.url("auth/v1/logout"))).await;
        let response = request.send().await?;
        *self.access_token.write().await = None;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = response.text().await?;
            Err(BackendError::Rejected { status: status.as_u16(), message })
        }
    }

    #[instrument(skip(self))]
    async fn update_user(&self, update: &ProfileUpdate) -> Result<Option<SessionUser>, BackendError> {
        let body = json!({ "data": update });
        let request = self.authorize(self.client.put(self.url("auth/v1/user")).json(&body)).await;
        let user = Self::handle_response(request.send().await?).await?;
        Ok(Some(user))
    }

    #[instrument(skip(self))]
    async fn is_admin(&self, user_id: &str) -> Result<bool, BackendError> {
        let user_filter = format!("eq.{}", user_id);
        let request = self
            .client
            .get(self.url("rest/v1/user_roles"))
            .query(&[("select", "role"), ("user_id", user_filter.as_str()), ("role", "eq.admin")]);
        let request = self.authorize(request).await;
        let rows: Vec<serde_json::Value> = Self::handle_response(request.send().await?).await?;
        Ok(!rows.is_empty())
    }
}

#[async_trait]
impl RemoteOrderStore for SupabaseBackend {
    #[instrument(skip(self, record), fields(user_id = %record.user_id))]
    async fn insert_order(&self, record: &RemoteOrderRecord) -> Result<InsertedOrder, BackendError> {
        let request = self
            .client
            .post(self.url("rest/v1/orders"))
            .header("Prefer", "return=representation")
            .json(&[record]);
        let request = self.authorize(request).await;
        let rows: Vec<InsertedOrder> = Self::handle_response(request.send().await?).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::InvalidResponse("Insert returned no rows".to_string()))
    }
}
