//! The hosted backend: authentication, the role relation and remote order
//! inserts.

mod memory;
mod supabase;

pub use memory::InMemoryBackend;
pub use supabase::SupabaseBackend;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use crate::domain::{LineItem, OrderStatus, ProfileUpdate, SessionUser, UserMetadata};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Authentication failed: {0}")]
    Unauthorized(String),
    #[error("Backend rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Row sent to the remote `orders` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteOrderRecord {
    pub user_id: String,
    pub email: Option<String>,
    pub items: Vec<LineItem>,
    pub total: f64,
    pub status: OrderStatus,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// What the backend hands back after an insert. Either field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InsertedOrder {
    #[serde(default, deserialize_with = "id_as_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Table ids may be numeric or textual.
fn id_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// RFC 3339, or a zone-less timestamp taken as UTC. Anything else is dropped.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(serde_json::Value::String(raw)) = Option::<serde_json::Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(stamp) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(stamp.with_timezone(&Utc)));
    }
    Ok(raw.replacen(' ', "T", 1).parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc()))
}

#[async_trait]
pub trait RemoteOrderStore: Send + Sync + 'static {
    async fn insert_order(&self, record: &RemoteOrderRecord) -> Result<InsertedOrder, BackendError>;
}

/// Authentication and role lookup.
#[async_trait]
pub trait AuthBackend: Send + Sync + 'static {
    /// The user of the current session, if any.
    async fn get_session(&self) -> Result<Option<SessionUser>, BackendError>;
    async fn sign_up(&self, email: &str, password: &str, metadata: &UserMetadata) -> Result<Option<SessionUser>, BackendError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<Option<SessionUser>, BackendError>;
    async fn sign_out(&self) -> Result<(), BackendError>;
    async fn update_user(&self, update: &ProfileUpdate) -> Result<Option<SessionUser>, BackendError>;
    /// Whether the role relation lists `user_id` as an admin.
    async fn is_admin(&self, user_id: &str) -> Result<bool, BackendError>;
}
