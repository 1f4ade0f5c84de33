//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use crate::error::AuthError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Hierarchical document store contract.
///
/// Collections are slash paths (`pages`, `pages/{owner}/modes`); documents
/// are JSON objects keyed by id within their collection.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads one document by key.
    async fn get(&self, collection: &str, id: &str) -> anyhow::Result<Option<Value>>;

    /// Documents of `collection` whose top-level `field` equals `value`.
    async fn find_by_field(&self, collection: &str, field: &str, value: &Value) -> anyhow::Result<Vec<(String, Value)>>;

    /// Creates or replaces a document.
    async fn set(&self, collection: &str, id: &str, doc: Value) -> anyhow::Result<()>;

    /// Removes a document. Deleting a missing document is not an error.
    async fn delete(&self, collection: &str, id: &str) -> anyhow::Result<()>;

    /// Every document of `collection`.
    async fn list(&self, collection: &str) -> anyhow::Result<Vec<(String, Value)>>;
}

/// The signed-in account as the rest of the system sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub display_name: String,
    pub email: String,
}

/// A bearer token bound to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: AuthUser,
}

/// Called with the new user (or `None` on sign-out) after every auth change.
pub type AuthListener = Arc<dyn Fn(Option<&AuthUser>) + Send + Sync>;

/// Identity contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_account(&self, username: &str, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    async fn sign_out(&self, token: &str) -> Result<(), AuthError>;

    /// The account behind `token`, if the session is live.
    async fn current_user(&self, token: &str) -> Option<AuthUser>;

    fn on_auth_state_changed(&self, listener: AuthListener);

    /// Issues a reset token for `email`. Unknown emails succeed silently.
    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;

    async fn confirm_password_reset(&self, reset_token: &str, new_password: &str) -> Result<(), AuthError>;

    async fn update_email(&self, token: &str, email: &str) -> Result<(), AuthError>;

    async fn update_password(&self, token: &str, password: &str) -> Result<(), AuthError>;
}
