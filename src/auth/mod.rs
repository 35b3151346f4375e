//! Session checks and sign-up against the hosted auth service.

pub mod gotrue;

pub use gotrue::GoTrueClient;

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::BackendConfig;
use crate::error::AuthError;

/// Shared handle to the current user access token.
///
/// The auth client refreshes it after sign-up; the REST clients read it for
/// every request.
#[derive(Debug, Clone, Default)]
pub struct AccessToken {
    inner: Arc<RwLock<Option<SecretString>>>,
}

impl AccessToken {
    pub fn new(token: Option<SecretString>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(token)),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.access_token.clone())
    }

    /// Current token, exposed for an outgoing request.
    pub async fn get(&self) -> Option<String> {
        self.inner
            .read()
            .await
            .as_ref()
            .map(|t| t.expose_secret().to_string())
    }

    pub async fn set(&self, token: Option<String>) {
        *self.inner.write().await = token.map(SecretString::from);
    }

    pub async fn is_set(&self) -> bool {
        self.inner.read().await.is_some()
    }
}

/// The user attached to the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Answers whether someone is signed in on this device.
#[async_trait]
pub trait SessionOracle: Send + Sync {
    /// The signed-in user, or `None` when there is no live session.
    async fn current_user(&self) -> Result<Option<SessionUser>, AuthError>;
}

/// Credentials and metadata for a new account.
#[derive(Debug, Clone)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub legal_name: String,
    /// Where the confirmation email should send the user back to.
    pub redirect_to: Option<String>,
}

/// The account created by a sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUpUser {
    pub id: String,
    pub email: Option<String>,
}

/// Creates accounts.
#[async_trait]
pub trait AuthClient: Send + Sync {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignedUpUser, AuthError>;
}
