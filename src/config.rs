//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default delay between mount and the pending-data check.
pub const DEFAULT_PENDING_DELAY: Duration = Duration::from_secs(2);

/// Default wait for the backend trigger that creates a profile row after sign-up.
pub const DEFAULT_PROFILE_TRIGGER_DELAY: Duration = Duration::from_secs(1);

/// Default location of the device-local staging database.
pub const DEFAULT_STAGING_DB_PATH: &str = "./data/bornet-staging.db";

/// Connection settings for the hosted backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Public anon key sent as `apikey` on every request.
    pub anon_key: SecretString,
    /// User access token for an established session, if any.
    pub access_token: Option<SecretString>,
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: SecretString::from(anon_key.into()),
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(SecretString::from(token.into()));
        self
    }
}

/// Device-side settings for staging and reconciliation.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Path of the libSQL staging database.
    pub staging_db_path: PathBuf,
    /// Delay between mount and the reconciliation body.
    pub pending_delay: Duration,
    /// Wait after sign-up before the profile row is updated.
    pub profile_trigger_delay: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            staging_db_path: PathBuf::from(DEFAULT_STAGING_DB_PATH),
            pending_delay: DEFAULT_PENDING_DELAY,
            profile_trigger_delay: DEFAULT_PROFILE_TRIGGER_DELAY,
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub sync: SyncConfig,
}

impl AppConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let mut backend = BackendConfig::new(
            required("BORNET_SUPABASE_URL")?,
            required("BORNET_SUPABASE_ANON_KEY")?,
        );
        if let Some(token) = lookup("BORNET_ACCESS_TOKEN").filter(|t| !t.trim().is_empty()) {
            backend = backend.with_access_token(token);
        }

        let defaults = SyncConfig::default();
        let sync = SyncConfig {
            staging_db_path: lookup("BORNET_STAGING_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.staging_db_path),
            pending_delay: millis(&lookup, "BORNET_PENDING_DELAY_MS")?
                .unwrap_or(defaults.pending_delay),
            profile_trigger_delay: millis(&lookup, "BORNET_PROFILE_TRIGGER_DELAY_MS")?
                .unwrap_or(defaults.profile_trigger_delay),
        };

        Ok(Self { backend, sync })
    }
}

fn millis<F>(lookup: &F, key: &str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected milliseconds, got {raw:?}: {e}"),
            }),
    }
}
