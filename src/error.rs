//! Error types for BorNet.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Staging store error: {0}")]
    Staging(#[from] StagingError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Device-local staging store errors.
#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("Failed to open staging store: {0}")]
    Open(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Session and sign-up errors from the auth service.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Auth service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response from auth service: {0}")]
    InvalidResponse(String),

    #[error("Sign-up succeeded but no user was returned")]
    MissingUser,
}

/// Errors from the hosted collections and file storage.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("{table} rejected the request ({status}): {message}")]
    Rejected {
        table: String,
        status: u16,
        message: String,
    },

    #[error("Invalid response from {table}: {reason}")]
    InvalidResponse { table: String, reason: String },

    #[error("{entity} not found with id {id}")]
    NotFound { entity: String, id: String },
}

/// A single failing form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field path, e.g. `education[0].institution`.
    pub field: String,
    pub message: String,
}

/// Every field that failed validation, in form order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", summarize(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Look up the message recorded for a field path.
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Registration flow errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("Invalid form: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error("Sign-up failed: {0}")]
    SignUp(#[from] AuthError),

    #[error("Profile update failed: {0}")]
    Profile(#[from] BackendError),

    #[error("Could not stage pending profile data: {0}")]
    Staging(#[from] StagingError),
}

/// Profile management errors.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Invalid entry: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error("Session check failed: {0}")]
    Session(#[from] AuthError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
