use thiserror::Error;

/// Failure kinds surfaced by the application layer.
///
/// Every variant maps to one HTTP status and one stable error code; the
/// `Display` text is what clients see, except for [`DomainError::Internal`]
/// whose detail is only logged.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("Email address is already registered")]
    EmailTaken,

    #[error("Profile not found for user {uid}")]
    ProfileNotFound { uid: String },

    #[error("No updatable fields provided")]
    NoFieldsProvided,

    #[error("Server configuration error: {0}")]
    ServerConfiguration(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Stable machine-readable code used in the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "VALIDATION_ERROR",
            DomainError::InvalidCredentials => "INVALID_CREDENTIALS",
            DomainError::Forbidden(_) => "FORBIDDEN",
            DomainError::UserNotFound => "USER_NOT_FOUND",
            DomainError::UsernameTaken(_) => "USERNAME_TAKEN",
            DomainError::EmailTaken => "EMAIL_TAKEN",
            DomainError::ProfileNotFound { .. } => "PROFILE_NOT_FOUND",
            DomainError::NoFieldsProvided => "NO_FIELDS_PROVIDED",
            DomainError::ServerConfiguration(_) => "SERVER_CONFIGURATION_ERROR",
            DomainError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            DomainError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Errors reported by the identity and document provider adapters.
///
/// Provider-specific codes (`EMAIL_EXISTS`, `ALREADY_EXISTS`, ...) are
/// translated into these variants at the adapter boundary so nothing above
/// the infrastructure layer has to know the wire vocabulary.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("email already exists")]
    EmailExists,

    #[error("user not found")]
    UserNotFound,

    #[error("invalid password")]
    InvalidPassword,

    #[error("invalid email address")]
    InvalidEmail,

    #[error("weak password: {0}")]
    WeakPassword(String),

    #[error("user disabled")]
    UserDisabled,

    #[error("invalid or expired ID token")]
    InvalidIdToken,

    #[error("too many attempts")]
    TooManyAttempts,

    #[error("document already exists")]
    AlreadyExists,

    #[error("document not found")]
    DocumentNotFound,

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("unexpected response ({status}): {code}")]
    Unexpected { status: u16, code: String },

    #[error("malformed provider payload: {0}")]
    Decode(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
pub type ProviderResult<T> = Result<T, ProviderError>;

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

impl From<ProviderError> for DomainError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::EmailExists => DomainError::EmailTaken,
            ProviderError::UserNotFound => DomainError::UserNotFound,
            ProviderError::InvalidPassword
            | ProviderError::UserDisabled
            | ProviderError::InvalidIdToken => DomainError::InvalidCredentials,
            ProviderError::InvalidEmail => DomainError::Validation("Invalid email address".into()),
            ProviderError::WeakPassword(_) => {
                DomainError::Validation("Password must be at least 6 characters".into())
            }
            ProviderError::TooManyAttempts => {
                DomainError::ServiceUnavailable("Too many attempts, try again later".into())
            }
            ProviderError::NotConfigured(msg) => DomainError::ServerConfiguration(msg),
            ProviderError::Transport(detail) | ProviderError::Unavailable(detail) => {
                tracing::warn!(detail = %detail, "Provider unreachable");
                DomainError::ServiceUnavailable("Provider is unreachable, try again later".into())
            }
            other => DomainError::Internal(other.to_string()),
        }
    }
}
